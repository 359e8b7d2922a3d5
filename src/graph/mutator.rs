//! Incremental deletion/undeletion (C9): mark packages for removal (or
//! restore them) while keeping LEAF/PARTLEAF/TOBEBROKEN current by
//! re-classifying only the packages that could have changed — `required[p]`
//! and `required_by[p]`, never the whole graph.
//!
//! `delete`/`undelete` are grounded on `original_source/pkg.c`'s
//! `pkgs_delete`/`pkgs_undelete` (which call `verify_partleaves` directly).
//! `delete_rec`/`undelete_rec`/`trans_reqs` had no retrieved C bodies; they
//! are built from SPEC_FULL §4.9's prose, in the same incremental style.

use crate::graph::classifier;
use crate::pkgs::Pkgs;
use crate::types::status::StatusFlags;
use crate::types::Pid;
use std::collections::HashSet;

/// What: mark `pid` `DELETE`, refusing if already `ALLDEL` or (without
/// `force`) not currently LEAF/PARTLEAF.
pub(crate) fn delete(pkgs: &mut Pkgs, pid: Pid, force: bool) -> bool {
    let status = pkgs.status(pid);
    if status.intersects(StatusFlags::ALLDEL) {
        return false;
    }
    if !force && !status.intersects(StatusFlags::LEAF | StatusFlags::PARTLEAF) {
        return false;
    }

    pkgs.update_status(pid, |mut s| {
        s.insert(StatusFlags::DELETE);
        s.remove(StatusFlags::TOBEBROKEN);
        s
    });
    pkgs.delete_pkgs += 1;
    pkgs.delete_pkgs_kbytes += u64::from(pkgs.package(pid).size_kb);

    let idx = pid.index();
    let required_subsets = pkgs.required.subsets(idx);
    for subset in 0..required_subsets {
        let size = pkgs.required.subset_size(idx, subset);
        for k in 0..size {
            let r = Pid(pkgs.required.get(idx, subset, k));
            pkgs.update_status(r, |mut s| {
                s.remove(StatusFlags::LEAF | StatusFlags::PARTLEAF);
                s
            });
            let recomputed = classifier::leaf_status(pkgs, r);
            pkgs.update_status(r, |s| s | recomputed);
        }
    }

    let new_status = pkgs.status(pid);
    if new_status.intersects(StatusFlags::PARTLEAF) || !new_status.intersects(StatusFlags::LEAF) {
        let required_by_subsets = pkgs.required_by.subsets(idx);
        for subset in 0..required_by_subsets {
            let size = pkgs.required_by.subset_size(idx, subset);
            for k in 0..size {
                let r = Pid(pkgs.required_by.get(idx, subset, k));
                if pkgs.status(r).intersects(StatusFlags::DELETE) {
                    continue;
                }
                if classifier::broken_pkg(pkgs, r) {
                    pkgs.update_status(r, |s| s | StatusFlags::TOBEBROKEN);
                }
                if subset > 0 && new_status.intersects(StatusFlags::PARTLEAF) {
                    classifier::verify_partleaves(pkgs, r, pid, true);
                }
            }
        }
    }

    true
}

/// What: clear `pid`'s `DELETE` bit, refusing if it was never set. `force`
/// allows undeleting into a broken state (`TOBEBROKEN` set) rather than
/// refusing outright.
pub(crate) fn undelete(pkgs: &mut Pkgs, pid: Pid, force: bool) -> bool {
    if !pkgs.status(pid).intersects(StatusFlags::DELETE) {
        return false;
    }

    pkgs.update_status(pid, |mut s| {
        s.remove(StatusFlags::DELETE);
        s
    });

    if classifier::broken_pkg(pkgs, pid) {
        if !force {
            pkgs.update_status(pid, |mut s| {
                s.insert(StatusFlags::DELETE);
                s
            });
            return false;
        }
        pkgs.update_status(pid, |s| s | StatusFlags::TOBEBROKEN);
    }

    pkgs.delete_pkgs -= 1;
    pkgs.delete_pkgs_kbytes -= u64::from(pkgs.package(pid).size_kb);

    let idx = pid.index();
    let required_subsets = pkgs.required.subsets(idx);
    for subset in 0..required_subsets {
        let size = pkgs.required.subset_size(idx, subset);
        for k in 0..size {
            let r = Pid(pkgs.required.get(idx, subset, k));
            pkgs.update_status(r, |mut s| {
                s.remove(StatusFlags::LEAF | StatusFlags::PARTLEAF);
                s
            });
            // Hard-required neighbors are unconditionally non-leaf again
            // now that pid is live; only disjunctive neighbors need a real
            // recompute.
            if subset > 0 {
                let recomputed = classifier::leaf_status(pkgs, r);
                pkgs.update_status(r, |s| s | recomputed);
            }
        }
    }

    let required_by_subsets = pkgs.required_by.subsets(idx);
    for subset in 0..required_by_subsets {
        let size = pkgs.required_by.subset_size(idx, subset);
        for k in 0..size {
            let r = Pid(pkgs.required_by.get(idx, subset, k));
            if pkgs.status(r).intersects(StatusFlags::DELETE) {
                continue;
            }
            if !classifier::broken_pkg(pkgs, r) {
                pkgs.update_status(r, |mut s| {
                    s.remove(StatusFlags::TOBEBROKEN);
                    s
                });
            }
            if subset > 0 {
                classifier::verify_partleaves(pkgs, r, pid, false);
            }
        }
    }

    true
}

/// What: recursively delete `pid` and every requirer that has no way to
/// route around losing it (SPEC_FULL §4.9).
pub(crate) fn delete_rec(pkgs: &mut Pkgs, pid: Pid) -> bool {
    if pkgs.status(pid).intersects(StatusFlags::ALLDEL) {
        return true;
    }

    if pkgs.status(pid).intersects(StatusFlags::INLOOP) {
        delete(pkgs, pid, true);
    }

    let idx = pid.index();
    let subsets = pkgs.required_by.subsets(idx);
    for subset in 0..subsets {
        let size = pkgs.required_by.subset_size(idx, subset);
        for k in 0..size {
            let r = Pid(pkgs.required_by.get(idx, subset, k));
            if pkgs.status(r).intersects(StatusFlags::ALLDEL) {
                continue;
            }
            if subset == 0 || classifier::pkg_req_pkg(pkgs, r, pid) {
                delete_rec(pkgs, r);
            }
        }
    }

    if pkgs.status(pid).intersects(StatusFlags::ALLDEL) {
        return true;
    }
    delete(pkgs, pid, false)
}

/// What: recursively undelete `pid` and every requirement it needs restored
/// (SPEC_FULL §4.9).
///
/// Details: walks only subset 0 (hard requirements) of `required[pid]` —
/// unlike `delete_rec`'s walk of `required_by`, disjunctive requirements
/// are never forced to follow `pid` back in, since `pid` being live again
/// doesn't mean any particular alternative provider is needed.
pub(crate) fn undelete_rec(pkgs: &mut Pkgs, pid: Pid) -> bool {
    if !pkgs.status(pid).intersects(StatusFlags::DELETE) {
        return true;
    }

    if pkgs.status(pid).intersects(StatusFlags::INLOOP) {
        undelete(pkgs, pid, true);
    }

    let idx = pid.index();
    let hard_size = pkgs.required.subset_size(idx, 0);
    for k in 0..hard_size {
        let r = Pid(pkgs.required.get(idx, 0, k));
        if !pkgs.status(r).intersects(StatusFlags::DELETE) {
            continue;
        }
        undelete_rec(pkgs, r);
    }

    if !pkgs.status(pid).intersects(StatusFlags::DELETE) {
        return true;
    }
    undelete(pkgs, pid, false)
}

/// What: flat transitive closure of `pid`'s requirements (`reqby = false`)
/// or requirers (`reqby = true`), excluding `pid` itself.
pub(crate) fn trans_reqs(pkgs: &Pkgs, pid: Pid, reqby: bool) -> Vec<Pid> {
    let mut visited: HashSet<u32> = HashSet::new();
    let mut stack = vec![pid.0];
    let mut out = Vec::new();

    while let Some(cur) = stack.pop() {
        let idx = cur as usize;
        let store = if reqby { &pkgs.required_by } else { &pkgs.required };
        let subsets = store.subsets(idx);
        for subset in 0..subsets {
            let size = store.subset_size(idx, subset);
            for k in 0..size {
                let next = store.get(idx, subset, k);
                if next != pid.0 && visited.insert(next) {
                    out.push(Pid(next));
                    stack.push(next);
                }
            }
        }
    }

    out
}
