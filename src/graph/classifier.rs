//! Package classification (C8): LEAF/PARTLEAF/BROKEN/TOBEBROKEN status bits
//! and strongly-connected-component membership (INLOOP).
//!
//! `leaf_status`, `pkg_req_pkg`, and `broken_pkg` are grounded on
//! `original_source/pkg.c`'s `leaf_pkg`, `pkg_req_pkg`, and `broken_pkg`.
//! `compute_sccs` has no counterpart in the retrieved `pkg.c` excerpt — it is
//! a textbook iterative Tarjan over the `required_by` adjacency, written
//! with an explicit work stack to avoid native recursion depth limits on
//! large graphs.

use crate::pkgs::Pkgs;
use crate::types::status::StatusFlags;
use crate::types::Pid;

/// What: does `requirer` need `target` in a way it cannot route around —
/// either a hard requirement, or the sole remaining non-`DELETE`
/// alternative in one of its disjunctions?
///
/// Details: checks `DELETE` specifically, not `ALLDEL`, matching the
/// original's exact bit test.
pub(crate) fn pkg_req_pkg(pkgs: &Pkgs, requirer: Pid, target: Pid) -> bool {
    let idx = requirer.index();
    if pkgs.required.subset_has(idx, 0, target.0) {
        return true;
    }

    let subsets = pkgs.required.subsets(idx);
    for subset in 1..subsets {
        if !pkgs.required.subset_has(idx, subset, target.0) {
            continue;
        }
        let size = pkgs.required.subset_size(idx, subset);
        let has_alternative = (0..size).any(|k| {
            let alt = pkgs.required.get(idx, subset, k);
            alt != target.0 && !pkgs.status(Pid(alt)).intersects(StatusFlags::DELETE)
        });
        if !has_alternative {
            return true;
        }
    }
    false
}

/// What: would `pid` become broken if every current `DELETE` mark were
/// applied — a hard requirement with no live provider left, or a
/// disjunction with no live alternative left.
pub(crate) fn broken_pkg(pkgs: &Pkgs, pid: Pid) -> bool {
    let idx = pid.index();

    let hard_size = pkgs.required.subset_size(idx, 0);
    for k in 0..hard_size {
        let prov = Pid(pkgs.required.get(idx, 0, k));
        if pkgs.status(prov).intersects(StatusFlags::DELETE) {
            return true;
        }
    }

    let subsets = pkgs.required.subsets(idx);
    for subset in 1..subsets {
        let size = pkgs.required.subset_size(idx, subset);
        if size == 0 {
            continue;
        }
        let has_alive = (0..size).any(|k| {
            let alt = Pid(pkgs.required.get(idx, subset, k));
            !pkgs.status(alt).intersects(StatusFlags::DELETE)
        });
        if !has_alive {
            return true;
        }
    }
    false
}

/// What: compute `pid`'s LEAF/PARTLEAF bits from its current `required_by`
/// set and the live status of its requirers (SPEC_FULL §3 invariants 4/5).
///
/// Output: `LEAF` if no non-`ALLDEL` package requires `pid` at all;
/// `PARTLEAF` if every non-`ALLDEL` requirer is disjunctive and has a live
/// alternative; otherwise empty (some requirer cannot route around `pid`).
pub(crate) fn leaf_status(pkgs: &Pkgs, pid: Pid) -> StatusFlags {
    let idx = pid.index();
    let subsets = pkgs.required_by.subsets(idx);
    let mut has_live_requirer = false;
    let mut all_have_alternative = true;

    for subset in 0..subsets {
        let size = pkgs.required_by.subset_size(idx, subset);
        for k in 0..size {
            let requirer = Pid(pkgs.required_by.get(idx, subset, k));
            if pkgs.status(requirer).intersects(StatusFlags::ALLDEL) {
                continue;
            }
            has_live_requirer = true;
            if subset == 0 {
                return StatusFlags::empty();
            }
            if pkg_req_pkg(pkgs, requirer, pid) {
                all_have_alternative = false;
            }
        }
    }

    if !has_live_requirer {
        StatusFlags::LEAF
    } else if all_have_alternative {
        StatusFlags::PARTLEAF
    } else {
        StatusFlags::empty()
    }
}

/// What: re-derive the PARTLEAF bit of every *other* alternative in
/// `requirer`'s disjunction(s) containing `what`, after `what`'s `DELETE`
/// status changed.
///
/// Details: matches `pkg.c`'s `verify_partleaves(p, pid, what, removed)` —
/// it scans `required[requirer]` for the subset(s) holding `what` and
/// re-verifies every *sibling* provider in that subset, never `requirer`
/// itself (the requirer's own classification doesn't change here; only the
/// alternatives it disjunctively chose between can gain or lose their
/// "someone still covers this requirement" status). The same asymmetry as
/// before applies per sibling: deleting only ever clears a stale PARTLEAF,
/// undeleting only ever sets a fresh one (never "downgrades" a LEAF it
/// might also now qualify for).
pub(crate) fn verify_partleaves(pkgs: &mut Pkgs, requirer: Pid, what: Pid, removed: bool) {
    let idx = requirer.index();
    let subsets = pkgs.required.subsets(idx);
    for subset in 1..subsets {
        if !pkgs.required.subset_has(idx, subset, what.0) {
            continue;
        }
        let size = pkgs.required.subset_size(idx, subset);
        for k in 0..size {
            let alt = Pid(pkgs.required.get(idx, subset, k));
            if alt == what {
                continue;
            }
            verify_one(pkgs, alt, removed);
        }
    }
}

/// What: re-derive one alternative's PARTLEAF bit, given whether the
/// sibling that triggered the re-check was just deleted or undeleted.
fn verify_one(pkgs: &mut Pkgs, alt: Pid, removed: bool) {
    let status = pkgs.status(alt);
    if removed {
        if status.intersects(StatusFlags::PARTLEAF) && leaf_status(pkgs, alt) == StatusFlags::empty() {
            pkgs.update_status(alt, |mut s| {
                s.remove(StatusFlags::PARTLEAF);
                s
            });
        }
    } else if !status.intersects(StatusFlags::LEAF | StatusFlags::PARTLEAF)
        && leaf_status(pkgs, alt) != StatusFlags::empty()
    {
        pkgs.update_status(alt, |s| s | StatusFlags::PARTLEAF);
    }
}

/// One frame of the explicit Tarjan work stack.
struct Frame {
    v: usize,
    neighbors: Vec<usize>,
    pos: usize,
}

/// What: every requirer of `p` (both hard and disjunctive subsets of
/// `required_by[p]`), the adjacency Tarjan walks.
fn neighbors(pkgs: &Pkgs, p: usize) -> Vec<usize> {
    let subsets = pkgs.required_by.subsets(p);
    let mut out = Vec::new();
    for subset in 0..subsets {
        let size = pkgs.required_by.subset_size(p, subset);
        for k in 0..size {
            out.push(pkgs.required_by.get(p, subset, k) as usize);
        }
    }
    out
}

/// What: find every strongly connected component of size ≥ 2 in the
/// `required_by` graph, record each as an outer set of `sccs`, and set
/// `INLOOP` on every member (SPEC_FULL §4.8 invariant 5).
pub(crate) fn compute_sccs(pkgs: &mut Pkgs) {
    let n = pkgs.len();
    let mut index_counter = 0u32;
    let mut indices: Vec<Option<u32>> = vec![None; n];
    let mut lowlink = vec![0u32; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if indices[start].is_some() {
            continue;
        }

        let mut work = vec![Frame { v: start, neighbors: neighbors(pkgs, start), pos: 0 }];
        indices[start] = Some(index_counter);
        lowlink[start] = index_counter;
        index_counter += 1;
        stack.push(start);
        on_stack[start] = true;

        while let Some(frame) = work.last_mut() {
            let v = frame.v;
            if frame.pos < frame.neighbors.len() {
                let w = frame.neighbors[frame.pos];
                frame.pos += 1;
                if indices[w].is_none() {
                    indices[w] = Some(index_counter);
                    lowlink[w] = index_counter;
                    index_counter += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push(Frame { v: w, neighbors: neighbors(pkgs, w), pos: 0 });
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(indices[w].expect("index just checked Some"));
                }
            } else {
                work.pop();
                if let Some(parent) = work.last() {
                    let pv = parent.v;
                    lowlink[pv] = lowlink[pv].min(lowlink[v]);
                }
                if lowlink[v] == indices[v].expect("visited node always has an index") {
                    let mut component = Vec::new();
                    loop {
                        let w = stack.pop().expect("v is still on the stack");
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    if component.len() >= 2 {
                        components.push(component);
                    }
                }
            }
        }
    }

    for component in &components {
        let outer = pkgs.sccs.len();
        for &p in component {
            pkgs.sccs.add(outer, 0, p as u32);
        }
    }
    for component in components {
        for p in component {
            pkgs.update_status(Pid::from(p), |s| s | StatusFlags::INLOOP);
        }
    }
    pkgs.sccs.hash();
}
