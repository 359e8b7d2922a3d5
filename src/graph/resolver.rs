//! Dependency resolution (C7): turns `requires`/`provides`/`fileprovides`
//! into `required`/`required_by` and triggers classification.
//!
//! Grounded on `original_source/pkg.c`'s `fill_required`, `fill_required_by`,
//! and `pkgs_match_deps` — the orchestrating driver behind the reader
//! contract's step 5 (`Pkgs::match_deps`).

use crate::graph::classifier;
use crate::pkgs::Pkgs;
use crate::store::deps::DepTable;
use crate::store::hash_index;
use crate::types::status::StatusFlags;
use crate::types::{DepId, Pid};

/// What: run the full load-time resolution pipeline (SPEC_FULL §6 step 5).
pub(crate) fn resolve(pkgs: &mut Pkgs) {
    let n = pkgs.len();
    pkgs.requires.set_len(n);
    pkgs.provides.set_len(n);

    let fileprovides = pkgs.fileprovides.clone();
    pkgs.provides.merge(&fileprovides);
    pkgs.provides.hash();

    for i in 0..n {
        fill_required(pkgs, Pid::from(i));
    }

    pkgs.required.set_len(n);
    // The dependency table's working set is no longer needed once every
    // requirement has been resolved to its providers.
    pkgs.deps = DepTable::new();
    pkgs.required.hash();

    for i in 0..n {
        fill_required_by(pkgs, Pid::from(i));
    }
    pkgs.required_by.set_len(n);
    pkgs.required.unhash();

    for i in 0..n {
        let pid = Pid::from(i);
        let leaf = classifier::leaf_status(pkgs, pid);
        pkgs.update_status(pid, |s| s | leaf);
    }

    classifier::compute_sccs(pkgs);
}

/// What: enumerate every package providing a dependency matching `dep`.
///
/// Output: `None` if `pid` itself provides a match (self-satisfied — the
/// requirement is dropped without ever setting `BROKEN`); otherwise the
/// deduplicated provider list, possibly empty.
fn find_providers(pkgs: &Pkgs, pid: Pid, dep: DepId) -> Option<Vec<u32>> {
    let mut found = Vec::new();
    let mut dep_iter = 0u32;
    loop {
        let candidate = pkgs.deps.find(&pkgs.strings, dep, &mut dep_iter);
        if candidate.is_none() {
            break;
        }
        let mut prov_iter = 0u32;
        loop {
            let prov = pkgs.provides.find(candidate.0, &mut prov_iter);
            if prov == hash_index::none() {
                break;
            }
            if prov == pid.0 {
                return None;
            }
            if !found.contains(&prov) {
                found.push(prov);
            }
        }
    }
    Some(found)
}

/// What: resolve `pid`'s requirements into `required[pid]` (SPEC_FULL §4.7):
/// subset 0 for hard (single-provider) requirements, subset ≥ 1 for
/// deduplicated, non-dominated disjunctions. Self-satisfied requirements are
/// dropped; requirements with zero providers set `BROKEN`.
fn fill_required(pkgs: &mut Pkgs, pid: Pid) {
    let idx = pid.index();
    let n_reqs = pkgs.requires.size(idx);
    if n_reqs == 0 {
        return;
    }

    let mut provider_sets = Vec::with_capacity(n_reqs);
    for i in 0..n_reqs {
        let dep = DepId(pkgs.requires.get(idx, 0, i));
        provider_sets.push(find_providers(pkgs, pid, dep));
    }

    for providers in &provider_sets {
        match providers {
            None => {}
            Some(p) if p.is_empty() => pkgs.update_status(pid, |s| s | StatusFlags::BROKEN),
            Some(p) if p.len() == 1 => {
                pkgs.required.add(idx, 0, p[0]);
            }
            Some(_) => {}
        }
    }

    let mut next_subset = 1usize;
    'disjunctions: for providers in &provider_sets {
        let Some(p) = providers else { continue };
        if p.len() <= 1 {
            continue;
        }

        // Dominance: already satisfied unconditionally by a hard requirement.
        if p.iter().any(|&prov| pkgs.required.subset_has(idx, 0, prov)) {
            continue;
        }

        let mut sorted = p.clone();
        sorted.sort_unstable();
        for existing in 1..next_subset {
            if subset_matches(pkgs, idx, existing, &sorted) {
                continue 'disjunctions;
            }
        }

        for prov in sorted {
            pkgs.required.add(idx, next_subset, prov);
        }
        next_subset += 1;
    }
}

/// What: does `required[set]`'s `subset`-th bucket already hold exactly
/// `sorted` (used to dedup disjunctions before insertion, since a sorted
/// set has no removal operation once written).
fn subset_matches(pkgs: &Pkgs, set: usize, subset: usize, sorted: &[u32]) -> bool {
    pkgs.required.subset_size(set, subset) == sorted.len()
        && (0..sorted.len()).all(|k| pkgs.required.get(set, subset, k) == sorted[k])
}

/// What: invert `required` into `required_by[pid]` (SPEC_FULL §4.7/§4.8
/// invariant 2): every requirer gets classified into subset 0 if it hard-
/// requires `pid`, subset 1 otherwise.
///
/// Requires [`crate::store::sets::SetStore::hash`] to have already been
/// called on `required`.
fn fill_required_by(pkgs: &mut Pkgs, pid: Pid) {
    let mut iter = 0u32;
    loop {
        let found = pkgs.required.find(pid.0, &mut iter);
        if found == hash_index::none() {
            break;
        }
        let requirer = found as usize;
        let subset = usize::from(!pkgs.required.subset_has(requirer, 0, pid.0));
        pkgs.required_by.add(pid.index(), subset, found);
    }
}
