//! The `Pkgs` facade (SPEC_FULL §3 `struct pkgs`): owns every store and
//! exposes the load API, the query API, and the incremental mutation API a
//! UI collaborator drives.
//!
//! Grounded on `original_source/pkg.c`'s `struct pkgs` / `pkgs_*` functions
//! for shape, and on the teacher crate's `ArchClient` (`src/client.rs`) for
//! the "one facade struct owning sub-components, logging at each public
//! entry point" pattern.

use crate::command;
use crate::error::{PkgsError, Result};
use crate::graph::{classifier, mutator, resolver};
use crate::store::deps::DepTable;
use crate::store::hash_index;
use crate::store::sets::SetStore;
use crate::store::strings::StringPool;
use crate::store::varint_array::VarIntArray;
use crate::types::package::{Package, RECORD_WIDTH};
use crate::types::status::{DepFlags, StatusFlags};
use crate::types::{Pid, StrId};

/// The package database and dependency graph engine.
///
/// Owns the interned string pool, the dependency table, every per-package
/// sorted set (`requires`, `provides`, `fileprovides`, `required`,
/// `required_by`, `sccs`), and the package table itself. Single-threaded
/// (SPEC_FULL §5): no internal synchronization, not `Send`/`Sync` by
/// design.
#[derive(Clone, Debug)]
pub struct Pkgs {
    pub(crate) strings: StringPool,
    pub(crate) packages: VarIntArray,
    pub(crate) deps: DepTable,
    pub(crate) requires: SetStore,
    pub(crate) provides: SetStore,
    pub(crate) fileprovides: SetStore,
    pub(crate) required: SetStore,
    pub(crate) required_by: SetStore,
    pub(crate) sccs: SetStore,
    pub(crate) delete_pkgs: u32,
    pub(crate) pkgs_kbytes: u64,
    pub(crate) delete_pkgs_kbytes: u64,
}

impl Default for Pkgs {
    fn default() -> Self {
        Self::new()
    }
}

impl Pkgs {
    /// What: an empty package database, ready for a [`crate::reader::SourceReader`]
    /// to populate via `set`/`add_req`/`add_prov`/`add_fileprov`/`match_deps`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strings: StringPool::new(),
            packages: VarIntArray::with_fixed_width(RECORD_WIDTH),
            deps: DepTable::new(),
            requires: SetStore::new(),
            provides: SetStore::new(),
            fileprovides: SetStore::new(),
            required: SetStore::new(),
            required_by: SetStore::new(),
            sccs: SetStore::new(),
            delete_pkgs: 0,
            pkgs_kbytes: 0,
            delete_pkgs_kbytes: 0,
        }
    }

    /// What: number of packages loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// What: is the package table empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn pkg(&self, pid: Pid) -> Package {
        Package::from_record(self.packages.record(pid.index()))
    }

    pub(crate) fn status(&self, pid: Pid) -> StatusFlags {
        self.pkg(pid).status
    }

    pub(crate) fn update_status(&mut self, pid: Pid, f: impl FnOnce(StatusFlags) -> StatusFlags) {
        let mut pkg = self.pkg(pid);
        pkg.status = f(pkg.status);
        self.packages.record_mut(pid.index()).copy_from_slice(&pkg.to_record());
    }

    /// What: read-only snapshot of one package's fields.
    #[must_use]
    pub fn package(&self, pid: Pid) -> Package {
        self.pkg(pid)
    }

    /// What: dereference an interned string id.
    ///
    /// Panics if `id` was never produced by this `Pkgs`'s string pool.
    #[must_use]
    pub fn string(&self, id: StrId) -> &str {
        self.strings.get(id)
    }

    /// What: load one package's record (SPEC_FULL §6 reader step 1).
    ///
    /// Details: `epoch` is accepted for interface parity with the original
    /// reader contract but is not retained on [`Package`] (see that type's
    /// doc comment) — it is only meaningful when later supplied to
    /// `add_req`/`add_prov`'s `_evr` forms.
    pub fn set(
        &mut self,
        pid: u32,
        repo: u32,
        name: &str,
        epoch: u32,
        version: &str,
        release: &str,
        arch: &str,
        status: StatusFlags,
        size_kb: u32,
    ) -> Pid {
        let _ = epoch;
        let pkg = Package {
            name: self.strings.add(name),
            version: self.strings.add(version),
            release: self.strings.add(release),
            arch: self.strings.add(arch),
            repo,
            size_kb,
            status,
        };
        self.packages.record_mut(pid as usize).copy_from_slice(&pkg.to_record());
        self.pkgs_kbytes += u64::from(size_kb);
        tracing::debug!(pid, name, repo, "loaded package");
        Pid(pid)
    }

    /// What: record that `pid` requires `name` under the given version
    /// constraint (SPEC_FULL §6 reader step 2).
    pub fn add_req(&mut self, pid: Pid, name: &str, flags: DepFlags, version: &str) {
        let d = self.deps.add(&mut self.strings, name, flags, version);
        self.requires.add(pid.index(), 0, d.0);
    }

    /// What: `add_req` with an already-split epoch/version/release.
    pub fn add_req_evr(&mut self, pid: Pid, name: &str, flags: DepFlags, epoch: u32, version: &str, release: &str) {
        let d = self.deps.add_evr(&mut self.strings, name, flags, epoch, version, release);
        self.requires.add(pid.index(), 0, d.0);
    }

    /// What: record that `pid` provides `name` (SPEC_FULL §6 reader step 3).
    ///
    /// Details: a capability whose name no requirement has ever interned is
    /// "needless" and silently dropped, per §6.
    pub fn add_prov(&mut self, pid: Pid, name: &str, flags: DepFlags, version: &str) {
        if self.strings.get_id(name).is_none() {
            return;
        }
        let d = self.deps.add(&mut self.strings, name, flags, version);
        self.provides.add(pid.index(), 0, d.0);
    }

    /// What: `add_prov` with an already-split epoch/version/release.
    pub fn add_prov_evr(&mut self, pid: Pid, name: &str, flags: DepFlags, epoch: u32, version: &str, release: &str) {
        if self.strings.get_id(name).is_none() {
            return;
        }
        let d = self.deps.add_evr(&mut self.strings, name, flags, epoch, version, release);
        self.provides.add(pid.index(), 0, d.0);
    }

    /// What: record that `pid` installs a file at `path`, an implicit
    /// capability (SPEC_FULL §6 reader step 4, §3 "file-provides").
    pub fn add_fileprov(&mut self, pid: Pid, path: &str) {
        if self.strings.get_id(path).is_none() {
            return;
        }
        let d = self.deps.add(&mut self.strings, path, DepFlags::NONE, "");
        self.fileprovides.add(pid.index(), 0, d.0);
    }

    /// What: resolve every requirement to its providers, build
    /// `required`/`required_by`, classify every package, and find SCCs
    /// (SPEC_FULL §6 reader step 5, §4.7/§4.8).
    ///
    /// This consumes `requires`/`provides`/`fileprovides`/the dependency
    /// table's working set — call exactly once, after all `set`/`add_*`
    /// calls for this load.
    pub fn match_deps(&mut self) {
        tracing::info!(packages = self.len(), "resolving dependency graph");
        resolver::resolve(self);
        let leaves = (0..self.len()).filter(|&i| self.is_leaf(Pid::from(i))).count();
        let broken = (0..self.len()).filter(|&i| self.is_broken(Pid::from(i))).count();
        tracing::info!(leaves, broken, "dependency graph classified");
    }

    /// What: does nothing currently depend on `pid`?
    #[must_use]
    pub fn is_leaf(&self, pid: Pid) -> bool {
        self.status(pid).intersects(StatusFlags::LEAF)
    }

    /// What: do only disjunctive requirers (all with alternatives) depend
    /// on `pid`?
    #[must_use]
    pub fn is_partleaf(&self, pid: Pid) -> bool {
        self.status(pid).intersects(StatusFlags::PARTLEAF)
    }

    /// What: did some hard requirement of `pid` have no provider at load
    /// time?
    #[must_use]
    pub fn is_broken(&self, pid: Pid) -> bool {
        self.status(pid).intersects(StatusFlags::BROKEN)
    }

    /// What: would `pid` become broken if every current `DELETE` mark were
    /// applied?
    #[must_use]
    pub fn is_tobebroken(&self, pid: Pid) -> bool {
        self.status(pid).intersects(StatusFlags::TOBEBROKEN)
    }

    /// What: is `pid` a member of a dependency loop (SCC of size >= 2)?
    #[must_use]
    pub fn is_inloop(&self, pid: Pid) -> bool {
        self.status(pid).intersects(StatusFlags::INLOOP)
    }

    /// What: is `pid` marked `DELETE` or `DELETED`?
    #[must_use]
    pub fn is_alldel(&self, pid: Pid) -> bool {
        self.pkg(pid).is_alldel()
    }

    /// What: the SCC index `pid` belongs to, if any.
    #[must_use]
    pub fn scc_of(&self, pid: Pid) -> Option<u32> {
        let mut iter = 0u32;
        loop {
            let found = self.sccs.find(pid.0, &mut iter);
            if found == hash_index::none() {
                return None;
            }
            if self.sccs.has(found as usize, pid.0) {
                return Some(found);
            }
        }
    }

    /// What: is `pid` a member of SCC `scc`?
    #[must_use]
    pub fn in_scc(&self, scc: u32, pid: Pid) -> bool {
        self.sccs.has(scc as usize, pid.0)
    }

    /// What: mark `pid` for deletion. `force` bypasses the
    /// leaf/partial-leaf gate.
    ///
    /// Output: `false` with no state change if refused (already `ALLDEL`,
    /// or not a leaf/partial-leaf and `!force`).
    pub fn delete(&mut self, pid: Pid, force: bool) -> bool {
        let ok = mutator::delete(self, pid, force);
        tracing::debug!(pid = pid.0, force, ok, "delete");
        ok
    }

    /// What: clear `pid`'s deletion mark. `force` allows undeleting even
    /// when doing so would leave `pid` broken (setting `TOBEBROKEN`
    /// instead of refusing).
    pub fn undelete(&mut self, pid: Pid, force: bool) -> bool {
        let ok = mutator::undelete(self, pid, force);
        tracing::debug!(pid = pid.0, force, ok, "undelete");
        ok
    }

    /// What: recursively delete `pid` and every requirer forced to follow
    /// it (SPEC_FULL §4.9).
    pub fn delete_rec(&mut self, pid: Pid) -> bool {
        mutator::delete_rec(self, pid)
    }

    /// What: recursively undelete `pid` and every requirement it needs
    /// restored (SPEC_FULL §4.9).
    pub fn undelete_rec(&mut self, pid: Pid) -> bool {
        mutator::undelete_rec(self, pid)
    }

    /// What: transitive closure of `pid`'s requirements (`reqby = false`)
    /// or requirers (`reqby = true`), as a flat pid list.
    #[must_use]
    pub fn trans_reqs(&self, pid: Pid, reqby: bool) -> Vec<Pid> {
        mutator::trans_reqs(self, pid, reqby)
    }

    pub(crate) fn pkg_req_pkg(&self, pid: Pid, what: u32) -> bool {
        classifier::pkg_req_pkg(self, pid, what)
    }

    /// What: number of packages currently marked `DELETE`.
    #[must_use]
    pub fn delete_count(&self) -> u32 {
        self.delete_pkgs
    }

    /// What: total installed size of all loaded packages, in kilobytes.
    #[must_use]
    pub fn total_kbytes(&self) -> u64 {
        self.pkgs_kbytes
    }

    /// What: total size of packages currently marked `DELETE`, in
    /// kilobytes.
    #[must_use]
    pub fn delete_kbytes(&self) -> u64 {
        self.delete_pkgs_kbytes
    }

    /// What: count of packages that would become broken if every current
    /// `DELETE` mark were applied. Computed on demand by scanning status
    /// bits rather than maintained incrementally — `original_source/pkg.c`
    /// carries a `break_pkgs` counter field but its increment/decrement
    /// sites were not present in the retrieved excerpt, so this crate
    /// derives the count instead of guessing at undocumented bookkeeping.
    #[must_use]
    pub fn tobebroken_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_tobebroken(Pid::from(i))).count()
    }

    /// What: serialize the set of currently `DELETE`-marked packages (by
    /// canonical name) as JSON (SPEC_FULL §4.10).
    pub fn save_selection<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let deleted: Vec<String> = (0..self.len())
            .map(Pid::from)
            .filter(|&pid| self.status(pid).intersects(StatusFlags::DELETE))
            .map(|pid| command::canonical_name(self, pid))
            .collect();
        serde_json::to_writer_pretty(writer, &Selection { deleted })?;
        Ok(())
    }

    /// What: restore a selection previously written by
    /// [`Pkgs::save_selection`], forcibly deleting every package it still
    /// recognizes by canonical name. Unrecognized names are skipped and
    /// logged (SPEC_FULL §4.10).
    pub fn load_selection<R: std::io::Read>(&mut self, reader: R) -> Result<()> {
        let selection: Selection = serde_json::from_reader(reader)?;
        for cname in selection.deleted {
            match self.find_by_canonical_name(&cname) {
                Some(pid) => {
                    self.delete(pid, true);
                }
                None => tracing::warn!(cname = %cname, "selection references unknown package, skipping"),
            }
        }
        Ok(())
    }

    fn find_by_canonical_name(&self, cname: &str) -> Option<Pid> {
        (0..self.len()).map(Pid::from).find(|&pid| command::canonical_name(self, pid) == cname)
    }
}

/// On-disk shape of a saved selection (SPEC_FULL §4.10).
#[derive(serde::Serialize, serde::Deserialize)]
struct Selection {
    deleted: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_package_chain() -> Pkgs {
        let mut pkgs = Pkgs::new();
        let a = pkgs.set(0, 0, "liba", 0, "1", "1", "", StatusFlags::INSTALLED, 100);
        let b = pkgs.set(1, 0, "libb", 0, "1", "1", "", StatusFlags::INSTALLED, 50);
        pkgs.add_req(b, "liba", DepFlags::NONE, "");
        pkgs.add_prov(a, "liba", DepFlags::NONE, "");
        pkgs.match_deps();
        pkgs
    }

    #[test]
    fn trivial_leaf_scenario() {
        let mut pkgs = two_package_chain();
        let a = Pid(0);
        let b = Pid(1);
        assert!(pkgs.is_leaf(b));
        assert!(!pkgs.is_leaf(a));
        assert!(pkgs.delete(b, false));
        assert!(pkgs.is_leaf(a));
        assert!(pkgs.delete(a, false));
    }

    #[test]
    fn broken_at_load_scenario() {
        let mut pkgs = Pkgs::new();
        let b = pkgs.set(0, 0, "b", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        pkgs.add_req(b, "libx", DepFlags::NONE, "");
        pkgs.match_deps();
        assert!(pkgs.is_broken(b));
        assert!(pkgs.is_leaf(b));
        assert!(pkgs.delete(b, false));
    }

    #[test]
    fn self_satisfied_requirement_does_not_set_broken() {
        let mut pkgs = Pkgs::new();
        let a = pkgs.set(0, 0, "a", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        pkgs.add_req(a, "a", DepFlags::NONE, "");
        pkgs.add_prov(a, "a", DepFlags::NONE, "");
        pkgs.match_deps();
        assert!(!pkgs.is_broken(a));
    }

    #[test]
    fn disjunction_scenario() {
        let mut pkgs = Pkgs::new();
        let c = pkgs.set(0, 0, "c", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        let s1 = pkgs.set(1, 0, "s1", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        let s2 = pkgs.set(2, 0, "s2", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        pkgs.add_req(c, "/bin/sh", DepFlags::NONE, "");
        pkgs.add_prov(s1, "/bin/sh", DepFlags::NONE, "");
        pkgs.add_prov(s2, "/bin/sh", DepFlags::NONE, "");
        pkgs.match_deps();

        assert!(pkgs.is_partleaf(s1));
        assert!(pkgs.is_partleaf(s2));
        assert!(pkgs.delete(s1, false));
        assert!(!pkgs.is_tobebroken(c));
        // S2 is now C's only remaining alternative: per invariant 4 ("no
        // non-ALLDEL package disjunctively requires p in a way it cannot
        // route around") it is neither LEAF nor PARTLEAF anymore, so a
        // non-forced delete is refused.
        assert!(!pkgs.is_leaf(s2) && !pkgs.is_partleaf(s2));
        assert!(!pkgs.delete(s2, false));
        assert!(pkgs.delete(s2, true));
        assert!(pkgs.is_tobebroken(c));
    }

    #[test]
    fn scc_scenario_forces_delete_rec() {
        let mut pkgs = Pkgs::new();
        let x = pkgs.set(0, 0, "x", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        let y = pkgs.set(1, 0, "y", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        let z = pkgs.set(2, 0, "z", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        pkgs.add_req(x, "y", DepFlags::NONE, "");
        pkgs.add_prov(y, "y", DepFlags::NONE, "");
        pkgs.add_req(y, "z", DepFlags::NONE, "");
        pkgs.add_prov(z, "z", DepFlags::NONE, "");
        pkgs.add_req(z, "x", DepFlags::NONE, "");
        pkgs.add_prov(x, "x", DepFlags::NONE, "");
        pkgs.match_deps();

        assert!(pkgs.is_inloop(x));
        assert!(pkgs.is_inloop(y));
        assert!(pkgs.is_inloop(z));
        assert!(!pkgs.is_leaf(x));
        assert!(!pkgs.delete(x, false));
        assert!(pkgs.delete_rec(x));
        assert!(pkgs.is_alldel(x));
        assert!(pkgs.is_alldel(y));
        assert!(pkgs.is_alldel(z));
    }

    #[test]
    fn delete_then_undelete_restores_status() {
        let mut pkgs = two_package_chain();
        let b = Pid(1);
        let before = pkgs.package(b).status;
        assert!(pkgs.delete(b, false));
        assert!(pkgs.undelete(b, true));
        assert_eq!(pkgs.package(b).status.bits(), before.bits());
    }

    #[test]
    fn selection_round_trips_through_json() {
        let mut pkgs = two_package_chain();
        let b = Pid(1);
        pkgs.delete(b, false);

        let mut buf = Vec::new();
        pkgs.save_selection(&mut buf).unwrap();

        let mut reloaded = two_package_chain();
        reloaded.load_selection(buf.as_slice()).unwrap();
        assert!(reloaded.is_alldel(b));
    }

    #[test]
    fn load_selection_skips_unknown_names() {
        let mut pkgs = two_package_chain();
        let json = br#"{"deleted":["ghost-1-1"]}"#;
        pkgs.load_selection(&json[..]).unwrap();
        assert_eq!(pkgs.delete_count(), 0);
    }
}
