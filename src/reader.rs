//! The package-source reader collaborator (SPEC_FULL §6, out of scope for
//! the real implementation — this crate ships only the trait and an
//! in-memory test/demo implementation).
//!
//! Grounded on the teacher crate's `aur::traits::AurApi` (a trait for the
//! real collaborator) paired with `aur::mock::MockAurApi` (a builder-style
//! in-memory stand-in for tests), applied here to the reader contract of
//! SPEC_FULL §6 instead of AUR HTTP calls.

use crate::pkgs::Pkgs;
use crate::types::status::{DepFlags, StatusFlags};
use crate::types::Pid;

/// What: the collaborator that populates a fresh [`Pkgs`] from whatever
/// package database backs it (an RPM database, in the original), and
/// performs the operations a UI drives through it that are themselves out
/// of scope for this crate (inspecting one package, running the actual
/// removal, cleaning a repository's cache).
///
/// Details: a real implementation talks to `rpm`/`librpm`, a terminal
/// pager, and a shell; none of that belongs in a dependency-graph engine,
/// so the three side-effecting methods default to "not supported"
/// (`-1`) and only `load` is required.
pub trait SourceReader {
    /// What: populate `pkgs` following the five-step load protocol of
    /// SPEC_FULL §6: `set` every package, `add_req`/`add_prov`/
    /// `add_fileprov` every declared dependency, then `match_deps()`.
    fn load(&self, pkgs: &mut Pkgs);

    /// What: show detailed information (and installed file list) for one
    /// package, typically piped through a pager. Returns the subprocess
    /// exit code.
    ///
    /// Output: `-1` ("not supported") unless overridden.
    fn pkg_info(&self, _pkgs: &Pkgs, _pid: Pid) -> i32 {
        -1
    }

    /// What: actually remove every `DELETE`-marked package from the
    /// underlying store (SPEC_FULL §6 "Removal command"). Returns the
    /// subprocess exit code.
    ///
    /// Output: `-1` ("not supported") unless overridden.
    fn remove_pkgs(&self, _pkgs: &Pkgs, _options: &str) -> i32 {
        -1
    }

    /// What: clean a repository's package cache.
    ///
    /// Output: `-1` ("not supported") unless overridden.
    fn repo_clean(&self) -> i32 {
        -1
    }
}

/// One package's static fields, as a `MemoryReader` will hand them to
/// [`Pkgs::set`].
#[derive(Clone, Debug)]
struct PackageSpec {
    repo: u32,
    name: String,
    epoch: u32,
    version: String,
    release: String,
    arch: String,
    status: StatusFlags,
    size_kb: u32,
}

/// One requirement or capability declaration queued against a pid.
#[derive(Clone, Debug)]
struct DepSpec {
    pid: u32,
    name: String,
    flags: DepFlags,
    version: String,
}

/// An in-memory [`SourceReader`] for tests and demos: a builder that
/// accumulates package records and their requirements/capabilities/file
/// lists, then replays them through the [`Pkgs`] load API on [`load`].
///
/// [`load`]: SourceReader::load
///
/// Grounded on the teacher crate's `MockAurApi` builder pattern
/// (`with_*` methods consuming and returning `Self`), adapted from
/// "canned HTTP responses" to "canned package records".
#[derive(Clone, Debug, Default)]
pub struct MemoryReader {
    packages: Vec<PackageSpec>,
    requires: Vec<DepSpec>,
    provides: Vec<DepSpec>,
    fileprovides: Vec<(u32, String)>,
}

impl MemoryReader {
    /// What: an empty reader with no packages queued yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: queue one package record. Returns the pid it will load as
    /// (packages are assigned sequential pids in insertion order).
    #[must_use]
    pub fn with_package(
        mut self,
        repo: u32,
        name: &str,
        epoch: u32,
        version: &str,
        release: &str,
        arch: &str,
        status: StatusFlags,
        size_kb: u32,
    ) -> Self {
        self.packages.push(PackageSpec {
            repo,
            name: name.to_string(),
            epoch,
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
            status,
            size_kb,
        });
        self
    }

    /// What: the pid the next queued package will be assigned (useful to
    /// capture before calling [`MemoryReader::with_package`] so later
    /// `with_requirement`/`with_provide` calls can reference it).
    #[must_use]
    pub fn next_pid(&self) -> u32 {
        self.packages.len() as u32
    }

    /// What: queue a requirement for a previously queued pid.
    #[must_use]
    pub fn with_requirement(mut self, pid: u32, name: &str, flags: DepFlags, version: &str) -> Self {
        self.requires.push(DepSpec { pid, name: name.to_string(), flags, version: version.to_string() });
        self
    }

    /// What: queue a declared capability for a previously queued pid.
    #[must_use]
    pub fn with_provide(mut self, pid: u32, name: &str, flags: DepFlags, version: &str) -> Self {
        self.provides.push(DepSpec { pid, name: name.to_string(), flags, version: version.to_string() });
        self
    }

    /// What: queue a file path installed by a previously queued pid,
    /// treated as an implicit capability (SPEC_FULL §3 "file-provides").
    #[must_use]
    pub fn with_fileprovide(mut self, pid: u32, path: &str) -> Self {
        self.fileprovides.push((pid, path.to_string()));
        self
    }
}

impl SourceReader for MemoryReader {
    fn load(&self, pkgs: &mut Pkgs) {
        tracing::info!(packages = self.packages.len(), "memory reader: loading queued packages");
        for (i, spec) in self.packages.iter().enumerate() {
            pkgs.set(
                i as u32,
                spec.repo,
                &spec.name,
                spec.epoch,
                &spec.version,
                &spec.release,
                &spec.arch,
                spec.status,
                spec.size_kb,
            );
        }
        for req in &self.requires {
            pkgs.add_req(Pid(req.pid), &req.name, req.flags, &req.version);
        }
        for prov in &self.provides {
            pkgs.add_prov(Pid(prov.pid), &prov.name, prov.flags, &prov.version);
        }
        for (pid, path) in &self.fileprovides {
            pkgs.add_fileprov(Pid(*pid), path);
        }
        pkgs.match_deps();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reader_replays_into_a_classified_graph() {
        let a = 0;
        let b = 1;
        let reader = MemoryReader::new()
            .with_package(0, "liba", 0, "1", "1", "", StatusFlags::INSTALLED, 100)
            .with_package(0, "libb", 0, "1", "1", "", StatusFlags::INSTALLED, 50)
            .with_requirement(b, "liba", DepFlags::NONE, "")
            .with_provide(a, "liba", DepFlags::NONE, "");

        let mut pkgs = Pkgs::new();
        reader.load(&mut pkgs);

        assert_eq!(pkgs.len(), 2);
        assert!(pkgs.is_leaf(Pid(b)));
        assert!(!pkgs.is_leaf(Pid(a)));
    }

    #[test]
    fn next_pid_tracks_insertion_order() {
        let reader = MemoryReader::new();
        assert_eq!(reader.next_pid(), 0);
        let reader = reader.with_package(0, "a", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        assert_eq!(reader.next_pid(), 1);
    }

    #[test]
    fn default_side_effect_methods_report_not_supported() {
        struct Minimal;
        impl SourceReader for Minimal {
            fn load(&self, _pkgs: &mut Pkgs) {}
        }
        let r = Minimal;
        let pkgs = Pkgs::new();
        assert_eq!(r.pkg_info(&pkgs, Pid(0)), -1);
        assert_eq!(r.remove_pkgs(&pkgs, ""), -1);
        assert_eq!(r.repo_clean(), -1);
    }

    #[test]
    fn fileprovides_are_merged_as_implicit_capabilities() {
        let reader = MemoryReader::new()
            .with_package(0, "bash", 0, "5", "1", "", StatusFlags::INSTALLED, 1000)
            .with_package(0, "needs-sh", 0, "1", "1", "", StatusFlags::INSTALLED, 10)
            .with_fileprovide(0, "/bin/sh")
            .with_requirement(1, "/bin/sh", DepFlags::NONE, "");

        let mut pkgs = Pkgs::new();
        reader.load(&mut pkgs);

        assert!(!pkgs.is_broken(Pid(1)));
        assert!(pkgs.is_leaf(Pid(1)));
        assert!(!pkgs.is_leaf(Pid(0)));
    }
}
