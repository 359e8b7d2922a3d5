//! Canonical name formatting, removal command construction, and the
//! search-and-filter expression (SPEC_FULL §6).
//!
//! Canonical naming and the removal command are grounded on
//! `original_source/rpm.c`'s `rpmcname` and `rpm_remove_pkgs`. The filter
//! expression is grounded on `original_source/tui.c`'s `searchexpr_comp` /
//! `searchexpr_match`, translated from its hand-rolled character walk plus
//! POSIX `regcomp`/`regexec` into a small parser plus the `regex` crate.

use crate::error::{PkgsError, Result};
use crate::pkgs::Pkgs;
use crate::types::status::StatusFlags;
use crate::types::Pid;
use regex::Regex;

/// What: `name-version-release.arch` when arch is non-empty, else
/// `name-version-release` (SPEC_FULL §6 "Canonical package name").
#[must_use]
pub fn canonical_name(pkgs: &Pkgs, pid: Pid) -> String {
    let pkg = pkgs.package(pid);
    let name = pkgs.string(pkg.name);
    let version = pkgs.string(pkg.version);
    let release = pkgs.string(pkg.release);
    let arch = pkgs.string(pkg.arch);
    if arch.is_empty() {
        format!("{name}-{version}-{release}")
    } else {
        format!("{name}-{version}-{release}.{arch}")
    }
}

/// What: build the argv-equivalent of the removal command for every
/// `DELETE`-marked package in `repo` (SPEC_FULL §6 "Removal command").
///
/// Details: mirrors `original_source/rpm.c`'s `rpm_remove_pkgs` but returns
/// the argument vector instead of invoking a shell — running it is the
/// reader/remover collaborator's job, out of scope for this crate.
#[must_use]
pub fn remove_command(pkgs: &Pkgs, repo: u32, root: &str, options: &[&str]) -> Vec<String> {
    let mut argv = vec!["rpm".to_string(), "-evh".to_string()];
    argv.extend(options.iter().map(|s| (*s).to_string()));
    argv.push("-r".to_string());
    argv.push(root.to_string());
    for i in 0..pkgs.len() {
        let pid = Pid::from(i);
        let pkg = pkgs.package(pid);
        if pkg.repo != repo || !pkg.status.intersects(StatusFlags::DELETE) {
            continue;
        }
        argv.push(canonical_name(pkgs, pid));
    }
    argv
}

/// A parsed search-and-filter expression (SPEC_FULL §6), consumed by a UI
/// collaborator to narrow the package list down to a regex over canonical
/// names, gated by required/forbidden status bits.
#[derive(Debug)]
pub struct SearchExpr {
    /// At least one of these bits must be set on a matching package (empty
    /// means "no status requirement").
    set: StatusFlags,
    /// None of these bits may be set on a matching package.
    unset: StatusFlags,
    /// Negate the regex match.
    exclude: bool,
    regex: Regex,
}

impl SearchExpr {
    /// What: parse a filter expression: an optional repeated
    /// `[!]~[LlDdBbo]+` status-bit prefix (whitespace-terminated), an
    /// optional leading `!` negating the regex, then an extended POSIX
    /// regex matched against the canonical name.
    ///
    /// Output: `Err(PkgsError::InvalidFilter)` if the trailing regex does
    /// not compile.
    pub fn parse(s: &str) -> Result<Self> {
        let mut set = StatusFlags::empty();
        let mut unset = StatusFlags::empty();
        let mut rest = s;

        loop {
            let (not, after_bang) = match rest.strip_prefix('!') {
                Some(tail) => (true, tail),
                None => (false, rest),
            };
            let Some(mut flags) = after_bang.strip_prefix('~') else {
                break;
            };
            let mut field = StatusFlags::empty();
            let mut consumed_any = false;
            while let Some(c) = flags.chars().next() {
                let bit = match c {
                    'L' => StatusFlags::LEAF,
                    'l' => StatusFlags::PARTLEAF,
                    'D' => StatusFlags::DELETE,
                    'd' => StatusFlags::DELETED,
                    'B' => StatusFlags::BROKEN,
                    'b' => StatusFlags::TOBEBROKEN,
                    'o' => StatusFlags::INLOOP,
                    _ => break,
                };
                field = field | bit;
                consumed_any = true;
                flags = &flags[c.len_utf8()..];
            }
            if !consumed_any {
                break;
            }
            if not {
                unset = unset | field;
            } else {
                set = set | field;
            }
            rest = flags.trim_start_matches(' ');
        }

        let exclude = if let Some(tail) = rest.strip_prefix('!') {
            rest = tail.trim_start_matches(' ');
            true
        } else {
            false
        };

        let regex = Regex::new(rest).map_err(|e| PkgsError::InvalidFilter(e.to_string()))?;

        Ok(Self { set, unset, exclude, regex })
    }

    /// What: does `pid` satisfy this expression's status gate and regex?
    #[must_use]
    pub fn matches(&self, pkgs: &Pkgs, pid: Pid) -> bool {
        let status = pkgs.package(pid).status;
        if self.set.bits() != 0 && !status.intersects(self.set) {
            return false;
        }
        if status.intersects(self.unset) {
            return false;
        }
        let cname = canonical_name(pkgs, pid);
        self.exclude ^ self.regex.is_match(&cname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::status::DepFlags;

    fn sample() -> (Pkgs, Pid) {
        let mut pkgs = Pkgs::new();
        let a = pkgs.set(0, 0, "liba", 0, "1", "1", "x86_64", StatusFlags::INSTALLED, 10);
        let b = pkgs.set(1, 0, "libb", 0, "1", "1", "", StatusFlags::INSTALLED, 10);
        pkgs.add_req(b, "liba", DepFlags::NONE, "");
        pkgs.add_prov(a, "liba", DepFlags::NONE, "");
        pkgs.match_deps();
        (pkgs, a)
    }

    #[test]
    fn canonical_name_includes_arch_when_present() {
        let (pkgs, a) = sample();
        assert_eq!(canonical_name(&pkgs, a), "liba-1-1.x86_64");
        assert_eq!(canonical_name(&pkgs, Pid(1)), "libb-1-1");
    }

    #[test]
    fn remove_command_only_includes_delete_marked_matching_repo() {
        let (mut pkgs, _a) = sample();
        let b = Pid(1);
        pkgs.delete(b, false);
        let argv = remove_command(&pkgs, 0, "/", &["--nodeps"]);
        assert_eq!(argv, vec!["rpm", "-evh", "--nodeps", "-r", "/", "libb-1-1"]);
    }

    #[test]
    fn remove_command_excludes_other_repos() {
        let (mut pkgs, _a) = sample();
        pkgs.delete(Pid(1), false);
        let argv = remove_command(&pkgs, 7, "/", &[]);
        assert_eq!(argv, vec!["rpm", "-evh", "-r", "/"]);
    }

    #[test]
    fn filter_matches_name_regex() {
        let (pkgs, a) = sample();
        let expr = SearchExpr::parse("^liba").unwrap();
        assert!(expr.matches(&pkgs, a));
        assert!(!expr.matches(&pkgs, Pid(1)));
    }

    #[test]
    fn filter_negates_regex_with_leading_bang() {
        let (pkgs, a) = sample();
        let expr = SearchExpr::parse("!^liba").unwrap();
        assert!(!expr.matches(&pkgs, a));
        assert!(expr.matches(&pkgs, Pid(1)));
    }

    #[test]
    fn filter_status_prefix_requires_leaf() {
        let (pkgs, a) = sample();
        let expr = SearchExpr::parse("~L.*").unwrap();
        assert!(!expr.matches(&pkgs, a));
        assert!(expr.matches(&pkgs, Pid(1)));
    }

    #[test]
    fn filter_status_prefix_negated_excludes_leaf() {
        let (pkgs, a) = sample();
        let expr = SearchExpr::parse("!~L.*").unwrap();
        assert!(expr.matches(&pkgs, a));
        assert!(!expr.matches(&pkgs, Pid(1)));
    }

    #[test]
    fn filter_rejects_invalid_regex() {
        assert!(SearchExpr::parse("(unterminated").is_err());
    }
}
