//! Dependency table (C4): interned `(name, flags, epoch, version, release)`
//! tuples with version-range match semantics.
//!
//! Grounded on `original_source/dep.c` (`deps_add`, `deps_add_evr`,
//! `deps_match`, `deps_find`) and `dep.h`. The five columns are stored as
//! parallel [`VarIntArray`]s the way the original stores `names`/`epochs`/
//! `vers`/`rels`/`flags` as parallel `struct array`s, deduplicated through a
//! name-keyed [`HashIndex`]. `rpmvercmp` itself lives in [`crate::version`]
//! (C6); this module only interns tuples and applies the match rule.

use crate::store::hash_index::{self, HashIndex};
use crate::store::strings::StringPool;
use crate::store::varint_array::VarIntArray;
use crate::types::status::DepFlags;
use crate::types::{DepId, StrId};
use crate::version::rpmvercmp;
use std::cmp::Ordering;

/// What: hash a dep's name id the way `original_source/dep.c`'s `dephash`
/// does (`13 * name << 8 ^ name`, i.e. `((13*name) << 8) ^ name`).
fn dep_hash(name: StrId) -> u32 {
    let n = name.0;
    (n.wrapping_mul(13) << 8) ^ n
}

/// What: split a `"[epoch:]version[-release]"` string into its components.
///
/// Output: `(epoch, version, release)`, with missing pieces empty — best
/// effort, per SPEC_FULL §7's "malformed input" handling (an unparseable
/// epoch falls back to `0` rather than erroring).
///
/// Details: the epoch separator is the *first* `:`; the version/release
/// separator is the *first* `-` in what remains, matching
/// `original_source/dep.c`'s `parse_epoch`/`parse_ver` (both use
/// `strchr`, which finds the first occurrence).
fn parse_evr(vers: &str) -> (u32, &str, &str) {
    if vers.is_empty() {
        return (0, "", "");
    }
    let (epoch, rest) = match vers.split_once(':') {
        Some((e, r)) => (e.parse().unwrap_or(0), r),
        None => (0, vers),
    };
    match rest.split_once('-') {
        Some((v, r)) => (epoch, v, r),
        None => (epoch, rest, ""),
    }
}

/// Interned table of dependency tuples.
#[derive(Clone, Debug, Default)]
pub struct DepTable {
    names: VarIntArray,
    flags: VarIntArray,
    epochs: VarIntArray,
    vers: VarIntArray,
    rels: VarIntArray,
    index: HashIndex,
}

impl DepTable {
    /// What: an empty dependency table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: number of interned dep tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// What: is the table empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rebuild_index(&mut self) {
        for i in 0..self.len() as u32 {
            let name = StrId(self.names.get(i as usize));
            self.index.add(i, dep_hash(name));
        }
    }

    /// What: intern `(name, flags, version_string)`, parsing an optional
    /// `"epoch:"` prefix and `"-release"` suffix out of `version_string`.
    ///
    /// Output: the dep-id, new or pre-existing.
    pub fn add(&mut self, strings: &mut StringPool, name: &str, flags: DepFlags, version_string: &str) -> DepId {
        let (epoch, version, release) = parse_evr(version_string);
        self.add_evr(strings, name, flags, epoch, version, release)
    }

    /// What: intern `(name, flags, epoch, version, release)` directly,
    /// deduplicating by the full 5-tuple.
    pub fn add_evr(
        &mut self,
        strings: &mut StringPool,
        name: &str,
        flags: DepFlags,
        epoch: u32,
        version: &str,
        release: &str,
    ) -> DepId {
        let name_id = strings.add(name);
        let ver_id = strings.add(version);
        let rel_id = strings.add(release);

        if self.index.maybe_resize() {
            self.rebuild_index();
        }

        let hash = dep_hash(name_id);
        let mut iter = 0u32;
        let existing = loop {
            let found = self.index.find(hash, &mut iter);
            if found == hash_index::none() {
                break None;
            }
            let i = found as usize;
            if self.names.get(i) == name_id.0
                && self.epochs.get(i) == epoch
                && self.vers.get(i) == ver_id.0
                && self.rels.get(i) == rel_id.0
                && self.flags.get(i) == u32::from(flags.bits())
            {
                break Some(found);
            }
        };
        if let Some(id) = existing {
            return DepId(id);
        }

        let id = self.len() as u32;
        self.names.set(id as usize, name_id.0);
        self.flags.set(id as usize, u32::from(flags.bits()));
        self.epochs.set(id as usize, epoch);
        self.vers.set(id as usize, ver_id.0);
        self.rels.set(id as usize, rel_id.0);
        self.index.add_dir(id, hash, iter);
        DepId(id)
    }

    /// What: name id of an interned dep.
    #[must_use]
    pub fn name(&self, dep: DepId) -> StrId {
        StrId(self.names.get(dep.index()))
    }

    /// What: find the next stored dep-id matching `dep` (same name,
    /// compatible constraint under [`DepTable::matches`]); `dep` itself is
    /// always found on the first probe since `i == dep` short-circuits the
    /// match check, mirroring `original_source/dep.c`'s `deps_find`.
    ///
    /// Output: [`DepId::NONE`] once exhausted.
    #[must_use]
    pub fn find(&self, strings: &StringPool, dep: DepId, iter: &mut u32) -> DepId {
        let hash = dep_hash(self.name(dep));
        loop {
            let found = self.index.find(hash, iter);
            if found == hash_index::none() {
                return DepId::NONE;
            }
            if found == dep.0 || self.matches(strings, dep, DepId(found)) {
                return DepId(found);
            }
        }
    }

    /// What: does `x` match `y` under SPEC_FULL §4.4's version-range rule?
    ///
    /// Details: names must be equal; if either side has `flags == NONE`,
    /// it's a name-only match; otherwise compare `(epoch, version,
    /// release)` lexicographically (only present components), then accept
    /// based on the sign of the difference against the union of both
    /// sides' flags.
    #[must_use]
    pub fn matches(&self, strings: &StringPool, x: DepId, y: DepId) -> bool {
        let (xi, yi) = (x.index(), y.index());
        if self.names.get(xi) != self.names.get(yi) {
            return false;
        }

        let f1 = DepFlags::from_bits_truncate(truncate_u8(self.flags.get(xi)));
        let f2 = DepFlags::from_bits_truncate(truncate_u8(self.flags.get(yi)));
        if f1.is_none() || f2.is_none() {
            return true;
        }

        let mut d = i64::from(self.epochs.get(xi)) - i64::from(self.epochs.get(yi));
        if d == 0 {
            d = component_cmp(strings.get(StrId(self.vers.get(xi))), strings.get(StrId(self.vers.get(yi))));
        }
        if d == 0 {
            d = component_cmp(strings.get(StrId(self.rels.get(xi))), strings.get(StrId(self.rels.get(yi))));
        }

        (d == 0 && f1.intersection(f2).bits() != 0)
            || (d > 0 && (f1.contains(DepFlags::LESS) || f2.contains(DepFlags::GREATER)))
            || (d < 0 && (f1.contains(DepFlags::GREATER) || f2.contains(DepFlags::LESS)))
    }
}

/// What: compare one version or release component, skipping the
/// comparison (returning "equal") when either side is empty — `deps_match`
/// only calls `rpmvercmp` when both strings are non-empty.
fn component_cmp(a: &str, b: &str) -> i64 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    match rpmvercmp(a, b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn truncate_u8(v: u32) -> u8 {
    v as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (DepTable, StringPool) {
        (DepTable::new(), StringPool::new())
    }

    #[test]
    fn interning_twice_returns_same_id() {
        let (mut deps, mut strings) = table();
        let a = deps.add(&mut strings, "foo", DepFlags::EQUAL, "1:2-3");
        let b = deps.add(&mut strings, "foo", DepFlags::EQUAL, "1:2-3");
        assert_eq!(a, b);
        let c = deps.add_evr(&mut strings, "foo", DepFlags::EQUAL, 1, "2", "3");
        assert_eq!(a, c);
    }

    #[test]
    fn add_parses_epoch_and_release() {
        let (mut deps, mut strings) = table();
        let a = deps.add(&mut strings, "foo", DepFlags::EQUAL, "1:2-3");
        assert_eq!(deps.epochs.get(a.index()), 1);
        assert_eq!(strings.get(StrId(deps.vers.get(a.index()))), "2");
        assert_eq!(strings.get(StrId(deps.rels.get(a.index()))), "3");
    }

    #[test]
    fn name_only_match_ignores_version() {
        let (mut deps, mut strings) = table();
        let a = deps.add(&mut strings, "foo", DepFlags::NONE, "");
        let b = deps.add(&mut strings, "foo", DepFlags::EQUAL, "9-9");
        assert!(deps.matches(&strings, a, b));
        assert!(deps.matches(&strings, b, a));
    }

    #[test]
    fn version_range_match_scenario_from_spec() {
        let (mut deps, mut strings) = table();
        // "foo >= 2" against provide "foo = 2-1" must match: epoch ties,
        // version ties (2 == 2), release skipped (require has none), so
        // d == 0 and GREATER|EQUAL intersect EQUAL -> match.
        let require = deps.add(&mut strings, "foo", DepFlags::GREATER | DepFlags::EQUAL, "2");
        let provide = deps.add(&mut strings, "foo", DepFlags::EQUAL, "2-1");
        assert!(deps.matches(&strings, require, provide));

        // Against "foo = 1-1": d > 0 on the require side (2 > 1), but
        // require has no LESS and provide has no GREATER -> no match.
        let provide_low = deps.add(&mut strings, "foo", DepFlags::EQUAL, "1-1");
        assert!(!deps.matches(&strings, require, provide_low));
    }

    #[test]
    fn find_enumerates_every_stored_match() {
        let (mut deps, mut strings) = table();
        let a = deps.add(&mut strings, "sh", DepFlags::NONE, "");
        let b = deps.add(&mut strings, "sh", DepFlags::EQUAL, "1-1");
        let mut iter = 0u32;
        let mut found = Vec::new();
        loop {
            let m = deps.find(&strings, a, &mut iter);
            if m.is_none() {
                break;
            }
            found.push(m);
        }
        assert!(found.contains(&a));
        assert!(found.contains(&b));
    }

    #[test]
    fn distinct_names_never_match() {
        let (mut deps, mut strings) = table();
        let a = deps.add(&mut strings, "foo", DepFlags::NONE, "");
        let b = deps.add(&mut strings, "bar", DepFlags::NONE, "");
        assert!(!deps.matches(&strings, a, b));
    }

    #[test]
    fn survives_many_insertions_through_resizes() {
        let (mut deps, mut strings) = table();
        let mut ids = Vec::new();
        for i in 0..200 {
            ids.push(deps.add(&mut strings, &format!("dep-{i}"), DepFlags::NONE, ""));
        }
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(strings.get(deps.name(*id)), format!("dep-{i}"));
        }
    }
}
