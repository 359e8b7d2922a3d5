//! Status and dependency-flag bitsets.
//!
//! Both are small, closed bit sets, hand-rolled as `const fn` predicates
//! the way the teacher crate hand-rolls `DependencyStatus` predicates
//! rather than pulling in the `bitflags` crate for a handful of bits.

/// Per-package status bits (SPEC_FULL §3).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFlags(u16);

impl StatusFlags {
    /// Package is present in the source database.
    pub const INSTALLED: Self = Self(1 << 0);
    /// Nothing currently depends on this package.
    pub const LEAF: Self = Self(1 << 1);
    /// Only disjunctive requirers remain, all with alternatives.
    pub const PARTLEAF: Self = Self(1 << 2);
    /// Some hard requirement had no provider at load time.
    pub const BROKEN: Self = Self(1 << 3);
    /// Would become broken if all current `DELETE` marks were applied.
    pub const TOBEBROKEN: Self = Self(1 << 4);
    /// User-marked for deletion this session.
    pub const DELETE: Self = Self(1 << 5);
    /// Already removed in the underlying store, retained for analysis.
    pub const DELETED: Self = Self(1 << 6);
    /// Member of a strongly connected component of size >= 2.
    pub const INLOOP: Self = Self(1 << 7);

    /// `DELETE | DELETED` — "as good as gone" for classification purposes.
    pub const ALLDEL: Self = Self(Self::DELETE.0 | Self::DELETED.0);

    /// Empty flag set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// What: test whether every bit in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// What: test whether any bit in `other` is set in `self`.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// What: set the given bits.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// What: clear the given bits.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// What: union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// What: raw bits, for serialization.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// What: reconstruct from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }
}

impl std::ops::BitOr for StatusFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Version-constraint comparison bits on a dependency (SPEC_FULL §3 / §4.4).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct DepFlags(u8);

impl DepFlags {
    /// No version constraint at all ("name match only").
    pub const NONE: Self = Self(0);
    /// `<`
    pub const LESS: Self = Self(1 << 0);
    /// `>`
    pub const GREATER: Self = Self(1 << 1);
    /// `=`
    pub const EQUAL: Self = Self(1 << 2);

    /// What: build from raw masked bits (callers are expected to mask off
    /// any extra bits from their own domain, e.g. a reader-specific
    /// "prereq" flag, before constructing a `DepFlags`; this type can only
    /// ever represent the three comparison bits).
    #[must_use]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & (Self::LESS.0 | Self::GREATER.0 | Self::EQUAL.0))
    }

    /// What: raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// What: is this "no constraint" (name match only)?
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// What: bitwise AND of two flag sets (used for the `d == 0` match rule).
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// What: does `self` contain every bit of `other`?
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DepFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_alldel_is_delete_or_deleted() {
        let mut s = StatusFlags::empty();
        assert!(!s.intersects(StatusFlags::ALLDEL));
        s.insert(StatusFlags::DELETED);
        assert!(s.intersects(StatusFlags::ALLDEL));
        s.remove(StatusFlags::DELETED);
        s.insert(StatusFlags::DELETE);
        assert!(s.intersects(StatusFlags::ALLDEL));
    }

    #[test]
    fn depflags_truncates_stray_bits() {
        let f = DepFlags::from_bits_truncate(0xFF);
        assert_eq!(f.bits(), DepFlags::LESS.bits() | DepFlags::GREATER.bits() | DepFlags::EQUAL.bits());
    }
}
