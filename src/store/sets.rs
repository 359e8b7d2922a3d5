//! Sorted-set-of-sets store (C5): an array of per-entity sorted integer
//! sets, optionally sub-bucketed into ordered disjunctions, with an
//! on-demand reverse-lookup index.
//!
//! Grounded field-for-field on `original_source/misc.c`'s `sets_*` family
//! (`sets_add`, `sets_hash`, `sets_find`, `sets_merge`, `sets_subsetcmp`)
//! and `misc.h`'s `struct sets` layout (`ints`, `sets_first`, `sets_size`,
//! `hashtable`, `subsets`), ported onto [`VarIntArray`]-backed fields. A
//! `frozen` state (the reverse index has been built) stands in for "the
//! hashtable array is nonempty" as the mutation guard, matching SPEC_FULL
//! §4.5's "append-frozen once hashed" constraint.

use crate::store::hash_index;
use crate::store::varint_array::VarIntArray;

/// Per-outer-index sorted set, optionally partitioned into sub-buckets,
/// plus an on-demand reverse index from value back to outer index.
#[derive(Clone, Debug, Default)]
pub struct SetStore {
    /// Concatenated bucket contents for every outer set: for each set,
    /// `subsets` offset words followed by its sorted-unique values.
    ints: VarIntArray,
    /// Start offset into `ints` for each outer set.
    sets_first: VarIntArray,
    /// Total element count (offsets + values) for each outer set.
    sets_size: VarIntArray,
    /// Number of sub-bucket boundaries stored for each outer set (`k`);
    /// the set has `k + 1` sub-buckets.
    subsets: VarIntArray,
    /// Reverse index: value -> outer-index + 1 (0 = empty slot). Non-empty
    /// iff the store is frozen.
    hashtable: VarIntArray,
}

impl SetStore {
    /// What: an empty set-of-sets store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: is the store currently frozen by a built reverse index?
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        !self.hashtable.is_empty()
    }

    fn assert_mutable(&self) {
        assert!(!self.is_frozen(), "mutation of a frozen set-of-sets");
    }

    /// What: preallocate `size` empty outer sets (SPEC_FULL §4.9's "sets
    /// are sized once after load").
    pub fn set_len(&mut self, size: usize) {
        self.assert_mutable();
        self.sets_first.set_len(size);
        self.sets_size.set_len(size);
        self.subsets.set_len(size);
    }

    /// What: number of outer sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets_first.len()
    }

    /// What: is the store empty of outer sets?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn subset_first(&self, set: usize, subset: usize) -> usize {
        let subsets = self.subsets.get(set) as usize;
        let set_first = self.sets_first.get(set) as usize;
        assert!(subset <= subsets, "subset index out of range");
        if subset == 0 {
            subsets
        } else {
            self.ints.get(set_first + subset - 1) as usize
        }
    }

    fn subset_last(&self, set: usize, subset: usize) -> usize {
        let subsets = self.subsets.get(set) as usize;
        let set_first = self.sets_first.get(set) as usize;
        assert!(subset <= subsets, "subset index out of range");
        if subset == subsets {
            self.sets_size.get(set) as usize
        } else {
            self.ints.get(set_first + subset) as usize
        }
    }

    /// What: element count of `set`, excluding the sub-bucket offset
    /// prefix.
    #[must_use]
    pub fn size(&self, set: usize) -> usize {
        self.sets_size.get(set) as usize - self.subsets.get(set) as usize
    }

    /// What: number of sub-buckets in `set` (always `>= 1`).
    #[must_use]
    pub fn subsets(&self, set: usize) -> usize {
        self.subsets.get(set) as usize + 1
    }

    /// What: element count of one sub-bucket.
    #[must_use]
    pub fn subset_size(&self, set: usize, subset: usize) -> usize {
        if self.subsets.get(set) > 0 {
            self.subset_last(set, subset) - self.subset_first(set, subset)
        } else {
            self.sets_size.get(set) as usize
        }
    }

    /// What: the `index`-th element of `set`'s `subset`-th sub-bucket.
    #[must_use]
    pub fn get(&self, set: usize, subset: usize, index: usize) -> u32 {
        let set_first = self.sets_first.get(set) as usize;
        let sub_first = if self.subsets.get(set) > 0 {
            self.subset_first(set, subset)
        } else {
            0
        };
        self.ints.get(set_first + index + sub_first)
    }

    /// What: does `set`'s `subset`-th sub-bucket contain `value`?
    #[must_use]
    pub fn subset_has(&self, set: usize, subset: usize, value: u32) -> bool {
        let first = self.sets_first.get(set) as usize;
        let sub_first = self.subset_first(set, subset);
        let sub_size = self.subset_last(set, subset) - sub_first;
        let i = self.ints.bsearch(first + sub_first, sub_size, value);
        i < first + sub_first + sub_size && self.ints.get(i) == value
    }

    /// What: does any sub-bucket of `set` contain `value`?
    #[must_use]
    pub fn has(&self, set: usize, value: u32) -> bool {
        let subsets = self.subsets.get(set) as usize;
        if subsets > 0 {
            (0..=subsets).any(|j| self.subset_has(set, j, value))
        } else {
            let first = self.sets_first.get(set) as usize;
            let size = self.sets_size.get(set) as usize;
            let i = self.ints.bsearch(first, size, value);
            i < first + size && self.ints.get(i) == value
        }
    }

    /// What: insert `value` into `set`'s `subset`-th sub-bucket, creating
    /// sub-buckets up to `subset` if needed.
    ///
    /// Output: the index of `value` within that sub-bucket (new or
    /// pre-existing).
    ///
    /// Panics if the store is frozen, or if `set` is not the last existing
    /// outer set or a brand-new one immediately past it (SPEC_FULL §4.5:
    /// "only the last outer set or a newly extended set may be mutated").
    pub fn add(&mut self, set: usize, subset: usize, value: u32) -> usize {
        self.assert_mutable();
        assert!(
            set + 1 >= self.sets_first.len(),
            "only the last outer set or a newly extended one may be mutated"
        );

        let (first, mut size, mut subsets);
        if self.sets_size.len() > set {
            first = self.sets_first.get(set) as usize;
            size = self.sets_size.get(set) as usize;
            subsets = self.subsets.get(set) as usize;
        } else {
            size = 0;
            subsets = 0;
            first = self.ints.len();
            self.sets_first.set(set, first as u32);
            self.sets_size.set(set, 0);
            self.subsets.set(set, 0);
        }

        let sub_first;
        let sub_size;
        if subsets > 0 || subset > 0 {
            if subset > subsets {
                self.ints.move_range(first + subset, first + subsets, size - subsets);
                size += subset - subsets;
                for i in 0..subsets {
                    self.ints.inc(first + i, (subset - subsets) as i64);
                }
                let new_sub_first = size;
                for s in subsets..subset {
                    self.ints.set(first + s, new_sub_first as u32);
                }
                subsets = subset;
                self.subsets.set(set, subsets as u32);
                sub_first = new_sub_first;
                sub_size = 0;
            } else {
                sub_first = self.subset_first(set, subset);
                sub_size = self.subset_last(set, subset) - sub_first;
            }
        } else {
            sub_first = 0;
            sub_size = size;
        }

        let abs_sub_first = first + sub_first;
        let i = self.ints.bsearch(abs_sub_first, sub_size, value);

        if i < abs_sub_first + sub_size && self.ints.get(i) == value {
            return i - abs_sub_first;
        }

        self.ints.move_range(i + 1, i, first + size - i);
        size += 1;
        self.ints.set(i, value);
        self.sets_size.set(set, size as u32);

        if subsets > 0 {
            for j in subset..subsets {
                self.ints.inc(first + j, 1);
            }
        }

        i - abs_sub_first
    }

    fn hash_table_size(n_ints: usize) -> usize {
        let target = n_ints * 2;
        let mut s = 16usize;
        while s < target {
            s *= 2;
        }
        s
    }

    /// What: hash of a raw value for the reverse index, matching
    /// `misc.c`'s `inthash` (`13 * i << 8 ^ i`).
    fn int_hash(v: u32) -> u32 {
        (v.wrapping_mul(13) << 8) ^ v
    }

    /// What: build the reverse-lookup index (value -> outer set), freezing
    /// the store. Uses the "first-collision-probe-count, value" caching
    /// trick from `misc.c`'s `sets_hash` to short-circuit repeat probes for
    /// the same value across different outer sets.
    pub fn hash(&mut self) {
        let s = Self::hash_table_size(self.ints.len());
        let mut table = VarIntArray::new();
        table.set_len(s);
        let mut first_probe_count = VarIntArray::new();
        first_probe_count.set_len(s);
        let mut first_value = VarIntArray::new();
        first_value.set_len(s);

        for set in 0..self.sets_first.len() {
            let subsets = self.subsets.get(set) as usize;
            let first = self.sets_first.get(set) as usize;
            let last = first + self.sets_size.get(set) as usize - subsets;
            for index in first + subsets..last {
                let value = self.ints.get(index);
                let hash = Self::int_hash(value);
                let mut j = 0u32;
                let oslot = hash_index::slot(hash, j, s);
                let mut slot = oslot;
                if first_value.get(oslot) == value {
                    j = first_probe_count.get(oslot);
                    slot = hash_index::slot(hash, j, s);
                }
                while table.get(slot) != 0 {
                    j += 1;
                    slot = hash_index::slot(hash, j, s);
                }
                table.set(slot, (set + 1) as u32);
                first_probe_count.set(oslot, j + 1);
                first_value.set(oslot, value);
            }
        }
        self.hashtable = table;
    }

    /// What: release the reverse index, unfreezing the store.
    pub fn unhash(&mut self) {
        self.hashtable = VarIntArray::new();
    }

    /// What: enumerate every outer set containing `value`, one per call.
    ///
    /// Output: [`hash_index::none()`] once exhausted. Requires
    /// [`SetStore::hash`] to have been called.
    #[must_use]
    pub fn find(&self, value: u32, iter: &mut u32) -> u32 {
        let s = self.hashtable.len();
        if s == 0 {
            return hash_index::none();
        }
        let h = Self::int_hash(value);
        loop {
            let slot = hash_index::slot(h, *iter, s);
            *iter += 1;
            let stored = self.hashtable.get(slot);
            if stored == 0 {
                return hash_index::none();
            }
            let outer = stored - 1;
            if self.has(outer as usize, value) {
                return outer;
            }
        }
    }

    /// What: union-merge `other` into `self`, entry by entry, sub-bucket by
    /// sub-bucket. Used to merge `fileprovides` into `provides` (SPEC_FULL
    /// §3 "per-package provides set").
    pub fn merge(&mut self, other: &Self) {
        self.assert_mutable();
        let sets1 = self.sets_first.len();
        let sets2 = other.sets_first.len();
        let n = sets1.max(sets2);

        let tmp = self.clone();
        *self = Self::new();

        for i in 0..n {
            let subs1 = if i < sets1 { tmp.subsets.get(i) as usize } else { 0 };
            let subs2 = if i < sets2 { other.subsets.get(i) as usize } else { 0 };
            let subs = subs1.max(subs2);
            for j in 0..=subs {
                if i < sets1 && j <= subs1 {
                    for k in 0..tmp.subset_size(i, j) {
                        self.add(i, j, tmp.get(i, j, k));
                    }
                }
                if i < sets2 && j <= subs2 {
                    for k in 0..other.subset_size(i, j) {
                        self.add(i, j, other.get(i, j, k));
                    }
                }
            }
        }
    }

    /// What: element-wise equality of two sub-buckets (possibly in
    /// different stores), named after `misc.c`'s `sets_subsetcmp` (which
    /// returns nonzero on *difference*; this returns `true` on equality).
    #[must_use]
    pub fn subset_eq(&self, set1: usize, subset1: usize, other: &Self, set2: usize, subset2: usize) -> bool {
        let sub_first1 = self.subset_first(set1, subset1);
        let sub_first2 = other.subset_first(set2, subset2);
        let len = self.subset_last(set1, subset1) - sub_first1;
        if other.subset_last(set2, subset2) - sub_first2 != len {
            return false;
        }
        let first1 = self.sets_first.get(set1) as usize;
        let first2 = other.sets_first.get(set2) as usize;
        (0..len).all(|i| self.ints.get(first1 + sub_first1 + i) == other.ints.get(first2 + sub_first2 + i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_single_bucket() {
        let mut s = SetStore::new();
        s.add(0, 0, 5);
        s.add(0, 0, 3);
        s.add(0, 0, 9);
        assert_eq!(s.size(0), 3);
        assert_eq!((s.get(0, 0, 0), s.get(0, 0, 1), s.get(0, 0, 2)), (3, 5, 9));
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let mut s = SetStore::new();
        s.add(0, 0, 5);
        s.add(0, 0, 5);
        assert_eq!(s.size(0), 1);
    }

    #[test]
    fn multiple_sets_independent() {
        let mut s = SetStore::new();
        s.add(0, 0, 1);
        s.add(1, 0, 2);
        s.add(1, 0, 3);
        assert_eq!(s.size(0), 1);
        assert_eq!(s.size(1), 2);
    }

    #[test]
    fn subsets_partition_correctly() {
        let mut s = SetStore::new();
        s.add(0, 0, 10); // hard requirement
        s.add(0, 1, 20); // disjunction 1
        s.add(0, 1, 21);
        s.add(0, 2, 30); // disjunction 2
        assert_eq!(s.subsets(0), 3);
        assert_eq!(s.subset_size(0, 0), 1);
        assert_eq!(s.subset_size(0, 1), 2);
        assert_eq!(s.subset_size(0, 2), 1);
        assert!(s.subset_has(0, 1, 20));
        assert!(!s.subset_has(0, 1, 30));
        assert!(s.has(0, 30));
        assert!(!s.has(0, 99));
    }

    #[test]
    fn jumping_straight_to_a_subset_allocates_empties_between() {
        let mut s = SetStore::new();
        s.add(0, 2, 7);
        assert_eq!(s.subsets(0), 3);
        assert_eq!(s.subset_size(0, 0), 0);
        assert_eq!(s.subset_size(0, 1), 0);
        assert_eq!(s.subset_size(0, 2), 1);
    }

    #[test]
    fn reverse_index_finds_every_containing_set() {
        let mut s = SetStore::new();
        s.set_len(3);
        s.add(0, 0, 42);
        s.add(1, 0, 42);
        s.add(2, 0, 7);
        s.hash();
        let mut iter = 0u32;
        let mut found = Vec::new();
        loop {
            let o = s.find(42, &mut iter);
            if o == hash_index::none() {
                break;
            }
            found.push(o);
        }
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn mutation_after_hash_panics() {
        let mut s = SetStore::new();
        s.add(0, 0, 1);
        s.hash();
        s.add(0, 0, 2);
    }

    #[test]
    fn unhash_unfreezes() {
        let mut s = SetStore::new();
        s.add(0, 0, 1);
        s.hash();
        s.unhash();
        s.add(0, 0, 2); // would panic if still frozen
        assert_eq!(s.size(0), 2);
    }

    #[test]
    fn subset_eq_compares_element_wise() {
        let mut a = SetStore::new();
        a.add(0, 1, 1);
        a.add(0, 1, 2);
        let mut b = SetStore::new();
        b.add(0, 1, 1);
        b.add(0, 1, 2);
        assert!(a.subset_eq(0, 1, &b, 0, 1));
        b.add(0, 1, 3);
        assert!(!a.subset_eq(0, 1, &b, 0, 1));
    }

    #[test]
    fn merge_unions_both_stores() {
        let mut a = SetStore::new();
        a.add(0, 0, 1);
        a.add(1, 0, 2);
        let mut b = SetStore::new();
        b.add(0, 0, 3);
        b.add(2, 0, 4);
        a.merge(&b);
        assert_eq!(a.size(0), 2);
        assert!(a.has(0, 1));
        assert!(a.has(0, 3));
        assert_eq!(a.size(1), 1);
        assert_eq!(a.size(2), 1);
        assert!(a.has(2, 4));
    }
}
