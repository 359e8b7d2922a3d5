//! Open-addressed hash index (C2).
//!
//! What: maps a `u32` hash to a set of stored `u32` values via quadratic
//! probing, load factor kept at or below 0.5.
//!
//! Grounded on `original_source/misc.c`'s `hashtable_*` functions. Slots
//! store `value + 1` so `0` means "empty"; [`HashIndex::find`] returns
//! [`NONE`](u32::MAX) through wraparound-free arithmetic (an explicit
//! sentinel, not reliance on unsigned wraparound, resolving SPEC_FULL §9's
//! open question about that).

use crate::store::varint_array::VarIntArray;

const NONE: u32 = u32::MAX;

pub(crate) fn slot(hash: u32, iter: u32, size: usize) -> usize {
    let size = size as u64;
    let h = hash as u64;
    let i = iter as u64;
    (((h % size) + (i + i * i) / 2) % size) as usize
}

/// Quadratic-probed slot table from hash to a stored `u32` value.
#[derive(Clone, Debug, Default)]
pub struct HashIndex {
    table: VarIntArray,
    load: usize,
}

impl HashIndex {
    /// What: a fresh, empty index with its initial 1-slot table.
    #[must_use]
    pub fn new() -> Self {
        let mut table = VarIntArray::new();
        table.set_len(1);
        Self { table, load: 0 }
    }

    fn size(&self) -> usize {
        self.table.len()
    }

    fn needs_resize(&self) -> bool {
        self.load * 2 + 1 >= self.size()
    }

    /// What: grow the table until the load factor is restored, if needed.
    ///
    /// Output: `true` if a resize happened — callers must then re-insert
    /// every previously stored id using [`HashIndex::add_dir`] (or `add`)
    /// with freshly recomputed hashes, mirroring the original's contract
    /// where the caller (not the hashtable) knows how to recompute hashes.
    pub fn maybe_resize(&mut self) -> bool {
        if !self.needs_resize() {
            return false;
        }
        let mut new_size = self.size();
        while self.load * 2 + 1 >= new_size {
            new_size = if new_size == 0 { 16 } else { new_size * 2 };
        }
        self.table = VarIntArray::new();
        self.table.set_len(new_size);
        self.load = 0;
        true
    }

    /// What: return the stored value at the `iter`-th probe of `hash`, or
    /// [`NONE`] if that slot is empty. Increments `*iter` as a side effect,
    /// matching the original's `iter` out-parameter idiom so callers can
    /// loop collecting every candidate.
    #[must_use]
    pub fn find(&self, hash: u32, iter: &mut u32) -> u32 {
        let s = slot(hash, *iter, self.size());
        *iter += 1;
        let v = self.table.get(s);
        if v == 0 {
            NONE
        } else {
            v - 1
        }
    }

    /// What: insert `value` at the first empty probed slot for `hash`,
    /// refusing to store a duplicate value that is already present.
    pub fn add(&mut self, value: u32, hash: u32) {
        debug_assert!(!self.needs_resize());
        let mut iter = 0u32;
        loop {
            let s = slot(hash, iter, self.size());
            let v = self.table.get(s);
            if v == 0 {
                self.table.set(s, value + 1);
                self.load += 1;
                return;
            }
            if v - 1 == value {
                return;
            }
            iter += 1;
        }
    }

    /// What: install `value` directly at the probe position previously
    /// returned by a negative [`HashIndex::find`] lookup (`iter` is the
    /// count of probes already made, i.e. the value consumed from that
    /// `find` loop). This skips re-probing from scratch.
    pub fn add_dir(&mut self, value: u32, hash: u32, iter: u32) {
        debug_assert!(!self.needs_resize());
        let s = slot(hash, iter.saturating_sub(1), self.size());
        debug_assert_eq!(self.table.get(s), 0);
        self.table.set(s, value + 1);
        self.load += 1;
    }
}

/// Sentinel meaning "no more matches" from [`HashIndex::find`].
#[must_use]
pub const fn none() -> u32 {
    NONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_find_roundtrips() {
        let mut h = HashIndex::new();
        h.maybe_resize();
        h.add(7, 42);
        let mut iter = 0;
        assert_eq!(h.find(42, &mut iter), 7);
    }

    #[test]
    fn find_on_empty_returns_none() {
        let h = HashIndex::new();
        let mut iter = 0;
        assert_eq!(h.find(99, &mut iter), NONE);
    }

    #[test]
    fn resize_triggers_past_load_factor() {
        let mut h = HashIndex::new();
        for i in 0..40u32 {
            if h.maybe_resize() {
                // caller would normally re-insert everything; for this
                // test we just drop and re-add below
            }
            h.add(i, i);
        }
        let mut iter = 0;
        assert_eq!(h.find(5, &mut iter), 5);
    }

    #[test]
    fn duplicate_add_is_noop() {
        let mut h = HashIndex::new();
        h.maybe_resize();
        h.add(3, 10);
        h.add(3, 10);
        assert_eq!(h.load, 1);
    }
}
