//! Interned string pool (C3).
//!
//! What: an append-only byte arena deduplicated by a [`HashIndex`]; an id is
//! the byte offset where that string starts.
//!
//! Grounded on `original_source/misc.c`'s `strings_*` functions, adapted to
//! an append-only `Vec<u8>` with NUL terminators in place of the original's
//! manual `realloc`/`strcpy` bookkeeping.

use crate::store::hash_index::HashIndex;
use crate::types::StrId;

fn hash_str(s: &str) -> u32 {
    let mut h: u32 = 0;
    for b in s.as_bytes() {
        h = h.wrapping_mul(27).wrapping_add(u32::from(*b));
    }
    h
}

/// Deduplicated, append-only pool of interned byte strings.
#[derive(Clone, Debug, Default)]
pub struct StringPool {
    arena: Vec<u8>,
    index: HashIndex,
}

impl StringPool {
    /// What: an empty string pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            index: HashIndex::new(),
        }
    }

    fn rebuild_index(&mut self) {
        let mut id = 0u32;
        while (id as usize) < self.arena.len() {
            let s = self.get(StrId(id));
            let hash = hash_str(s);
            self.index.add(id, hash);
            id += s.len() as u32 + 1;
        }
    }

    /// What: intern `s`, returning its existing id if already stored, else
    /// appending it (NUL-terminated) and returning the new id.
    pub fn add(&mut self, s: &str) -> StrId {
        if self.index.maybe_resize() {
            self.rebuild_index();
        }
        let hash = hash_str(s);
        let mut iter = 0u32;
        loop {
            let found = self.index.find(hash, &mut iter);
            if found == crate::store::hash_index::none() {
                break;
            }
            if self.get(StrId(found)) == s {
                return StrId(found);
            }
        }
        let id = self.arena.len() as u32;
        self.arena.extend_from_slice(s.as_bytes());
        self.arena.push(0);
        self.index.add_dir(id, hash, iter);
        StrId(id)
    }

    /// What: look up the id of `s` without interning it.
    ///
    /// Output: [`StrId::NONE`] if `s` was never interned.
    #[must_use]
    pub fn get_id(&self, s: &str) -> StrId {
        let hash = hash_str(s);
        let mut iter = 0u32;
        loop {
            let found = self.index.find(hash, &mut iter);
            if found == crate::store::hash_index::none() {
                return StrId::NONE;
            }
            if self.get(StrId(found)) == s {
                return StrId(found);
            }
        }
    }

    /// What: dereference an id to its stored string slice.
    ///
    /// Panics if `id` was never produced by this pool.
    #[must_use]
    pub fn get(&self, id: StrId) -> &str {
        let start = id.index();
        let end = self.arena[start..]
            .iter()
            .position(|&b| b == 0)
            .map_or(self.arena.len(), |p| start + p);
        std::str::from_utf8(&self.arena[start..end]).expect("interned strings are valid utf8")
    }

    /// What: id of the first interned string, for iteration.
    ///
    /// Output: [`StrId::NONE`] if the pool is empty.
    #[must_use]
    pub fn first(&self) -> StrId {
        if self.arena.is_empty() {
            StrId::NONE
        } else {
            StrId(0)
        }
    }

    /// What: id of the string following `id`, for iteration.
    ///
    /// Output: [`StrId::NONE`] if `id` was the last one.
    #[must_use]
    pub fn next(&self, id: StrId) -> StrId {
        let len = self.get(id).len();
        let after = id.index() + len + 1;
        if after >= self.arena.len() {
            StrId::NONE
        } else {
            StrId(after as u32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_twice_is_idempotent() {
        let mut s = StringPool::new();
        let a = s.add("hello");
        let b = s.add("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut s = StringPool::new();
        let a = s.add("foo");
        let b = s.add("bar");
        assert_ne!(a, b);
        assert_eq!(s.get(a), "foo");
        assert_eq!(s.get(b), "bar");
    }

    #[test]
    fn zero_is_a_valid_id_not_a_sentinel() {
        let mut s = StringPool::new();
        let a = s.add("first");
        assert_eq!(a, StrId(0));
        assert!(a.is_some());
    }

    #[test]
    fn get_id_returns_none_for_absent() {
        let mut s = StringPool::new();
        s.add("present");
        assert_eq!(s.get_id("absent"), StrId::NONE);
    }

    #[test]
    fn iteration_visits_every_interned_string() {
        let mut pool = StringPool::new();
        let ids: Vec<StrId> = ["a", "bb", "ccc"].iter().map(|s| pool.add(s)).collect();
        let mut seen = Vec::new();
        let mut cur = pool.first();
        while cur.is_some() {
            seen.push(cur);
            cur = pool.next(cur);
        }
        assert_eq!(seen, ids);
    }

    #[test]
    fn survives_many_insertions_through_resizes() {
        let mut pool = StringPool::new();
        let mut ids = Vec::new();
        for i in 0..200 {
            ids.push(pool.add(&format!("pkg-{i}")));
        }
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(pool.get(*id), format!("pkg-{i}"));
        }
    }
}
