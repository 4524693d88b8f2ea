//! Per-run dedup bookkeeping.
//!
//! Keys are never removed once inserted: the set is monotonically growing
//! for the lifetime of a single `ForwardEngine::forward` call.

use std::collections::HashSet;

/// `(from-peer-id, message-id)` — the dedup key for a single message.
pub type DedupKey = (i64, i32);

#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<DedupKey>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: DedupKey) -> bool {
        self.seen.contains(&key)
    }

    pub fn insert(&mut self, key: DedupKey) {
        self.seen.insert(key);
    }

    /// Insert a primary key plus every sibling key fetched for the same
    /// album, in one call — matches the deferred insertion performed at the
    /// end of every attempted job.
    pub fn insert_all(&mut self, primary: DedupKey, siblings: impl IntoIterator<Item = DedupKey>) {
        self.seen.insert(primary);
        for key in siblings {
            self.seen.insert(key);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_set_contains_nothing() {
        let set = DedupSet::new();
        assert!(!set.contains((1, 2)));
        assert!(set.is_empty());
    }

    #[test]
    fn insert_all_marks_primary_and_siblings() {
        let mut set = DedupSet::new();
        set.insert_all((10, 1), [(10, 2), (10, 3)]);
        assert!(set.contains((10, 1)));
        assert!(set.contains((10, 2)));
        assert!(set.contains((10, 3)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn keys_are_never_removed() {
        let mut set = DedupSet::new();
        set.insert((1, 1));
        set.insert((1, 1));
        assert_eq!(set.len(), 1);
        assert!(set.contains((1, 1)));
    }
}
