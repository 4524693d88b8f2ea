//! Per-run random id generator for outbound messages.
//!
//! Seeded from OS entropy at construction and owned by the engine for the
//! lifetime of a single `forward` call — never a process-global generator,
//! and never shared unsynchronized across threads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct RandomIdGen {
    rng: StdRng,
}

impl RandomIdGen {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A fresh non-zero 63-bit id, per the wire protocol's random-id width.
    pub fn next_id(&mut self) -> i64 {
        loop {
            let candidate = self.rng.gen::<i64>() & i64::MAX;
            if candidate != 0 {
                return candidate;
            }
        }
    }

    /// `n` fresh ids, e.g. for an album's multi-media send.
    pub fn next_ids(&mut self, n: usize) -> Vec<i64> {
        (0..n).map(|_| self.next_id()).collect()
    }
}

impl Default for RandomIdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_non_zero_and_within_63_bits() {
        let mut gen = RandomIdGen::new();
        for _ in 0..1000 {
            let id = gen.next_id();
            assert!(id != 0);
            assert!(id > 0, "id must fit in 63 bits: {id}");
        }
    }

    #[test]
    fn batch_ids_are_pairwise_distinct_with_overwhelming_probability() {
        let mut gen = RandomIdGen::new();
        let ids = gen.next_ids(64);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
