// ============================================================
// Layer 4 — Seeded Permutation Source
// ============================================================
// Fisher-Yates shuffle via rand::seq::SliceRandom on a
// StdRng seeded from a u64. Successive calls advance the
// generator, so a second permute() on the same source gives
// a different order, while a fresh source with the same seed
// replays the first one.
//
// Reference: rand crate documentation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::traits::PermutationSource;

#[derive(Debug, Clone)]
pub struct SeededPermutation {
    rng: StdRng,
}

impl SeededPermutation {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl PermutationSource for SeededPermutation {
    fn permute(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_a_permutation() {
        let mut p = SeededPermutation::new(7);
        let mut perm = p.permute(50);
        perm.sort_unstable();
        assert_eq!(perm, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = SeededPermutation::new(42).permute(100);
        let b = SeededPermutation::new(42).permute(100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_successive_calls_advance() {
        let mut p = SeededPermutation::new(42);
        let first  = p.permute(100);
        let second = p.permute(100);
        assert_ne!(first, second);
    }

    #[test]
    fn test_zero_length() {
        assert!(SeededPermutation::new(1).permute(0).is_empty());
    }
}
