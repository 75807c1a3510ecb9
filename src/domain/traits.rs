// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two collaborators the partitioning core consumes but
// does not own:
//
//   PermutationSource → a seedable shuffle, e.g. SeededPermutation
//   RawDataSupplier   → anything that produces the raw table,
//                       e.g. the synthetic SinusoidGenerator
//
// The core only ever talks to these traits, so tests can
// plug in fixed permutations or hand-written tables.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::raw_dataset::RawDataset;

// ─── PermutationSource ────────────────────────────────────────────────────────
/// Produces random orderings of `[0, n)`.
///
/// Implementations must be deterministic for a fixed seed:
/// two sources built from the same seed return the same
/// sequence of permutations.
pub trait PermutationSource {
    /// Return the indices `0..n` in some order, each exactly once.
    fn permute(&mut self, n: usize) -> Vec<usize>;
}

// ─── RawDataSupplier ──────────────────────────────────────────────────────────
/// Any component that can build the raw 2-D dataset.
pub trait RawDataSupplier {
    fn supply(&self) -> Result<RawDataset>;
}

/// Replays a fixed permutation. Used by tests to pin the shuffle.
#[cfg(test)]
pub struct FixedPermutation(pub Vec<usize>);

#[cfg(test)]
impl PermutationSource for FixedPermutation {
    fn permute(&mut self, _n: usize) -> Vec<usize> {
        self.0.clone()
    }
}
