// ============================================================
// Layer 3 — Partitioning Errors
// ============================================================
// Every failure the partitioning core can report. These are
// local and fatal to the calling operation: nothing here is
// retried, callers decide what to do.
//
// The application layer wraps these in anyhow::Error with
// extra context; the core itself only ever returns this type.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    /// A loader or partition accessor was used before `setup()`
    #[error("partitioner is not set up; call setup() first")]
    Uninitialized,

    /// `setup()` was called on a partitioner that is already Ready
    #[error("partitioner is already set up; use repartition() to reshuffle")]
    AlreadySetUp,

    /// Split fractions outside [0, 1] or summing above 1
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset index outside [0, len)
    #[error("index {index} out of range for dataset of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Column split leaves no targets, or rows/columns disagree
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The external permutation source returned something that is
    /// not a permutation of [0, n)
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
}
