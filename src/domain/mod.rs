// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that define what the system
// works on: the raw table, the partition kinds, the errors
// the core can raise, and the collaborator traits.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Errors raised by the partitioning core
pub mod error;

/// Train / validation / test identifiers
pub mod partition;

/// The raw row-major dataset
pub mod raw_dataset;

/// Collaborator abstractions (permutation source, data supplier)
pub mod traits;
