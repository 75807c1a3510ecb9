// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed concerns used by the trainer:
//
//   checkpoint.rs — GP hyperparameters per epoch and the
//                   experiment config, as JSON
//
//   metrics.rs    — per-epoch CSV of train loss and
//                   validation scores
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Model checkpoint and config persistence
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
