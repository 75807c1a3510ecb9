// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw table to tensor batches:
//
//   SinusoidGenerator   → builds the raw [x, sin, cos] table
//       │
//       ▼
//   DataPartitioner     → one seeded shuffle, one range split
//       │                 (SplitPolicy), column split at input_dim
//       ▼
//   PairDataset × 3     → train / val / test, Burn Dataset impl
//       │
//       ▼
//   LoaderDescriptor    → full-batch loader per partition
//       │
//       ▼
//   PairBatcher         → stacks a partition into tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Synthetic sinusoid dataset (usage example)
pub mod synthetic;

/// Seeded Fisher-Yates permutation source
pub mod permutation;

/// Pure train/val/test range computation
pub mod split_policy;

/// Indexed (features, targets) view of one partition
pub mod dataset;

/// Shuffle → split → materialise orchestration
pub mod partitioner;

/// Full-batch loader descriptors
pub mod loader;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
