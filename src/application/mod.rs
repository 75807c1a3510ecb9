// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal.
//
// Rules for this layer:
//   - No GP math here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// Generate → partition → tune → fit → test
pub mod experiment_use_case;

// Generate → partition → summarise
pub mod split_use_case;

// Checkpoint → rebuild partitions and model → test
pub mod evaluate_use_case;
