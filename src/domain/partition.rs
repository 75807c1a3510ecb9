// ============================================================
// Layer 3 — Partition Kinds
// ============================================================
// The three disjoint slices of the shuffled dataset.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionKind {
    Train,
    Validation,
    Test,
}

impl PartitionKind {
    /// All kinds in split order: train first, test last
    pub const ALL: [PartitionKind; 3] = [
        PartitionKind::Train,
        PartitionKind::Validation,
        PartitionKind::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Train      => "train",
            PartitionKind::Validation => "val",
            PartitionKind::Test       => "test",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
