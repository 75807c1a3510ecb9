use std::sync::Arc;

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::error::PartitionError;

/// One (input, target) row of a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub features: Vec<f32>,
    pub targets:  Vec<f32>,
}

/// Read-only view of one partition, stored as two row-major
/// column blocks that share a row count.
///
/// Cloning is cheap: both blocks sit behind an `Arc`, so the
/// same partition can be read from several worker threads.
#[derive(Debug, Clone)]
pub struct PairDataset {
    features:   Arc<[f32]>,
    targets:    Arc<[f32]>,
    input_dim:  usize,
    target_dim: usize,
    rows:       usize,
}

impl PairDataset {
    pub fn new(
        features:   Vec<f32>,
        input_dim:  usize,
        targets:    Vec<f32>,
        target_dim: usize,
    ) -> Result<Self, PartitionError> {
        if input_dim == 0 || target_dim == 0 {
            return Err(PartitionError::ShapeMismatch(format!(
                "input_dim ({input_dim}) and target_dim ({target_dim}) must both be at least 1"
            )));
        }
        if features.len() % input_dim != 0 || targets.len() % target_dim != 0 {
            return Err(PartitionError::ShapeMismatch(
                "column blocks are not a whole number of rows".to_string(),
            ));
        }

        let rows = features.len() / input_dim;
        let target_rows = targets.len() / target_dim;
        if rows != target_rows {
            return Err(PartitionError::ShapeMismatch(format!(
                "{rows} feature rows but {target_rows} target rows"
            )));
        }

        Ok(Self {
            features: features.into(),
            targets:  targets.into(),
            input_dim,
            target_dim,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The pair at `index`, or `OutOfRange` past the end.
    pub fn get(&self, index: usize) -> Result<Pair, PartitionError> {
        if index >= self.rows {
            return Err(PartitionError::OutOfRange { index, len: self.rows });
        }
        let f = index * self.input_dim;
        let t = index * self.target_dim;
        Ok(Pair {
            features: self.features[f..f + self.input_dim].to_vec(),
            targets:  self.targets[t..t + self.target_dim].to_vec(),
        })
    }

    /// All feature rows, row-major `[len, input_dim]`
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// All target rows, row-major `[len, target_dim]`
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn target_dim(&self) -> usize {
        self.target_dim
    }
}

// Lets the partition plug into anything written against Burn's
// Dataset trait; out-of-range reads become None there.
impl Dataset<Pair> for PairDataset {
    fn get(&self, index: usize) -> Option<Pair> {
        PairDataset::get(self, index).ok()
    }

    fn len(&self) -> usize {
        self.rows
    }
}
