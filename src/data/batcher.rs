// ============================================================
// Layer 4 — Pair Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<Pair> into
// two 2-D tensors:
//
//   Input:  N pairs, each with input_dim features and
//           target_dim targets
//   Output: PairBatch { inputs: [N, input_dim],
//                       targets: [N, target_dim] }
//
// Every row in a partition has the same widths, so stacking
// is a flatten followed by a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::Pair;

// ─── PairBatch ────────────────────────────────────────────────────────────────
/// A stacked batch of pairs. The first dimension is the batch size,
/// which for a full-batch loader is the whole partition.
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Shape: [batch_size, input_dim]
    pub inputs: Tensor<B, 2>,

    /// Shape: [batch_size, target_dim]
    pub targets: Tensor<B, 2>,
}

// ─── PairBatcher ──────────────────────────────────────────────────────────────
/// Holds the device so batches are created where the model runs.
#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Pair, PairBatch<B>> for PairBatcher<B> {
    /// Callers never pass an empty Vec: an empty partition
    /// produces no batches at all (see loader.rs).
    fn batch(&self, items: Vec<Pair>) -> PairBatch<B> {
        let batch_size = items.len();
        let input_dim  = items[0].features.len();
        let target_dim = items[0].targets.len();

        let input_flat: Vec<f32> = items
            .iter()
            .flat_map(|p| p.features.iter().copied())
            .collect();

        let target_flat: Vec<f32> = items
            .iter()
            .flat_map(|p| p.targets.iter().copied())
            .collect();

        let inputs = Tensor::<B, 1>::from_floats(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, input_dim]);

        let targets = Tensor::<B, 1>::from_floats(
            target_flat.as_slice(), &self.device
        ).reshape([batch_size, target_dim]);

        PairBatch { inputs, targets }
    }
}
