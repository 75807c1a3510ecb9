// ============================================================
// Layer 4 — Full-Batch Loader
// ============================================================
// A LoaderDescriptor binds one PairDataset to its loading
// settings. For a GP the batch is always the entire partition,
// so one epoch is exactly one batch:
//
//   partition rows = 8  → batch_size = 8, one batch
//   partition rows = 0  → batch_size = 0, zero batches
//
// num_workers only changes how the rows of that one batch
// are fetched (rayon par_iter when > 0). Rows are collected
// in index order either way, so batch contents never depend
// on it.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            rayon crate documentation

use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rayon::prelude::*;

use crate::data::batcher::{PairBatch, PairBatcher};
use crate::data::dataset::{Pair, PairDataset};
use crate::domain::error::PartitionError;
use crate::domain::partition::PartitionKind;

// ─── DataModule ───────────────────────────────────────────────────────────────
/// What a trainer needs from a data source: one loader per phase.
pub trait DataModule {
    fn train_loader(&self) -> Result<LoaderDescriptor, PartitionError>;
    fn val_loader(&self)   -> Result<LoaderDescriptor, PartitionError>;
    fn test_loader(&self)  -> Result<LoaderDescriptor, PartitionError>;
}

// ─── LoaderDescriptor ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct LoaderDescriptor {
    kind:        PartitionKind,
    dataset:     PairDataset,
    batch_size:  usize,
    num_workers: usize,
    shuffle:     bool,
}

impl LoaderDescriptor {
    /// One batch holding the whole partition.
    pub fn full_batch(kind: PartitionKind, dataset: PairDataset, num_workers: usize) -> Self {
        let batch_size = dataset.len();
        Self {
            kind,
            dataset,
            batch_size,
            num_workers,
            shuffle: false,
        }
    }

    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    pub fn dataset(&self) -> &PairDataset {
        &self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Always false; with one batch per epoch there is nothing to reorder.
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn num_batches(&self) -> usize {
        if self.batch_size == 0 {
            0
        } else {
            self.dataset.len().div_ceil(self.batch_size)
        }
    }

    /// Materialise this epoch's batches on `device`.
    pub fn batches<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Vec<PairBatch<B>>, PartitionError> {
        let batcher = PairBatcher::<B>::new(device.clone());
        let n = self.dataset.len();

        let mut batches = Vec::with_capacity(self.num_batches());
        for batch_idx in 0..self.num_batches() {
            let start = batch_idx * self.batch_size;
            let end   = (start + self.batch_size).min(n);
            let items = self.fetch_rows(start..end)?;
            batches.push(batcher.batch(items));
        }

        tracing::debug!(
            "{} loader: {} rows in {} batch(es)",
            self.kind,
            n,
            batches.len()
        );
        Ok(batches)
    }

    fn fetch_rows(&self, rows: std::ops::Range<usize>) -> Result<Vec<Pair>, PartitionError> {
        if self.num_workers > 0 && rows.len() > 1 {
            rows.into_par_iter().map(|i| self.dataset.get(i)).collect()
        } else {
            rows.map(|i| self.dataset.get(i)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn dataset(rows: usize) -> PairDataset {
        let features: Vec<f32> = (0..rows).map(|i| i as f32).collect();
        let targets:  Vec<f32> = (0..rows).flat_map(|i| [i as f32 * 10.0, -(i as f32)]).collect();
        PairDataset::new(features, 1, targets, 2).unwrap()
    }

    #[test]
    fn test_batch_size_is_partition_size() {
        let loader = LoaderDescriptor::full_batch(PartitionKind::Train, dataset(8), 4);
        assert_eq!(loader.batch_size(), 8);
        assert_eq!(loader.num_batches(), 1);
        assert_eq!(loader.num_workers(), 4);
        assert!(!loader.shuffle());
    }

    #[test]
    fn test_empty_partition_has_no_batches() {
        let loader = LoaderDescriptor::full_batch(PartitionKind::Validation, dataset(0), 4);
        assert_eq!(loader.batch_size(), 0);
        assert_eq!(loader.num_batches(), 0);
        let batches = loader.batches::<TestBackend>(&Default::default()).unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn test_workers_do_not_change_contents() {
        let device = Default::default();
        let serial   = LoaderDescriptor::full_batch(PartitionKind::Train, dataset(16), 0);
        let parallel = LoaderDescriptor::full_batch(PartitionKind::Train, dataset(16), 4);

        let a = serial.batches::<TestBackend>(&device).unwrap();
        let b = parallel.batches::<TestBackend>(&device).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);

        let a = a[0].targets.clone().into_data().to_vec::<f32>().unwrap();
        let b = b[0].targets.clone().into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_batch_holds_every_row() {
        let loader  = LoaderDescriptor::full_batch(PartitionKind::Test, dataset(5), 0);
        let batches = loader.batches::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(batches[0].batch_size(), 5);
        assert_eq!(batches[0].inputs.dims(), [5, 1]);
    }
}
