// ============================================================
// Layer 4 — Data Partitioner
// ============================================================
// Owns the raw dataset and turns it into three partitions:
//
//   RawDataset
//       │  permute(n)          one permutation from the source
//       ▼
//   shuffled RawDataset      full reorder, not a view
//       │  compute_ranges      split_policy.rs
//       ▼
//   train | val | test row ranges
//       │  split_columns       at input_dim
//       ▼
//   three PairDatasets  →  three full-batch LoaderDescriptors
//
// State machine:
//
//   Uninitialized ──setup()──▶ Ready ──repartition(p)──▶ Ready
//
// setup() runs once. Calling it again is an error, so a
// model built from train() can never silently disagree with
// the loaders. Re-partitioning is the explicit repartition(),
// which always reshuffles the ORIGINAL row order, so the same
// seed gives bit-identical partitions.
//
// Reference: Rust Book §6 (Enums), §9 (Error Handling)

use serde::{Deserialize, Serialize};

use crate::data::dataset::PairDataset;
use crate::data::loader::{DataModule, LoaderDescriptor};
use crate::data::permutation::SeededPermutation;
use crate::data::split_policy::{compute_ranges, validate_fractions, SplitRanges};
use crate::domain::error::PartitionError;
use crate::domain::partition::PartitionKind;
use crate::domain::raw_dataset::RawDataset;
use crate::domain::traits::PermutationSource;

// ─── PartitionConfig ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Fraction of rows for training
    pub train_pct: f64,

    /// Fraction of rows for validation; test gets the remainder
    pub val_pct: f64,

    /// Leading columns of each row that are features
    pub input_dim: usize,

    /// Parallel row fetch hint for the loaders (0 = sequential)
    pub num_workers: usize,

    /// Seed for the shuffle permutation
    pub seed: u64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            train_pct:   0.8,
            val_pct:     0.1,
            input_dim:   1,
            num_workers: 4,
            seed:        3,
        }
    }
}

impl PartitionConfig {
    pub fn validate(&self) -> Result<(), PartitionError> {
        validate_fractions(self.train_pct, self.val_pct)?;
        if self.input_dim == 0 {
            return Err(PartitionError::ShapeMismatch(
                "input_dim must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── State ───────────────────────────────────────────────────────────────────
#[derive(Debug)]
struct Partitions {
    shuffled:   RawDataset,
    ranges:     SplitRanges,
    train:      PairDataset,
    validation: PairDataset,
    test:       PairDataset,
}

impl Partitions {
    fn get(&self, kind: PartitionKind) -> &PairDataset {
        match kind {
            PartitionKind::Train      => &self.train,
            PartitionKind::Validation => &self.validation,
            PartitionKind::Test       => &self.test,
        }
    }
}

#[derive(Debug)]
enum PartitionState {
    Uninitialized,
    Ready(Partitions),
}

// ─── DataPartitioner ─────────────────────────────────────────────────────────
pub struct DataPartitioner<P: PermutationSource = SeededPermutation> {
    raw:         RawDataset,
    config:      PartitionConfig,
    permutation: P,
    state:       PartitionState,
}

impl DataPartitioner<SeededPermutation> {
    /// Partitioner shuffling with a StdRng seeded from `config.seed`.
    pub fn seeded(raw: RawDataset, config: PartitionConfig) -> Result<Self, PartitionError> {
        let permutation = SeededPermutation::new(config.seed);
        Self::new(raw, config, permutation)
    }
}

impl<P: PermutationSource> DataPartitioner<P> {
    pub fn new(raw: RawDataset, config: PartitionConfig, permutation: P) -> Result<Self, PartitionError> {
        config.validate()?;
        if config.input_dim >= raw.row_width() {
            return Err(PartitionError::ShapeMismatch(format!(
                "input_dim {} leaves no target columns in rows of width {}",
                config.input_dim,
                raw.row_width()
            )));
        }

        Ok(Self {
            raw,
            config,
            permutation,
            state: PartitionState::Uninitialized,
        })
    }

    /// Shuffle and split. Valid exactly once per partitioner.
    pub fn setup(&mut self) -> Result<(), PartitionError> {
        if self.is_ready() {
            return Err(PartitionError::AlreadySetUp);
        }
        self.state = PartitionState::Ready(self.build()?);
        Ok(())
    }

    /// Replace the permutation source and rebuild all three
    /// partitions from the original row order. Works in either state.
    pub fn repartition(&mut self, permutation: P) -> Result<(), PartitionError> {
        self.permutation = permutation;
        let partitions = self.build()?;
        tracing::info!("Repartitioned dataset; previous partitions discarded");
        self.state = PartitionState::Ready(partitions);
        Ok(())
    }

    fn build(&mut self) -> Result<Partitions, PartitionError> {
        let n = self.raw.len();
        let order    = self.permutation.permute(n);
        let shuffled = self.raw.reordered(&order)?;

        let ranges = compute_ranges(n, self.config.train_pct, self.config.val_pct)?;
        let input_dim  = self.config.input_dim;
        let target_dim = shuffled.row_width() - input_dim;

        let slice = |kind: PartitionKind| -> Result<PairDataset, PartitionError> {
            let (features, targets) = shuffled.split_columns(ranges.get(kind), input_dim)?;
            let dataset = PairDataset::new(features, input_dim, targets, target_dim)?;
            if dataset.is_empty() && n > 0 {
                tracing::debug!("{} partition is empty for {} rows", kind, n);
            }
            Ok(dataset)
        };

        let train      = slice(PartitionKind::Train)?;
        let validation = slice(PartitionKind::Validation)?;
        let test       = slice(PartitionKind::Test)?;

        tracing::info!(
            "Partitioned {} rows: {} train, {} val, {} test",
            n,
            train.len(),
            validation.len(),
            test.len(),
        );

        Ok(Partitions { shuffled, ranges, train, validation, test })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PartitionState::Ready(_))
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    fn ready(&self) -> Result<&Partitions, PartitionError> {
        match &self.state {
            PartitionState::Ready(p)      => Ok(p),
            PartitionState::Uninitialized => Err(PartitionError::Uninitialized),
        }
    }

    pub fn partition(&self, kind: PartitionKind) -> Result<&PairDataset, PartitionError> {
        Ok(self.ready()?.get(kind))
    }

    /// The training inputs/targets, needed to construct the model
    /// before the fit loop starts.
    pub fn train(&self) -> Result<&PairDataset, PartitionError> {
        self.partition(PartitionKind::Train)
    }

    pub fn ranges(&self) -> Result<&SplitRanges, PartitionError> {
        Ok(&self.ready()?.ranges)
    }

    /// The dataset in post-shuffle order
    pub fn shuffled(&self) -> Result<&RawDataset, PartitionError> {
        Ok(&self.ready()?.shuffled)
    }

    pub fn loader(&self, kind: PartitionKind) -> Result<LoaderDescriptor, PartitionError> {
        let dataset = self.partition(kind)?.clone();
        Ok(LoaderDescriptor::full_batch(kind, dataset, self.config.num_workers))
    }
}

impl<P: PermutationSource> DataModule for DataPartitioner<P> {
    fn train_loader(&self) -> Result<LoaderDescriptor, PartitionError> {
        self.loader(PartitionKind::Train)
    }

    fn val_loader(&self) -> Result<LoaderDescriptor, PartitionError> {
        self.loader(PartitionKind::Validation)
    }

    fn test_loader(&self) -> Result<LoaderDescriptor, PartitionError> {
        self.loader(PartitionKind::Test)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::FixedPermutation;
    use proptest::prelude::*;

    /// Rows [i, 100 + i, 200 + i]: every column identifies its row.
    fn tagged(rows: usize) -> RawDataset {
        let values = (0..rows)
            .flat_map(|i| {
                let i = i as f32;
                [i, 100.0 + i, 200.0 + i]
            })
            .collect();
        RawDataset::from_flat(values, 3).unwrap()
    }

    fn ready(rows: usize, seed: u64) -> DataPartitioner {
        let config = PartitionConfig { seed, ..PartitionConfig::default() };
        let mut p = DataPartitioner::seeded(tagged(rows), config).unwrap();
        p.setup().unwrap();
        p
    }

    #[test]
    fn test_accessors_fail_before_setup() {
        let p = DataPartitioner::seeded(tagged(10), PartitionConfig::default()).unwrap();
        assert!(!p.is_ready());
        assert_eq!(p.train_loader().unwrap_err(), PartitionError::Uninitialized);
        assert_eq!(p.val_loader().unwrap_err(),   PartitionError::Uninitialized);
        assert_eq!(p.test_loader().unwrap_err(),  PartitionError::Uninitialized);
        assert_eq!(p.train().unwrap_err(),        PartitionError::Uninitialized);
        assert!(p.ranges().is_err());
    }

    #[test]
    fn test_second_setup_is_rejected() {
        let mut p = ready(10, 1);
        assert_eq!(p.setup(), Err(PartitionError::AlreadySetUp));
        // State survives the rejected call
        assert_eq!(p.train().unwrap().len(), 8);
    }

    #[test]
    fn test_ten_rows_split() {
        let p = ready(10, 3);
        let r = p.ranges().unwrap();
        assert_eq!((r.train.clone(), r.validation.clone(), r.test.clone()), (0..8, 8..9, 9..10));
        assert_eq!(p.train_loader().unwrap().batch_size(), 8);
        assert_eq!(p.val_loader().unwrap().batch_size(),   1);
        assert_eq!(p.test_loader().unwrap().batch_size(),  1);
    }

    #[test]
    fn test_two_rows_tolerates_empty_partition() {
        let p = ready(2, 3);
        assert_eq!(p.train().unwrap().len(), 1);
        let val = p.val_loader().unwrap();
        assert_eq!(val.batch_size(), 0);
        assert_eq!(val.num_batches(), 0);
        assert_eq!(p.test_loader().unwrap().batch_size(), 1);
    }

    #[test]
    fn test_zero_rows() {
        let raw = RawDataset::from_flat(Vec::new(), 3).unwrap();
        let mut p = DataPartitioner::seeded(raw, PartitionConfig::default()).unwrap();
        p.setup().unwrap();
        for kind in PartitionKind::ALL {
            assert!(p.partition(kind).unwrap().is_empty());
        }
    }

    #[test]
    fn test_column_split_on_sinusoid_rows() {
        let raw = RawDataset::from_flat(
            vec![
                0.25,  1.0,  0.0,
                0.50,  0.0, -1.0,
                0.75, -1.0,  0.0,
            ],
            3,
        )
        .unwrap();
        let config = PartitionConfig { train_pct: 0.4, val_pct: 0.3, ..Default::default() };
        let mut p = DataPartitioner::new(raw.clone(), config, FixedPermutation(vec![2, 0, 1])).unwrap();
        p.setup().unwrap();

        // ranges: train [0,1), val [1,1), test [1,3)
        let train = p.train().unwrap().get(0).unwrap();
        assert_eq!(train.features, vec![0.75]);
        assert_eq!(train.targets,  vec![-1.0, 0.0]);

        let test = p.partition(PartitionKind::Test).unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(test.get(0).unwrap().features, vec![0.25]);
        assert_eq!(test.get(1).unwrap().targets,  vec![0.0, -1.0]);
    }

    #[test]
    fn test_two_feature_columns_keep_rows_together() {
        let config = PartitionConfig { input_dim: 2, seed: 9, ..Default::default() };
        let mut p = DataPartitioner::seeded(tagged(30), config).unwrap();
        p.setup().unwrap();

        let mut rows = 0;
        for kind in PartitionKind::ALL {
            let ds = p.partition(kind).unwrap();
            assert_eq!(ds.input_dim(), 2);
            assert_eq!(ds.target_dim(), 1);
            for i in 0..ds.len() {
                let pair = ds.get(i).unwrap();
                let x = pair.features[0];
                assert_eq!(pair.features, vec![x, 100.0 + x]);
                assert_eq!(pair.targets,  vec![200.0 + x]);
            }
            rows += ds.len();
        }
        assert_eq!(rows, 30);
    }

    #[test]
    fn test_input_dim_must_leave_targets() {
        let config = PartitionConfig { input_dim: 3, ..Default::default() };
        assert!(matches!(
            DataPartitioner::seeded(tagged(4), config),
            Err(PartitionError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_fractions_rejected_at_construction() {
        let config = PartitionConfig { train_pct: 0.8, val_pct: 0.3, ..Default::default() };
        assert!(matches!(
            DataPartitioner::seeded(tagged(4), config),
            Err(PartitionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_permutation_source_is_reported() {
        let mut p = DataPartitioner::new(
            tagged(3),
            PartitionConfig::default(),
            FixedPermutation(vec![0, 0, 1]),
        )
        .unwrap();
        assert!(matches!(p.setup(), Err(PartitionError::InvalidPermutation(_))));
        assert!(!p.is_ready());
    }

    #[test]
    fn test_out_of_range_permutation_index_is_reported() {
        let mut p = DataPartitioner::new(
            tagged(1),
            PartitionConfig::default(),
            FixedPermutation(vec![usize::MAX / 3]),
        )
        .unwrap();
        assert!(matches!(p.setup(), Err(PartitionError::InvalidPermutation(_))));
        assert!(!p.is_ready());
    }

    #[test]
    fn test_repartition_with_same_seed_is_identical() {
        let mut p = ready(40, 11);
        let before = p.shuffled().unwrap().clone();
        p.repartition(SeededPermutation::new(11)).unwrap();
        assert_eq!(p.shuffled().unwrap(), &before);

        p.repartition(SeededPermutation::new(12)).unwrap();
        assert_ne!(p.shuffled().unwrap(), &before);
        assert_eq!(p.train().unwrap().len(), 32);
    }

    #[test]
    fn test_same_seed_same_partitions() {
        let a = ready(25, 5);
        let b = ready(25, 5);
        for kind in PartitionKind::ALL {
            assert_eq!(a.partition(kind).unwrap().features(), b.partition(kind).unwrap().features());
            assert_eq!(a.partition(kind).unwrap().targets(),  b.partition(kind).unwrap().targets());
        }
    }

    proptest! {
        #[test]
        fn partitions_cover_every_row_once(rows in 0usize..200, seed in any::<u64>()) {
            let p = ready(rows, seed);
            let mut seen: Vec<f32> = PartitionKind::ALL
                .iter()
                .flat_map(|&k| p.partition(k).unwrap().features().to_vec())
                .collect();
            seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let expected: Vec<f32> = (0..rows).map(|i| i as f32).collect();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn pairs_come_from_one_raw_row(rows in 1usize..100, seed in any::<u64>()) {
            let p = ready(rows, seed);
            for kind in PartitionKind::ALL {
                let ds = p.partition(kind).unwrap();
                for i in 0..ds.len() {
                    let pair = ds.get(i).unwrap();
                    let x = pair.features[0];
                    prop_assert_eq!(pair.targets, vec![100.0 + x, 200.0 + x]);
                }
            }
        }

        #[test]
        fn loader_batch_size_matches_partition(rows in 0usize..100, seed in any::<u64>()) {
            let p = ready(rows, seed);
            for loader in [p.train_loader(), p.val_loader(), p.test_loader()] {
                let loader = loader.unwrap();
                prop_assert_eq!(loader.batch_size(), loader.dataset().len());
                prop_assert_eq!(loader.num_batches(), usize::from(loader.batch_size() > 0));
            }
        }
    }
}
