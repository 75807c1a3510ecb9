// ============================================================
// Layer 2 — SplitUseCase
// ============================================================
// Generates the dataset, partitions it, and reports what each
// loader would serve, without building a model.
//
// Extra seeds re-partition the SAME generated table, so the
// summaries differ only in row order, never in sizes.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

use crate::data::partitioner::{DataPartitioner, PartitionConfig};
use crate::data::permutation::SeededPermutation;
use crate::data::synthetic::{SinusoidConfig, SinusoidGenerator};
use crate::domain::partition::PartitionKind;
use crate::domain::traits::RawDataSupplier;

/// Shuffled rows whose x value is shown in the summary
const LEADING_ROWS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub kind:        PartitionKind,
    pub range:       Range<usize>,
    pub rows:        usize,
    pub batch_size:  usize,
    pub num_batches: usize,
    pub num_workers: usize,
    pub shuffle:     bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub seed:       u64,
    pub total_rows: usize,
    pub row_width:  usize,
    /// First column of the first few shuffled rows
    pub leading_x:  Vec<f32>,
    pub partitions: Vec<PartitionSummary>,
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seed {}: {} rows of width {}, leading x {:?}",
            self.seed, self.total_rows, self.row_width, self.leading_x
        )?;
        for p in &self.partitions {
            writeln!(
                f,
                "  {:<5} rows [{:>3}, {:>3})  batch_size={:<3} batches={} workers={} shuffle={}",
                p.kind.as_str(),
                p.range.start,
                p.range.end,
                p.batch_size,
                p.num_batches,
                p.num_workers,
                p.shuffle,
            )?;
        }
        Ok(())
    }
}

pub struct SplitUseCase {
    data:      SinusoidConfig,
    partition: PartitionConfig,
    reseeds:   Vec<u64>,
}

impl SplitUseCase {
    pub fn new(data: SinusoidConfig, partition: PartitionConfig) -> Self {
        Self { data, partition, reseeds: Vec::new() }
    }

    /// Also summarise a repartition of the same table under each seed.
    pub fn with_reseeds(mut self, seeds: Vec<u64>) -> Self {
        self.reseeds = seeds;
        self
    }

    /// One summary for the configured seed, then one per extra seed.
    pub fn execute(&self) -> Result<Vec<SplitSummary>> {
        let raw = SinusoidGenerator::new(self.data.clone()).supply()?;

        let mut partitioner = DataPartitioner::seeded(raw, self.partition.clone())?;
        partitioner.setup()?;

        let mut summaries = vec![summarise(&partitioner, partitioner.config().seed)?];
        for &seed in &self.reseeds {
            partitioner.repartition(SeededPermutation::new(seed))?;
            summaries.push(summarise(&partitioner, seed)?);
        }
        Ok(summaries)
    }
}

fn summarise(partitioner: &DataPartitioner, seed: u64) -> Result<SplitSummary> {
    let ranges   = partitioner.ranges()?;
    let shuffled = partitioner.shuffled()?;

    let leading_x = (0..shuffled.len().min(LEADING_ROWS))
        .filter_map(|i| shuffled.row(i).map(|r| r[0]))
        .collect();

    let partitions = PartitionKind::ALL
        .iter()
        .map(|&kind| {
            let l = partitioner.loader(kind)?;
            Ok(PartitionSummary {
                kind,
                range:       ranges.get(kind),
                rows:        l.dataset().len(),
                batch_size:  l.batch_size(),
                num_batches: l.num_batches(),
                num_workers: l.num_workers(),
                shuffle:     l.shuffle(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SplitSummary {
        seed,
        total_rows: ranges.total(),
        row_width:  shuffled.row_width(),
        leading_x,
        partitions,
    })
}
