// ============================================================
// Layer 2 — ExperimentUseCase
// ============================================================
// Runs the full experiment in order:
//
//   Step 1: Generate the sinusoid table       (Layer 4 - data)
//   Step 2: Partition it (setup, once)        (Layer 4 - data)
//   Step 3: Build the GP from the train rows  (Layer 5 - ml)
//   Step 4: Save config                       (Layer 6 - infra)
//   Step 5: tune → fit → test                 (Layer 5 - ml)
//
// The GP is conditioned on its training rows from the moment
// it is constructed, so step 3 must read the same train
// partition that train_loader() later serves. Partitioning
// exactly once (step 2) guarantees that.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::partitioner::{DataPartitioner, PartitionConfig};
use crate::data::synthetic::{SinusoidConfig, SinusoidGenerator};
use crate::domain::traits::RawDataSupplier;
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{EvalMetrics, ExactGpModel, GpConfig};
use crate::ml::trainer::{Trainer, TrainerConfig};

// ─── Experiment Configuration ────────────────────────────────────────────────
// Built once (from CLI flags or a JSON file) and passed down
// by reference; no component reads configuration from anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub data:      SinusoidConfig,
    pub partition: PartitionConfig,
    pub trainer:   TrainerConfig,
    pub model:     GpConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data:      SinusoidConfig::default(),
            partition: PartitionConfig::default(),
            trainer:   TrainerConfig::default(),
            model:     GpConfig::new(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{path}'"))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Config file '{path}' is not a valid experiment config"))
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    /// Rows in train / val / test
    pub partition_sizes: (usize, usize, usize),
    pub learning_rate:   f64,
    pub history:         Vec<EpochMetrics>,
    pub test:            Option<EvalMetrics>,
}

// ─── ExperimentUseCase ───────────────────────────────────────────────────────
pub struct ExperimentUseCase {
    config: ExperimentConfig,
}

impl ExperimentUseCase {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ExperimentReport> {
        let cfg = &self.config;

        // ── Step 1: Generate data ────────────────────────────────────────────
        let raw = SinusoidGenerator::new(cfg.data.clone()).supply()?;

        // ── Step 2: Partition ────────────────────────────────────────────────
        let mut partitioner = DataPartitioner::seeded(raw, cfg.partition.clone())
            .context("Invalid partition configuration")?;
        partitioner.setup()?;
        let partition_sizes = partitioner.ranges()?.sizes();

        // ── Step 3: Model from the exact training rows ───────────────────────
        let train = partitioner.train()?;
        let mut model = ExactGpModel::new(
            train.features(),
            train.targets(),
            train.input_dim(),
            train.target_dim(),
            &cfg.model,
        )?;

        // ── Step 4: Save config next to the checkpoints ──────────────────────
        let mut trainer = Trainer::new(cfg.trainer.clone())?;
        if let Some(ckpt) = trainer.checkpoints() {
            ckpt.save_config(cfg)?;
        }

        // ── Step 5: tune → fit → test ────────────────────────────────────────
        trainer.tune(&model, &partitioner)?;
        let history = trainer.fit(&mut model, &partitioner)?;
        let test    = trainer.test(&model, &partitioner)?;

        Ok(ExperimentReport {
            partition_sizes,
            learning_rate: trainer.learning_rate(),
            history,
            test,
        })
    }
}
