// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Scores a saved run on its test partition without training:
//   1. Load experiment_config.json and the latest GpState
//   2. Regenerate the data and re-partition it with the saved
//      seed (same seed → same partitions, bit for bit)
//   3. Rebuild the GP from the state plus the train partition
//   4. Run the trainer's test phase

use anyhow::{ensure, Result};
use serde::Serialize;
use std::path::Path;

use crate::application::experiment_use_case::ExperimentConfig;
use crate::data::partitioner::DataPartitioner;
use crate::data::synthetic::SinusoidGenerator;
use crate::domain::traits::RawDataSupplier;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{EvalMetrics, ExactGpModel, GpState};
use crate::ml::trainer::{Trainer, TrainerConfig};

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub epoch: usize,
    pub test:  Option<EvalMetrics>,
}

pub struct EvaluateUseCase {
    config: ExperimentConfig,
    state:  GpState,
    epoch:  usize,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        ensure!(
            Path::new(checkpoint_dir).is_dir(),
            "No checkpoint directory at '{checkpoint_dir}'. Run `fit --checkpoint-dir` first."
        );
        let ckpt = CheckpointManager::new(checkpoint_dir)?;
        tracing::info!("Evaluating checkpoint in '{}'", ckpt.dir().display());

        let config = ckpt.load_config()?;
        let epoch  = ckpt.latest_epoch()?;
        let state  = ckpt.load_model()?;
        Ok(Self { config, state, epoch })
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let cfg = &self.config;

        let raw = SinusoidGenerator::new(cfg.data.clone()).supply()?;
        let mut partitioner = DataPartitioner::seeded(raw, cfg.partition.clone())?;
        partitioner.setup()?;

        let train = partitioner.train()?;
        let model = ExactGpModel::from_state(self.state.clone(), train.features(), train.targets())?;

        // Nothing is written while evaluating
        let trainer = Trainer::new(TrainerConfig { checkpoint_dir: None, ..cfg.trainer.clone() })?;
        let test = trainer.test(&model, &partitioner)?;

        Ok(EvaluationReport { epoch: self.epoch, test })
    }
}
