// ============================================================
// Layer 5 — Trainer (tune / fit / test)
// ============================================================
// Drives the GP through three phases against any DataModule:
//
//   tune → optional learning-rate range test on train_loader()
//   fit  → max_epochs × (train_loader() step, val_loader() score)
//   test → test_loader() score
//
// All loaders are full-batch, so an epoch is a single Adam
// step on the whole train partition. Empty partitions give
// loaders with no batches; the phases just skip them.
//
// Reference: Burn Book §5 (Training)
//            Smith (2017) Cyclical Learning Rates (LR range test)

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::loader::{DataModule, LoaderDescriptor};
use crate::domain::error::PartitionError;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{EvalMetrics, ExactGpModel, RegressionBatch};

pub type GpBackend = burn::backend::NdArray;

/// Learning rates tried by the range test, log-spaced over [1e-3, 1]
const LR_FIND_CANDIDATES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub max_epochs: usize,

    pub learning_rate: f64,

    /// Run the learning-rate range test during tune()
    pub auto_lr_find: bool,

    /// Optimiser steps per candidate in the range test
    pub lr_find_steps: usize,

    /// Abort fit() on a NaN / infinite training loss
    pub terminate_on_nan: bool,

    /// > 0: a single smoke-test epoch, nothing written to disk
    pub fast_dev_run: usize,

    /// Where checkpoints and metrics.csv go; None disables both
    pub checkpoint_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_epochs:       50,
            learning_rate:    0.832,
            auto_lr_find:     false,
            lr_find_steps:    20,
            terminate_on_nan: true,
            fast_dev_run:     0,
            checkpoint_dir:   None,
        }
    }
}

pub struct Trainer {
    config:        TrainerConfig,
    learning_rate: f64,
    device:        <GpBackend as Backend>::Device,
    checkpoints:   Option<CheckpointManager>,
    metrics:       Option<MetricsLogger>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        let (checkpoints, metrics) = match (&config.checkpoint_dir, config.fast_dev_run) {
            (Some(dir), 0) => (
                Some(CheckpointManager::new(dir)?),
                Some(MetricsLogger::new(dir)?),
            ),
            _ => (None, None),
        };

        Ok(Self {
            learning_rate: config.learning_rate,
            config,
            device: Default::default(),
            checkpoints,
            metrics,
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn checkpoints(&self) -> Option<&CheckpointManager> {
        self.checkpoints.as_ref()
    }

    fn load(&self, loader: Result<LoaderDescriptor, PartitionError>) -> Result<Vec<RegressionBatch>> {
        let loader = loader.context("Data module is not ready")?;
        let mut batches: Vec<RegressionBatch> = loader
            .batches::<GpBackend>(&self.device)?
            .into_iter()
            .map(RegressionBatch::from_pair_batch)
            .collect::<Result<_>>()?;

        if self.config.fast_dev_run > 0 {
            batches.truncate(self.config.fast_dev_run);
        }
        Ok(batches)
    }

    /// Learning-rate range test. Each candidate trains a throwaway
    /// copy of the model; the one ending on the lowest finite loss wins.
    pub fn tune<D: DataModule>(&mut self, model: &ExactGpModel, data: &D) -> Result<f64> {
        if !self.config.auto_lr_find {
            tracing::info!("Tuning skipped; learning rate stays at {}", self.learning_rate);
            return Ok(self.learning_rate);
        }

        let train = self.load(data.train_loader())?;
        if train.is_empty() {
            tracing::warn!("Train partition is empty; cannot search for a learning rate");
            return Ok(self.learning_rate);
        }

        let steps = self.config.lr_find_steps;
        let best = pick_learning_rate(lr_candidates(), |lr| {
            let mut trial = model.clone();
            for _ in 0..steps {
                for batch in &train {
                    trial.training_step(batch, lr)?;
                }
            }
            let total = train
                .iter()
                .map(|b| trial.loss_and_grad(b).map(|(l, _)| l))
                .sum::<Result<f64>>()?;
            Ok(total / train.len() as f64)
        });

        match best {
            Some((lr, loss)) => {
                tracing::info!("lr_find picked learning rate {:.4e} (loss {:.4})", lr, loss);
                self.learning_rate = lr;
            }
            None => tracing::warn!("lr_find found no finite loss; keeping {}", self.learning_rate),
        }
        Ok(self.learning_rate)
    }

    pub fn fit<D: DataModule>(&mut self, model: &mut ExactGpModel, data: &D) -> Result<Vec<EpochMetrics>> {
        let train = self.load(data.train_loader())?;
        let val   = self.load(data.val_loader())?;

        let epochs = if self.config.fast_dev_run > 0 { 1 } else { self.config.max_epochs };
        tracing::info!(
            "Fitting for {} epoch(s) at lr={} ({} train batch, {} val batch)",
            epochs,
            self.learning_rate,
            train.len(),
            val.len()
        );

        let mut history = Vec::with_capacity(epochs);
        for epoch in 1..=epochs {
            let mut loss_sum = 0.0;
            for batch in &train {
                let loss = model.training_step(batch, self.learning_rate)?;
                if !loss.is_finite() && self.config.terminate_on_nan {
                    bail!("Training loss became {} at epoch {}", loss, epoch);
                }
                loss_sum += loss;
            }
            let train_loss = if train.is_empty() { f64::NAN } else { loss_sum / train.len() as f64 };

            let scores = evaluate_batches(model, &val)?;
            let m = EpochMetrics::new(
                epoch,
                train_loss,
                scores.map_or(f64::NAN, |s| s.mse),
                scores.map_or(f64::NAN, |s| s.nlpd),
            );

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_mse={:.4} | val_nlpd={:.4}",
                epoch, epochs, m.train_loss, m.val_mse, m.val_nlpd,
            );

            if let Some(logger) = &self.metrics {
                logger.log(&m)?;
            }
            if let Some(ckpt) = &self.checkpoints {
                ckpt.save_model(&model.state(), epoch)?;
            }
            history.push(m);
        }

        tracing::info!("Fit complete");
        Ok(history)
    }

    /// Scores on the test partition; None when it is empty.
    pub fn test<D: DataModule>(&self, model: &ExactGpModel, data: &D) -> Result<Option<EvalMetrics>> {
        let test = self.load(data.test_loader())?;
        let scores = evaluate_batches(model, &test)?;
        match &scores {
            Some(s) => tracing::info!("Test | rows={} | mse={:.4} | nlpd={:.4}", s.rows, s.mse, s.nlpd),
            None    => tracing::warn!("Test partition is empty; nothing to score"),
        }
        Ok(scores)
    }
}

/// Log-spaced over [1e-3, 1], smallest first.
fn lr_candidates() -> impl Iterator<Item = f64> {
    (0..LR_FIND_CANDIDATES).map(|k| {
        let exponent = -3.0 + 3.0 * k as f64 / (LR_FIND_CANDIDATES - 1) as f64;
        10f64.powf(exponent)
    })
}

/// The candidate with the lowest finite final loss. A candidate whose
/// run fails (e.g. the kernel stops being positive definite) is skipped.
fn pick_learning_rate(
    candidates:     impl IntoIterator<Item = f64>,
    mut final_loss: impl FnMut(f64) -> Result<f64>,
) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for lr in candidates {
        match final_loss(lr) {
            Ok(loss) => {
                tracing::debug!("lr_find: lr={:.4e} loss={:.4}", lr, loss);
                if loss.is_finite() && best.map_or(true, |(_, b)| loss < b) {
                    best = Some((lr, loss));
                }
            }
            Err(e) => tracing::warn!("lr_find: skipping lr={:.4e}: {:#}", lr, e),
        }
    }
    best
}

/// Row-weighted average of per-batch scores.
fn evaluate_batches(model: &ExactGpModel, batches: &[RegressionBatch]) -> Result<Option<EvalMetrics>> {
    let mut rows = 0usize;
    let mut mse  = 0.0;
    let mut nlpd = 0.0;
    for batch in batches.iter().filter(|b| b.rows > 0) {
        let s = model.evaluate(batch)?;
        rows += s.rows;
        mse  += s.mse  * s.rows as f64;
        nlpd += s.nlpd * s.rows as f64;
    }
    if rows == 0 {
        return Ok(None);
    }
    Ok(Some(EvalMetrics {
        mse:  mse  / rows as f64,
        nlpd: nlpd / rows as f64,
        rows,
    }))
}
