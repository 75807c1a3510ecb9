// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per fit epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: negative marginal log-likelihood per row
//   - val_mse:    mean squared error on the validation partition
//   - val_nlpd:   mean negative log predictive density on validation
//
// An empty validation partition has nothing to score, so
// its columns are written as NaN.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,val_mse,val_nlpd
//   1,1.312500,0.402100,1.150300
//   2,1.190100,0.354300,1.080200
//   ...

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const CSV_HEADER: &str = "epoch,train_loss,val_mse,val_nlpd";

/// One row of metrics data for a single fit epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average training loss over the epoch's batches
    pub train_loss: f64,

    /// Validation MSE, NaN when the partition is empty
    pub val_mse: f64,

    /// Validation NLPD, NaN when the partition is empty
    pub val_nlpd: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_mse: f64, val_nlpd: f64) -> Self {
        Self { epoch, train_loss, val_mse, val_nlpd }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_mse, m.val_nlpd,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_mse={:.4}",
            m.epoch,
            m.train_loss,
            m.val_mse,
        );
        Ok(())
    }
}
