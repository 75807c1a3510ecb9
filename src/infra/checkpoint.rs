// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores GP hyperparameters as JSON.
//
// What gets saved:
//   1. model_epoch_{n}.json    — GpState after epoch n
//   2. latest_epoch.json       — which epoch was last saved
//   3. experiment_config.json  — the full run configuration
//
// The training rows are not stored: an exact GP is rebuilt
// from its state plus the train partition, which the saved
// config (seed, fractions) reproduces bit for bit.
//
// File layout:
//   checkpoints/
//     model_epoch_1.json
//     model_epoch_2.json
//     ...
//     latest_epoch.json
//     experiment_config.json
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::application::experiment_use_case::ExperimentConfig;
use crate::ml::model::GpState;

/// Manages checkpoint files in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the model state for `epoch` and point latest_epoch.json at it.
    pub fn save_model(&self, state: &GpState, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}.json"));
        fs::write(&path, serde_json::to_string_pretty(state)?)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the state saved by the latest epoch.
    pub fn load_model(&self) -> Result<GpState> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}.json"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_config(&self, cfg: &ExperimentConfig) -> Result<()> {
        let path = self.dir.join("experiment_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved experiment config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<ExperimentConfig> {
        let path = self.dir.join("experiment_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json. Fails if nothing has been saved yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Has a fit run saved a checkpoint?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
