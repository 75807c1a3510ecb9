// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `fit`, `split` and `evaluate`
// and all their configurable flags.
//
// Every fit/split flag is optional. Precedence, lowest to highest:
//   built-in defaults → --config <file.json> → explicit flags
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::experiment_use_case::ExperimentConfig;

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, partition, tune, fit and test the GP
    Fit(FitArgs),

    /// Generate and partition only; print what each loader serves
    Split(SplitArgs),

    /// Score a saved checkpoint on its test partition
    Evaluate(EvaluateArgs),
}

/// Sinusoid generation flags, shared by both commands
#[derive(Args, Debug, Default)]
pub struct DataArgs {
    /// Points on the linspace before subsetting
    #[arg(long)]
    pub samples: Option<usize>,

    /// Std-dev of the Gaussian noise on the targets
    #[arg(long)]
    pub noise_scale: Option<f64>,

    /// Rows kept after shuffling (0 keeps all)
    #[arg(long)]
    pub subset: Option<usize>,

    /// Seed for noise and row shuffling
    #[arg(long)]
    pub data_seed: Option<u64>,
}

/// Partitioning flags, shared by both commands
#[derive(Args, Debug, Default)]
pub struct PartitionArgs {
    /// Fraction of rows used for training
    #[arg(long)]
    pub train_pct: Option<f64>,

    /// Fraction of rows used for validation; test gets the rest
    #[arg(long)]
    pub val_pct: Option<f64>,

    /// Leading columns of each row that are features
    #[arg(long)]
    pub input_dim: Option<usize>,

    /// Parallel row fetch in the loaders (0 = sequential)
    #[arg(long)]
    pub num_workers: Option<usize>,

    /// Seed for the partition shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

/// All arguments for the `fit` command.
#[derive(Args, Debug, Default)]
pub struct FitArgs {
    /// JSON experiment config to start from
    #[arg(long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub partition: PartitionArgs,

    #[arg(long)]
    pub max_epochs: Option<usize>,

    /// Adam step size (ignored when --auto-lr-find picks one)
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Run the learning-rate range test before fitting (true/false)
    #[arg(long)]
    pub auto_lr_find: Option<bool>,

    /// Run a single smoke-test epoch and write nothing to disk
    #[arg(long)]
    pub fast_dev_run: Option<usize>,

    /// Directory for checkpoints, experiment_config.json and metrics.csv
    #[arg(long)]
    pub checkpoint_dir: Option<String>,
}

/// All arguments for the `split` command
#[derive(Args, Debug, Default)]
pub struct SplitArgs {
    /// JSON experiment config to start from
    #[arg(long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub partition: PartitionArgs,

    /// Re-partition the same table with this seed too (repeatable)
    #[arg(long = "reseed")]
    pub reseeds: Vec<u64>,
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory written by `fit --checkpoint-dir`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

fn base_config(path: Option<&str>) -> Result<ExperimentConfig> {
    match path {
        Some(p) => ExperimentConfig::from_json_file(p),
        None    => Ok(ExperimentConfig::default()),
    }
}

impl DataArgs {
    fn apply(&self, cfg: &mut ExperimentConfig) {
        if let Some(v) = self.samples     { cfg.data.samples = v; }
        if let Some(v) = self.noise_scale { cfg.data.noise_scale = v; }
        if let Some(v) = self.subset      { cfg.data.subset = v; }
        if let Some(v) = self.data_seed   { cfg.data.seed = v; }
    }
}

impl PartitionArgs {
    fn apply(&self, cfg: &mut ExperimentConfig) {
        if let Some(v) = self.train_pct   { cfg.partition.train_pct = v; }
        if let Some(v) = self.val_pct     { cfg.partition.val_pct = v; }
        if let Some(v) = self.input_dim   { cfg.partition.input_dim = v; }
        if let Some(v) = self.num_workers { cfg.partition.num_workers = v; }
        if let Some(v) = self.seed        { cfg.partition.seed = v; }
    }
}

impl FitArgs {
    /// Convert CLI args into the application-layer config.
    /// The application layer never sees clap types.
    pub fn into_config(self) -> Result<ExperimentConfig> {
        let mut cfg = base_config(self.config.as_deref())?;
        self.data.apply(&mut cfg);
        self.partition.apply(&mut cfg);

        if let Some(v) = self.max_epochs    { cfg.trainer.max_epochs = v; }
        if let Some(v) = self.learning_rate { cfg.trainer.learning_rate = v; }
        if let Some(v) = self.auto_lr_find  { cfg.trainer.auto_lr_find = v; }
        if let Some(v) = self.fast_dev_run  { cfg.trainer.fast_dev_run = v; }
        if self.checkpoint_dir.is_some()    { cfg.trainer.checkpoint_dir = self.checkpoint_dir; }
        Ok(cfg)
    }
}

impl SplitArgs {
    pub fn into_config(&self) -> Result<ExperimentConfig> {
        let mut cfg = base_config(self.config.as_deref())?;
        self.data.apply(&mut cfg);
        self.partition.apply(&mut cfg);
        Ok(cfg)
    }
}
