// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `fit`      — full tune / fit / test run on the sinusoid
//   2. `split`    — partition only, prints the loader layout
//   3. `evaluate` — re-scores a saved checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, FitArgs, SplitArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "sinusoid-gp",
    version = "0.1.0",
    about = "Fit an exact Gaussian Process to a noisy sinusoid with reproducible train/val/test splits."
)]
pub struct Cli {
    /// The subcommand to run (fit, split or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Fit(args)      => run_fit(args),
            Commands::Split(args)    => run_split(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_fit(args: FitArgs) -> Result<()> {
    use crate::application::experiment_use_case::ExperimentUseCase;

    let config = args.into_config()?;
    tracing::info!(
        "Starting experiment: {} epochs, train_pct={}, val_pct={}",
        config.trainer.max_epochs,
        config.partition.train_pct,
        config.partition.val_pct,
    );

    let report = ExperimentUseCase::new(config).execute()?;

    let (train, val, test) = report.partition_sizes;
    println!("Partitions: train={train} val={val} test={test}");
    println!("Learning rate: {:.4}", report.learning_rate);
    if let Some(last) = report.history.last() {
        println!(
            "Final epoch {}: train_loss={:.4} val_mse={:.4} val_nlpd={:.4}",
            last.epoch, last.train_loss, last.val_mse, last.val_nlpd
        );
    }
    match report.test {
        Some(m) => println!("Test: mse={:.4} nlpd={:.4} over {} rows", m.mse, m.nlpd, m.rows),
        None    => println!("Test: partition is empty"),
    }
    Ok(())
}

fn run_split(args: SplitArgs) -> Result<()> {
    use crate::application::split_use_case::SplitUseCase;

    let config = args.into_config()?;
    let summaries = SplitUseCase::new(config.data, config.partition)
        .with_reseeds(args.reseeds)
        .execute()?;
    for summary in summaries {
        print!("{summary}");
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(&args.checkpoint_dir)?.execute()?;
    match report.test {
        Some(m) => println!(
            "Epoch {} checkpoint, test: mse={:.4} nlpd={:.4} over {} rows",
            report.epoch, m.mse, m.nlpd, m.rows
        ),
        None => println!("Epoch {} checkpoint, test partition is empty", report.epoch),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fit_flags() {
        let cli = Cli::try_parse_from([
            "sinusoid-gp", "fit", "--train-pct", "0.7", "--val-pct", "0.2", "--max-epochs", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Fit(args) => {
                let cfg = args.into_config().unwrap();
                assert_eq!(cfg.partition.train_pct, 0.7);
                assert_eq!(cfg.partition.val_pct, 0.2);
                assert_eq!(cfg.trainer.max_epochs, 3);
            }
            other => panic!("expected fit, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_lr_find_switch() {
        let cli = Cli::try_parse_from(["sinusoid-gp", "fit", "--auto-lr-find", "false"]).unwrap();
        match cli.command {
            Commands::Fit(args) => assert_eq!(args.auto_lr_find, Some(false)),
            other => panic!("expected fit, got {other:?}"),
        }
    }

    #[test]
    fn test_split_runs() {
        let cli = Cli::try_parse_from([
            "sinusoid-gp", "split", "--subset", "20", "--reseed", "4", "--reseed", "5",
        ])
        .unwrap();
        cli.run().unwrap();
    }

    #[test]
    fn test_fit_then_evaluate() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = dir.path().to_string_lossy().into_owned();

        Cli::try_parse_from([
            "sinusoid-gp", "fit", "--max-epochs", "2", "--learning-rate", "0.05",
            "--checkpoint-dir", ckpt.as_str(),
        ])
        .unwrap()
        .run()
        .unwrap();

        Cli::try_parse_from(["sinusoid-gp", "evaluate", "--checkpoint-dir", ckpt.as_str()])
            .unwrap()
            .run()
            .unwrap();
    }
}
