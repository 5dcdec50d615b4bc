//! Carbon estimator trainer CLI
//!
//! Trains the regression and anomaly models from a CSV dataset and writes
//! both artifacts plus a training report to the output directory.

use anyhow::{Context, Result};
use carbon_trainer::{Dataset, EstimatorTrainer, TrainingParams};
use carbon_core::FEATURE_COLUMNS;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "carbon-train")]
#[command(author = "Carbon Estimator Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Seeded trainer for the carbon reduction estimator", long_about = None)]
struct Args {
    /// Input CSV dataset path (header row with named columns)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for model artifacts and training report
    #[arg(short, long, default_value = "models")]
    output: PathBuf,

    /// Number of regression trees
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Maximum regression tree depth (unlimited if omitted)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples required to split a node
    #[arg(long, default_value = "2")]
    min_samples_split: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "1")]
    min_samples_leaf: usize,

    /// Number of isolation trees
    #[arg(long, default_value = "100")]
    anomaly_trees: usize,

    /// Per-tree subsample cap for the isolation forest
    #[arg(long, default_value = "256")]
    max_samples: usize,

    /// Expected outlier share of the training data
    #[arg(long, default_value = "0.1")]
    contamination: f64,

    /// Held-out fraction for evaluation
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Random seed for splitting, bootstrapping and subsampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Persist a regression model refitted on all rows
    #[arg(long)]
    full_fit: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Carbon Estimator Trainer v{}", env!("CARGO_PKG_VERSION"));

    info!("Loading dataset from: {}", args.input.display());
    let dataset = Dataset::from_csv(&args.input).context("Failed to load dataset")?;
    info!("Loaded {} rows", dataset.len());

    for ((min, max), name) in dataset.feature_stats().iter().zip(FEATURE_COLUMNS) {
        info!("  {}: min={}, max={}", name, min, max);
    }

    let params = TrainingParams {
        n_estimators: args.trees,
        max_depth: args.max_depth,
        min_samples_split: args.min_samples_split,
        min_samples_leaf: args.min_samples_leaf,
        anomaly_estimators: args.anomaly_trees,
        max_samples: args.max_samples,
        contamination: args.contamination,
        test_size: args.test_size,
        seed: args.seed,
        persist_full_fit: args.full_fit,
    };

    info!("Starting training...");
    let models = EstimatorTrainer::new(params).train(&dataset)?;

    let metrics = models.report.metrics;
    info!("Held-out evaluation:");
    info!("  MAE : {:.6}", metrics.mae);
    info!("  RMSE: {:.6}", metrics.rmse);
    info!("  R²  : {:.6}", metrics.r2);

    let paths = models
        .write_artifacts(&args.output)
        .context("Failed to write artifacts")?;

    info!("Training completed successfully");
    info!(
        "  Regression model: {} ({})",
        paths.regression.display(),
        models.report.regression_hash
    );
    info!(
        "  Anomaly model: {} ({})",
        paths.anomaly.display(),
        models.report.anomaly_hash
    );
    info!("  Report: {}", paths.report.display());

    Ok(())
}
