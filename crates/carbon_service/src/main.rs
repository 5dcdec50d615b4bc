//! Carbon estimator scoring CLI
//!
//! Loads both model artifacts once, then scores a JSON request object or
//! array read from a file or stdin. Each result is written to stdout as
//! one JSON line; a malformed request yields an error line and does not
//! stop the remaining requests.

use anyhow::{Context, Result};
use carbon_service::{Assessment, ScoredResult, ScoringService, ServiceConfig};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "carbon-score")]
#[command(author = "Carbon Estimator Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Score carbon reduction projects with trained models", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Regression artifact path (overrides configuration)
    #[arg(long)]
    regression: Option<PathBuf>,

    /// Anomaly artifact path (overrides configuration)
    #[arg(long)]
    anomaly: Option<PathBuf>,

    /// JSON input file with a request object or array; stdin if omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Append the credit/flag decision to each result
    #[arg(long)]
    assess: bool,
}

#[derive(Serialize)]
struct OutputLine<'a> {
    #[serde(flatten)]
    result: &'a ScoredResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    assessment: Option<Assessment>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    info!("Carbon Estimator Scoring v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = args.regression {
        config.regression_artifact = path;
    }
    if let Some(path) = args.anomaly {
        config.anomaly_artifact = path;
    }
    let policy = config.policy()?;

    let service = ScoringService::new();
    service.load_from_config(&config).map_err(|e| {
        error!("Refusing to serve without both models: {}", e);
        e
    })?;

    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let input: Value = serde_json::from_str(&raw).context("Input is not valid JSON")?;
    let items = match input {
        Value::Array(items) => items,
        other => vec![other],
    };

    let outcomes = service.score_json_batch(&items);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut failures = 0usize;

    for outcome in &outcomes {
        match outcome {
            Ok(result) => {
                let line = OutputLine {
                    result,
                    assessment: args.assess.then(|| policy.assess(result)),
                };
                serde_json::to_writer(&mut out, &line)?;
            }
            Err(e) => {
                failures += 1;
                warn!("Request rejected: {}", e);
                serde_json::to_writer(&mut out, &serde_json::json!({ "error": e.to_string() }))?;
            }
        }
        writeln!(out)?;
    }
    out.flush()?;

    info!(
        scored = outcomes.len() - failures,
        rejected = failures,
        "Scoring complete"
    );
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
