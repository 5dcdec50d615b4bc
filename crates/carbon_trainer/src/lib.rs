//! Carbon estimator trainer
//!
//! Offline, seeded training of the regression pipeline and the anomaly
//! model from a historical CSV dataset. The same dataset, parameters and
//! seed always produce the same models.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod ensemble;
pub mod errors;
pub mod isolation;
pub mod metrics;
pub mod trainer;

use std::path::Path;

pub use dataset::Dataset;
pub use errors::{DataError, TrainerError};
pub use metrics::RegressionMetrics;
pub use trainer::{
    ArtifactPaths, EstimatorTrainer, TrainedModels, TrainingParams, TrainingReport,
    TRAINING_REPORT_FILE,
};

/// Train both models directly from a CSV file using the provided parameters.
pub fn train_from_csv(path: &Path, params: TrainingParams) -> Result<TrainedModels, TrainerError> {
    let dataset = Dataset::from_csv(path)?;
    EstimatorTrainer::new(params).train(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
