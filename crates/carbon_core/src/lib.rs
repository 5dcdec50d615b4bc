//! Core model types for the carbon reduction estimator
//!
//! Provides the shared feature vector, the two narrow model capabilities
//! consumed by scoring, tree-ensemble inference and artifact persistence.
//!
//! Modules:
//! - `features`: Feature vector and column ordering shared by train and serve
//! - `model`: `Regressor` and `AnomalyScorer` capabilities
//! - `tree`: Decision tree nodes and traversal
//! - `scaler`: Standard scaler
//! - `forest`: Random forest regressor inference
//! - `isolation`: Isolation forest decision scores
//! - `pipeline`: Scaler + forest regression bundle
//! - `serde_canon`: Canonical JSON and BLAKE3 model hashing
//! - `artifact`: Atomic artifact writes and verified loads

pub mod artifact;
pub mod errors;
pub mod features;
pub mod forest;
pub mod isolation;
pub mod model;
pub mod pipeline;
pub mod scaler;
pub mod serde_canon;
pub mod tree;

pub use artifact::{
    read_artifact, stage_artifact, write_artifact, Artifact, ArtifactError, ArtifactKind,
    ArtifactModel, StagedArtifact, ANOMALY_ARTIFACT_FILE, REGRESSION_ARTIFACT_FILE,
};
pub use errors::ModelError;
pub use features::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT, FEATURE_FIELDS, TARGET_COLUMN};
pub use forest::RandomForestRegressor;
pub use isolation::{average_path_length, IsolationForest};
pub use model::{AnomalyScorer, Regressor};
pub use pipeline::RegressionPipeline;
pub use scaler::StandardScaler;
pub use tree::{Node, Tree};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
