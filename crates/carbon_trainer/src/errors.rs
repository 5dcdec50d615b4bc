use carbon_core::{ArtifactError, ModelError};
use std::path::PathBuf;
use thiserror::Error;

/// Malformed or missing training data. Fatal to a training run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("dataset is empty")]
    Empty,

    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("row {row}, column `{column}`: `{value}` is not a finite number")]
    NonNumeric {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("dataset has {rows} rows; at least {required} are needed for a train/test split")]
    TooFewRows { rows: usize, required: usize },
}

/// Errors returned by the estimator trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Data(#[from] DataError),

    #[error("invalid training parameters: {0}")]
    Params(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
