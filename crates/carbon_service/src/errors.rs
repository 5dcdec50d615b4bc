//! Scoring service error types

use carbon_core::ArtifactError;
use thiserror::Error;

/// Scoring service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Scoring attempted before both models were loaded
    #[error("Models are not loaded")]
    ModelNotLoaded,

    /// Malformed scoring request; affects only that request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Models were already installed; reloading requires a new service
    #[error("Models are already loaded")]
    AlreadyLoaded,

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// Whether the error is confined to a single request
    pub fn is_request_error(&self) -> bool {
        matches!(self, ServiceError::InvalidInput(_))
    }
}

impl From<carbon_core::ModelError> for ServiceError {
    fn from(err: carbon_core::ModelError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ServiceError>;
