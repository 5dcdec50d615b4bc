//! Error types for the core model crate

use thiserror::Error;

/// Errors raised while building or validating fitted models
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A feature value is NaN or infinite
    #[error("Feature `{name}` is not a finite number: {value}")]
    NonFiniteFeature { name: &'static str, value: f64 },

    /// Feature slice has the wrong arity
    #[error("Expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    /// Fitted model failed structural validation
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    /// Invalid fitting parameters
    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for core model operations
pub type Result<T> = std::result::Result<T, ModelError>;
