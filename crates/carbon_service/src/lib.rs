//! Carbon estimator scoring service
//!
//! Turns one project's features into a predicted CO2 reduction and a
//! bounded fraud score, using the regression and anomaly models produced
//! by the trainer.

pub mod config;
pub mod errors;
pub mod normalization;
pub mod policy;
pub mod service;
pub mod types;

pub use config::ServiceConfig;
pub use errors::{Result, ServiceError};
pub use normalization::{clamp_decision_score, fraud_score, fraud_score_percent, round_to};
pub use policy::{Assessment, DecisionPolicy, DEFAULT_FRAUD_THRESHOLD};
pub use service::{LoadedModels, ScoringService};
pub use types::{ScoreMeta, ScoreRequest, ScoredResult};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
