//! Credit-or-flag decision over a scored result
//!
//! A project whose fraud score is below the threshold is credited one
//! token per kilogram of predicted CO2 reduction; everything else is held
//! for manual review.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServiceError};
use crate::types::ScoredResult;

/// Fraud percentage at or above which a project is flagged
pub const DEFAULT_FRAUD_THRESHOLD: f64 = 40.0;

/// Tokens credited per ton of CO2 (1 token = 1 kg)
pub const TOKENS_PER_TON: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    fraud_threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            fraud_threshold: DEFAULT_FRAUD_THRESHOLD,
        }
    }
}

/// Outcome of applying the policy to one result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Assessment {
    Credited { tokens: u64 },
    Flagged { fraud_score_percent: f64 },
}

impl DecisionPolicy {
    pub fn new(fraud_threshold: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&fraud_threshold) {
            return Err(ServiceError::Config(format!(
                "fraud threshold must be within [0, 100], got {fraud_threshold}"
            )));
        }
        Ok(Self { fraud_threshold })
    }

    pub fn fraud_threshold(&self) -> f64 {
        self.fraud_threshold
    }

    pub fn assess(&self, result: &ScoredResult) -> Assessment {
        if result.fraud_score_percent < self.fraud_threshold {
            Assessment::Credited {
                tokens: tokens_for(result.predicted_co2_tons),
            }
        } else {
            Assessment::Flagged {
                fraud_score_percent: result.fraud_score_percent,
            }
        }
    }
}

/// Whole tokens for a CO2 reduction; negative predictions earn nothing
pub fn tokens_for(predicted_co2_tons: f64) -> u64 {
    let tokens = (predicted_co2_tons * TOKENS_PER_TON).round();
    if tokens > 0.0 {
        tokens as u64
    } else {
        0
    }
}
