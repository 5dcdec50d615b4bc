//! Per-feature standardization (zero mean, unit variance)

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};
use crate::features::FEATURE_COUNT;

/// Fitted standard scaler
///
/// Uses the population standard deviation. A feature with zero variance
/// keeps a scale of 1.0 so it is centred but not divided by zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Fit mean and scale on the given rows
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(ModelError::InvalidParameters(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = [0.0; FEATURE_COUNT];
        for row in rows {
            for i in 0..FEATURE_COUNT {
                let d = row[i] - mean[i];
                var[i] += d * d;
            }
        }

        let mut scale = [1.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let std = (var[i] / n).sqrt();
            if std > 0.0 && std.is_finite() {
                scale[i] = std;
            }
        }

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    pub fn validate(&self) -> Result<()> {
        let finite = self.mean.iter().all(|v| v.is_finite())
            && self.scale.iter().all(|v| v.is_finite() && *v > 0.0);
        if finite {
            Ok(())
        } else {
            Err(ModelError::ValidationFailed(
                "scaler statistics must be finite with positive scale".to_string(),
            ))
        }
    }
}
