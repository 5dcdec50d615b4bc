//! Held-out regression metrics

use serde::{Deserialize, Serialize};

/// Evaluation of the regression model on the test split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute all metrics; slices must be the same non-zero length
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        Self {
            mae: mean_absolute_error(y_true, y_pred),
            rmse: root_mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
        }
    }
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len());
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    sum / y_true.len() as f64
}

pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len());
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    (sum / y_true.len() as f64).sqrt()
}

/// Coefficient of determination
///
/// A constant `y_true` has no variance to explain: the score is 1.0 for a
/// perfect prediction and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len());
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
