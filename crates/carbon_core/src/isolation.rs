//! Isolation forest anomaly scoring
//!
//! Each tree leaf stores the expected isolation depth of the samples that
//! reached it during fitting: the leaf depth plus the average path length
//! of an unbuilt subtree over the remaining samples. Short average paths
//! mean a point is easy to isolate, i.e. anomalous.
//!
//! `score_samples` is `-2^(-E[h(x)] / c(max_samples))`, in `[-1, 0)`.
//! `decision_score` subtracts the fitted `offset`, which places the
//! contamination quantile of the training scores at zero: positive is
//! inlier, negative is outlier.

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::model::AnomalyScorer;
use crate::tree::Tree;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful binary search tree lookup over
/// `n` points, used to normalise isolation depths.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Fitted isolation forest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsolationForest {
    /// Isolation trees; leaves hold expected path length
    pub trees: Vec<Tree>,

    /// Subsample size each tree was grown on
    pub max_samples: usize,

    /// Expected outlier proportion the offset was fitted for
    pub contamination: f64,

    /// Training-score quantile subtracted by `decision_score`
    pub offset: f64,
}

impl IsolationForest {
    /// Mean isolation depth across trees
    pub fn mean_path_length(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Raw isolation score in `[-1, 0)`; closer to -1 is more anomalous
    pub fn score_samples_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let depth = self.mean_path_length(row);
        -(2f64.powf(-depth / average_path_length(self.max_samples)))
    }

    pub fn decision_score_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        self.score_samples_row(row) - self.offset
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ModelError::ValidationFailed(
                "isolation forest has no trees".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(ModelError::ValidationFailed(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ModelError::ValidationFailed(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if !self.offset.is_finite() {
            return Err(ModelError::ValidationFailed(
                "offset is not finite".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(FEATURE_COUNT).map_err(|e| {
                ModelError::ValidationFailed(format!("Isolation tree {i} validation failed: {e}"))
            })?;
        }
        Ok(())
    }
}

impl AnomalyScorer for IsolationForest {
    fn decision_score(&self, features: &FeatureVector) -> f64 {
        self.decision_score_row(&features.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // 2 * (ln 255 + gamma) - 2 * 255 / 256
        let expected = 2.0 * (255f64.ln() + EULER_GAMMA) - 2.0 * 255.0 / 256.0;
        assert!((average_path_length(256) - expected).abs() < 1e-12);
        assert!(average_path_length(256) > average_path_length(64));
    }

    #[test]
    fn test_shallow_leaf_scores_more_anomalous() {
        // feature 0 <= 10 isolates at depth 1, otherwise deep region
        let tree = Tree::new(vec![
            Node::internal(0, 0, 10.0, 1, 2),
            Node::leaf(1, 1.0),
            Node::leaf(2, 12.0),
        ]);
        let forest = IsolationForest {
            trees: vec![tree],
            max_samples: 256,
            contamination: 0.1,
            offset: -0.5,
        };

        let outlier = FeatureVector::new(5.0, 0.0, 0.0).unwrap();
        let inlier = FeatureVector::new(50.0, 0.0, 0.0).unwrap();

        assert!(forest.decision_score(&outlier) < forest.decision_score(&inlier));
        assert_eq!(forest.predict_label(&outlier), -1);
        assert_eq!(forest.predict_label(&inlier), 1);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_score_samples_at_normalising_depth_is_minus_half() {
        let c = average_path_length(256);
        let forest = IsolationForest {
            trees: vec![Tree::new(vec![Node::leaf(0, c)])],
            max_samples: 256,
            contamination: 0.1,
            offset: -0.5,
        };
        let row = [0.0, 0.0, 0.0];
        assert!((forest.score_samples_row(&row) + 0.5).abs() < 1e-12);
        assert!(forest.decision_score_row(&row).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_bad_contamination() {
        let forest = IsolationForest {
            trees: vec![Tree::new(vec![Node::leaf(0, 1.0)])],
            max_samples: 16,
            contamination: 0.9,
            offset: -0.5,
        };
        assert!(forest.validate().is_err());
    }
}
