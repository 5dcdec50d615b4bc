//! Averaged regression-tree ensemble (random forest) inference

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};
use crate::features::FEATURE_COUNT;
use crate::tree::Tree;

/// Fitted random forest regressor
///
/// The prediction is the arithmetic mean of the tree outputs, summed in
/// tree order so repeated calls are bit-identical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForestRegressor {
    pub trees: Vec<Tree>,
}

impl RandomForestRegressor {
    pub fn new(trees: Vec<Tree>) -> Self {
        Self { trees }
    }

    pub fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ModelError::ValidationFailed(
                "random forest has no trees".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(FEATURE_COUNT).map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {i} validation failed: {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn test_prediction_is_tree_mean() {
        let t1 = Tree::new(vec![
            Node::internal(0, 0, 0.0, 1, 2),
            Node::leaf(1, 10.0),
            Node::leaf(2, 20.0),
        ]);
        let t2 = Tree::new(vec![Node::leaf(0, 40.0)]);
        let forest = RandomForestRegressor::new(vec![t1, t2]);

        assert_eq!(forest.predict_row(&[-1.0, 0.0, 0.0]), 25.0);
        assert_eq!(forest.predict_row(&[1.0, 0.0, 0.0]), 30.0);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_empty_forest_fails_validation() {
        assert!(RandomForestRegressor::new(vec![]).validate().is_err());
    }
}
