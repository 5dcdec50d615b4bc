//! Scaler + forest bundle used for CO2 prediction
//!
//! The forest was fitted on standardized features, so it is only ever
//! reachable through this bundle.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::forest::RandomForestRegressor;
use crate::model::Regressor;
use crate::scaler::StandardScaler;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionPipeline {
    scaler: StandardScaler,
    forest: RandomForestRegressor,
}

impl RegressionPipeline {
    pub fn new(scaler: StandardScaler, forest: RandomForestRegressor) -> Self {
        Self { scaler, forest }
    }

    /// Predict from raw (unscaled) feature values
    pub fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        self.forest.predict_row(&self.scaler.transform(row))
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForestRegressor {
        &self.forest
    }

    pub fn validate(&self) -> Result<()> {
        self.scaler.validate()?;
        self.forest.validate()
    }
}

impl Regressor for RegressionPipeline {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.predict_row(&features.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, Tree};

    #[test]
    fn test_scaler_applied_before_forest() {
        // split on standardized energy at 0.0, i.e. on the raw mean (100)
        let scaler = StandardScaler {
            mean: [100.0, 0.5, 0.4],
            scale: [50.0, 0.1, 0.1],
        };
        let forest = RandomForestRegressor::new(vec![Tree::new(vec![
            Node::internal(0, 0, 0.0, 1, 2),
            Node::leaf(1, 1.5),
            Node::leaf(2, 7.25),
        ])]);
        let pipeline = RegressionPipeline::new(scaler, forest);

        let low = FeatureVector::new(90.0, 0.5, 0.4).unwrap();
        let high = FeatureVector::new(110.0, 0.5, 0.4).unwrap();
        assert_eq!(pipeline.predict(&low), 1.5);
        assert_eq!(pipeline.predict(&high), 7.25);
        assert!(pipeline.validate().is_ok());
    }
}
