//! Narrow model capabilities consumed by the scoring layer
//!
//! The scoring layer only ever needs one number out of each model. Any
//! type implementing these traits can stand in for the fitted ensembles,
//! including hand-written stubs in tests.

use crate::features::FeatureVector;

/// Maps a feature vector to a predicted CO2 reduction in tons
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> f64;
}

/// Continuous normality score: higher is more normal, negative is outlying
pub trait AnomalyScorer: Send + Sync {
    fn decision_score(&self, features: &FeatureVector) -> f64;

    /// Binary label derived from the decision score (1 inlier, -1 outlier)
    fn predict_label(&self, features: &FeatureVector) -> i8 {
        if self.decision_score(features) >= 0.0 {
            1
        } else {
            -1
        }
    }
}
