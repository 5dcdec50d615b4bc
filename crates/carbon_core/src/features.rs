//! Project feature vector shared by training and inference
//!
//! Both models consume the same three raw inputs in the same order. The
//! ordering below is the single source of truth for CSV column lookup,
//! scaler statistics and tree split indices.

use serde::Serialize;

use crate::errors::{ModelError, Result};

/// Number of features consumed by both models
pub const FEATURE_COUNT: usize = 3;

/// Training table column names, in model feature order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Energy_Generated_kWh",
    "Weather_Score",
    "Grid_Emission_Factor",
];

/// Training table target column
pub const TARGET_COLUMN: &str = "CO2_Reduced_tons";

/// Request-side field names, in model feature order
pub const FEATURE_FIELDS: [&str; FEATURE_COUNT] = [
    "energy_generated_kwh",
    "weather_score",
    "grid_emission_factor",
];

/// Validated, immutable feature triple for one project
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    energy_generated_kwh: f64,
    weather_score: f64,
    grid_emission_factor: f64,
}

impl FeatureVector {
    /// Build a feature vector, rejecting NaN and infinite values
    pub fn new(
        energy_generated_kwh: f64,
        weather_score: f64,
        grid_emission_factor: f64,
    ) -> Result<Self> {
        Self::from_array([energy_generated_kwh, weather_score, grid_emission_factor])
    }

    /// Build from values already in model feature order
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Result<Self> {
        for (name, value) in FEATURE_FIELDS.into_iter().zip(values) {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteFeature { name, value });
            }
        }

        Ok(Self {
            energy_generated_kwh: values[0],
            weather_score: values[1],
            grid_emission_factor: values[2],
        })
    }

    /// Build from a slice, checking arity as well as finiteness
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let array: [f64; FEATURE_COUNT] =
            values.try_into().map_err(|_| ModelError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: values.len(),
            })?;
        Self::from_array(array)
    }

    pub fn energy_generated_kwh(&self) -> f64 {
        self.energy_generated_kwh
    }

    pub fn weather_score(&self) -> f64 {
        self.weather_score
    }

    pub fn grid_emission_factor(&self) -> f64 {
        self.grid_emission_factor
    }

    /// Values in model feature order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.energy_generated_kwh,
            self.weather_score,
            self.grid_emission_factor,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_matches_columns() {
        let fv = FeatureVector::new(500.0, 0.8, 0.45).unwrap();
        assert_eq!(fv.to_array(), [500.0, 0.8, 0.45]);
        assert_eq!(FEATURE_COLUMNS[0], "Energy_Generated_kWh");
        assert_eq!(FEATURE_FIELDS[2], "grid_emission_factor");
    }

    #[test]
    fn test_rejects_nan() {
        let err = FeatureVector::new(500.0, f64::NAN, 0.45).unwrap_err();
        assert!(matches!(
            err,
            ModelError::NonFiniteFeature {
                name: "weather_score",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_infinity() {
        assert!(FeatureVector::new(f64::INFINITY, 0.8, 0.45).is_err());
    }

    #[test]
    fn test_from_slice_checks_arity() {
        let err = FeatureVector::from_slice(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::FeatureCount {
                expected: 3,
                actual: 2
            }
        );
        assert!(FeatureVector::from_slice(&[1.0, 2.0, 3.0]).is_ok());
    }
}
