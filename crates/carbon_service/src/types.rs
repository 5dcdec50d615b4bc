//! Scoring request and response records

use carbon_core::{FeatureVector, FEATURE_FIELDS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ServiceError};

/// One project's scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Opaque identifier, echoed back unchanged
    pub project_id: String,
    pub energy_generated_kwh: f64,
    pub weather_score: f64,
    pub grid_emission_factor: f64,
}

impl ScoreRequest {
    pub fn new(
        project_id: impl Into<String>,
        energy_generated_kwh: f64,
        weather_score: f64,
        grid_emission_factor: f64,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            energy_generated_kwh,
            weather_score,
            grid_emission_factor,
        }
    }

    /// Parse a loosely-typed JSON object
    ///
    /// Feature fields may be JSON numbers or numeric strings. Missing or
    /// non-numeric fields are reported by name.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ServiceError::InvalidInput("request must be a JSON object".to_string()))?;

        let project_id = match object.get("project_id") {
            Some(Value::String(id)) => id.clone(),
            Some(_) => {
                return Err(ServiceError::InvalidInput(
                    "field `project_id` must be a string".to_string(),
                ))
            }
            None => {
                return Err(ServiceError::InvalidInput(
                    "missing field `project_id`".to_string(),
                ))
            }
        };

        let mut values = [0.0; 3];
        for (slot, field) in values.iter_mut().zip(FEATURE_FIELDS) {
            *slot = numeric_field(object, field)?;
        }

        Ok(Self::new(project_id, values[0], values[1], values[2]))
    }

    /// Validated feature vector in model order
    pub fn features(&self) -> Result<FeatureVector> {
        Ok(FeatureVector::new(
            self.energy_generated_kwh,
            self.weather_score,
            self.grid_emission_factor,
        )?)
    }
}

fn numeric_field(object: &serde_json::Map<String, Value>, field: &str) -> Result<f64> {
    let value = object
        .get(field)
        .ok_or_else(|| ServiceError::InvalidInput(format!("missing field `{field}`")))?;

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ServiceError::InvalidInput(format!(
            "field `{field}` must be a finite number, got {value}"
        ))),
    }
}

/// Diagnostic metadata attached to each result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreMeta {
    /// Unclamped, unrounded anomaly decision score
    pub df_score: f64,
}

/// Scoring response for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub project_id: String,
    /// Rounded to 4 decimal places
    pub predicted_co2_tons: f64,
    /// In `[0, 100]`, rounded to 2 decimal places
    pub fraud_score_percent: f64,
    pub meta: ScoreMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers_and_strings() {
        let req = ScoreRequest::from_json(&json!({
            "project_id": "P-1",
            "energy_generated_kwh": 500,
            "weather_score": "0.8",
            "grid_emission_factor": 0.45,
        }))
        .unwrap();

        assert_eq!(req, ScoreRequest::new("P-1", 500.0, 0.8, 0.45));
    }

    #[test]
    fn test_from_json_missing_field() {
        let err = ScoreRequest::from_json(&json!({
            "project_id": "P-1",
            "energy_generated_kwh": 500,
            "grid_emission_factor": 0.45,
        }))
        .unwrap_err();

        match err {
            ServiceError::InvalidInput(msg) => assert!(msg.contains("weather_score")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_non_numeric() {
        for bad in [json!("sunny"), json!(null), json!("NaN"), json!([1.0])] {
            let err = ScoreRequest::from_json(&json!({
                "project_id": "P-1",
                "energy_generated_kwh": 500,
                "weather_score": bad,
                "grid_emission_factor": 0.45,
            }))
            .unwrap_err();
            assert!(err.is_request_error());
        }
    }

    #[test]
    fn test_from_json_requires_object_and_string_id() {
        assert!(ScoreRequest::from_json(&json!([1, 2, 3])).is_err());
        assert!(ScoreRequest::from_json(&json!({
            "project_id": 7,
            "energy_generated_kwh": 1,
            "weather_score": 1,
            "grid_emission_factor": 1,
        }))
        .is_err());
    }

    #[test]
    fn test_features_rejects_non_finite() {
        let req = ScoreRequest::new("P-1", f64::NAN, 0.8, 0.45);
        assert!(matches!(req.features(), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_result_wire_shape() {
        let result = ScoredResult {
            project_id: "P-1".to_string(),
            predicted_co2_tons: 123.4567,
            fraud_score_percent: 20.0,
            meta: ScoreMeta { df_score: 0.6 },
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["meta"]["df_score"], json!(0.6));
        assert_eq!(value["fraud_score_percent"], json!(20.0));
    }
}
