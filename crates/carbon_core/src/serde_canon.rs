//! Canonical JSON serialization for reproducible model hashing
//!
//! Artifacts record the BLAKE3 hash of their model and `read_artifact`
//! recomputes it on load, so both sides must serialize a model to the same
//! bytes. Object keys are sorted recursively and no whitespace is emitted,
//! which makes the bytes independent of map iteration order. The trainer
//! also relies on this for run-to-run hash equality in its reports.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json_value = serde_json::to_value(value)
        .map_err(|e| CanonicalError::SerializationError(e.to_string()))?;

    let canonical = canonicalize_value(&json_value);
    serde_json::to_string(&canonical).map_err(|e| CanonicalError::SerializationError(e.to_string()))
}

/// Canonicalize a JSON value by sorting all object keys recursively
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut btree = BTreeMap::new();
            for (k, v) in map {
                btree.insert(k.clone(), canonicalize_value(v));
            }
            serde_json::Value::Object(btree.into_iter().collect())
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

/// BLAKE3 hash of the canonical JSON representation, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        b_field: f64,
        a_field: i64,
        z_field: String,
    }

    fn sample() -> Sample {
        Sample {
            b_field: 0.45,
            a_field: 1,
            z_field: "test".to_string(),
        }
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let json = to_canonical_json(&sample()).unwrap();
        assert_eq!(json, r#"{"a_field":1,"b_field":0.45,"z_field":"test"}"#);
    }

    #[test]
    fn test_hash_is_stable() {
        let h1 = hash_canonical_hex(&sample()).unwrap();
        let h2 = hash_canonical_hex(&sample()).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_hash_changes_with_content() {
        let mut other = sample();
        other.b_field = 0.46;
        assert_ne!(
            hash_canonical_hex(&sample()).unwrap(),
            hash_canonical_hex(&other).unwrap()
        );
    }
}
