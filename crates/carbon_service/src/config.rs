//! Scoring service configuration
//!
//! Values come from a TOML file when one is given, then environment
//! variables override individual fields.

use carbon_core::{ANOMALY_ARTIFACT_FILE, REGRESSION_ARTIFACT_FILE};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{Result, ServiceError};
use crate::policy::{DecisionPolicy, DEFAULT_FRAUD_THRESHOLD};

pub const ENV_REGRESSION_ARTIFACT: &str = "CARBON_REG_ARTIFACT";
pub const ENV_ANOMALY_ARTIFACT: &str = "CARBON_ISO_ARTIFACT";
pub const ENV_VERIFY_HASH: &str = "CARBON_VERIFY_HASH";
pub const ENV_FRAUD_THRESHOLD: &str = "CARBON_FRAUD_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub regression_artifact: PathBuf,
    pub anomaly_artifact: PathBuf,
    /// Recompute and compare model hashes on load
    pub verify_hash: bool,
    pub fraud_threshold: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            regression_artifact: Path::new("models").join(REGRESSION_ARTIFACT_FILE),
            anomaly_artifact: Path::new("models").join(ANOMALY_ARTIFACT_FILE),
            verify_hash: true,
            fraud_threshold: DEFAULT_FRAUD_THRESHOLD,
        }
    }
}

impl ServiceConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.policy()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ServiceError::Config(format!("Failed to parse config file: {e}")))
    }

    /// Override fields from a key lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_REGRESSION_ARTIFACT) {
            self.regression_artifact = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_ANOMALY_ARTIFACT) {
            self.anomaly_artifact = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_VERIFY_HASH) {
            self.verify_hash = parse_bool(ENV_VERIFY_HASH, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FRAUD_THRESHOLD) {
            self.fraud_threshold = raw.trim().parse().map_err(|_| {
                ServiceError::Config(format!("{ENV_FRAUD_THRESHOLD} is not a number: {raw}"))
            })?;
        }
        debug!(config = ?self, "Applied configuration overrides");
        Ok(())
    }

    pub fn policy(&self) -> Result<DecisionPolicy> {
        DecisionPolicy::new(self.fraud_threshold)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ServiceError::Config(format!("{key} is not a boolean: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.regression_artifact, PathBuf::from("models/reg_model.json"));
        assert_eq!(config.anomaly_artifact, PathBuf::from("models/iso_model.json"));
        assert!(config.verify_hash);
        assert_eq!(config.fraud_threshold, 40.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml("fraud_threshold = 25.0\n").unwrap();
        assert_eq!(config.fraud_threshold, 25.0);
        assert!(config.verify_hash);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_REGRESSION_ARTIFACT, "/srv/reg.json"),
            (ENV_VERIFY_HASH, "false"),
            (ENV_FRAUD_THRESHOLD, "55"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.regression_artifact, PathBuf::from("/srv/reg.json"));
        assert_eq!(config.anomaly_artifact, PathBuf::from("models/iso_model.json"));
        assert!(!config.verify_hash);
        assert_eq!(config.fraud_threshold, 55.0);
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_VERIFY_HASH).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, "regression_artifact = \"a.json\"\nanomaly_artifact = \"b.json\"\n").unwrap();

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.regression_artifact, PathBuf::from("a.json"));
        assert_eq!(config.anomaly_artifact, PathBuf::from("b.json"));
        assert!(ServiceConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
