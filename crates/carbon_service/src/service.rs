//! Scoring service over the loaded regression and anomaly models
//!
//! Models are installed exactly once and then shared read-only; `score`
//! takes `&self` and never mutates model state, so one service can be
//! used from many threads without locking. Installing a new model pair
//! means building a new service.

use carbon_core::{read_artifact, AnomalyScorer, IsolationForest, RegressionPipeline, Regressor};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::ServiceConfig;
use crate::errors::{Result, ServiceError};
use crate::normalization::{fraud_score_percent, round_to, PREDICTION_DECIMALS};
use crate::types::{ScoreMeta, ScoreRequest, ScoredResult};

/// The model pair a service scores with
#[derive(Clone)]
pub struct LoadedModels {
    regressor: Arc<dyn Regressor>,
    anomaly: Arc<dyn AnomalyScorer>,
}

impl LoadedModels {
    pub fn new(regressor: Arc<dyn Regressor>, anomaly: Arc<dyn AnomalyScorer>) -> Self {
        Self { regressor, anomaly }
    }

    /// Read and verify both artifacts
    ///
    /// Nothing is returned unless both load successfully.
    #[instrument(skip_all, fields(
        regression = %regression_path.display(),
        anomaly = %anomaly_path.display()
    ))]
    pub fn from_artifacts(
        regression_path: &Path,
        anomaly_path: &Path,
        verify_hash: bool,
    ) -> Result<Self> {
        let regression = read_artifact::<RegressionPipeline>(regression_path, verify_hash)?;
        let anomaly = read_artifact::<IsolationForest>(anomaly_path, verify_hash)?;

        info!(
            regression_hash = %regression.model_hash,
            anomaly_hash = %anomaly.model_hash,
            trees = regression.model.forest().num_trees(),
            isolation_trees = anomaly.model.num_trees(),
            "Loaded model artifacts"
        );

        Ok(Self::new(
            Arc::new(regression.into_model()),
            Arc::new(anomaly.into_model()),
        ))
    }
}

#[derive(Default)]
pub struct ScoringService {
    models: OnceCell<LoadedModels>,
}

impl ScoringService {
    /// Create a service with no models; `score` fails until they are loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service that is ready immediately
    pub fn with_models(regressor: Arc<dyn Regressor>, anomaly: Arc<dyn AnomalyScorer>) -> Self {
        Self {
            models: OnceCell::with_value(LoadedModels::new(regressor, anomaly)),
        }
    }

    /// Install a model pair; fails if models are already installed
    pub fn install(&self, models: LoadedModels) -> Result<()> {
        self.models
            .set(models)
            .map_err(|_| ServiceError::AlreadyLoaded)
    }

    /// Load both artifacts from disk and install them
    pub fn load_artifacts(
        &self,
        regression_path: &Path,
        anomaly_path: &Path,
        verify_hash: bool,
    ) -> Result<()> {
        if self.is_ready() {
            return Err(ServiceError::AlreadyLoaded);
        }
        self.install(LoadedModels::from_artifacts(
            regression_path,
            anomaly_path,
            verify_hash,
        )?)
    }

    pub fn load_from_config(&self, config: &ServiceConfig) -> Result<()> {
        self.load_artifacts(
            &config.regression_artifact,
            &config.anomaly_artifact,
            config.verify_hash,
        )
    }

    pub fn is_ready(&self) -> bool {
        self.models.get().is_some()
    }

    /// Score one project
    pub fn score(&self, request: &ScoreRequest) -> Result<ScoredResult> {
        let models = self.models.get().ok_or(ServiceError::ModelNotLoaded)?;
        let features = request.features()?;

        let predicted = models.regressor.predict(&features);
        let df_score = models.anomaly.decision_score(&features);

        Ok(ScoredResult {
            project_id: request.project_id.clone(),
            predicted_co2_tons: round_to(predicted, PREDICTION_DECIMALS),
            fraud_score_percent: fraud_score_percent(df_score),
            meta: ScoreMeta { df_score },
        })
    }

    /// Score many projects in parallel; results keep request order
    pub fn score_batch(&self, requests: &[ScoreRequest]) -> Vec<Result<ScoredResult>> {
        requests.par_iter().map(|request| self.score(request)).collect()
    }

    /// Parse and score raw JSON requests; one outcome per item, in order
    pub fn score_json_batch(&self, items: &[Value]) -> Vec<Result<ScoredResult>> {
        items
            .par_iter()
            .map(|item| ScoreRequest::from_json(item).and_then(|request| self.score(&request)))
            .collect()
    }
}
