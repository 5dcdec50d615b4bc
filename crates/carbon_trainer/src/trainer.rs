//! Estimator trainer
//!
//! Fits the regression pipeline (standard scaler + random forest) on a
//! seeded train split, evaluates it on the held-out rows, and fits the
//! isolation forest on the raw features of every row. Both models are
//! persisted as a pair: nothing is written unless both are ready.

use carbon_core::serde_canon::hash_canonical_hex;
use carbon_core::{
    stage_artifact, Artifact, AnomalyScorer, FeatureVector, IsolationForest, RegressionPipeline,
    StandardScaler, ANOMALY_ARTIFACT_FILE, FEATURE_COUNT, REGRESSION_ARTIFACT_FILE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use crate::cart::TreeConfig;
use crate::dataset::Dataset;
use crate::deterministic::train_test_split;
use crate::ensemble::{fit_isolation_forest, fit_random_forest, ForestParams, IsolationParams};
use crate::errors::{DataError, TrainerError};
use crate::metrics::RegressionMetrics;

/// Training report file written next to the artifacts
pub const TRAINING_REPORT_FILE: &str = "training_report.json";

/// Smallest dataset that leaves a row on each side of the split
pub const MIN_TRAINING_ROWS: usize = 2;

/// Training hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Regression trees in the random forest
    pub n_estimators: usize,
    /// `None` grows each regression tree fully
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Trees in the isolation forest
    pub anomaly_estimators: usize,
    /// Per-tree subsample cap for the isolation forest
    pub max_samples: usize,
    /// Expected outlier share of the training data
    pub contamination: f64,
    /// Held-out fraction for evaluation
    pub test_size: f64,
    pub seed: u64,
    /// Persist a regression model refitted on every row instead of the
    /// train-split model that was evaluated
    pub persist_full_fit: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            anomaly_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            test_size: 0.2,
            seed: 42,
            persist_full_fit: false,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.n_estimators == 0 || self.anomaly_estimators == 0 {
            return Err(TrainerError::Params(
                "estimator counts must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(TrainerError::Params(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(TrainerError::Params(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(TrainerError::Params(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(TrainerError::Params(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(TrainerError::Params(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(TrainerError::Params(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            tree: TreeConfig {
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                min_samples_leaf: self.min_samples_leaf,
            },
            bootstrap: true,
        }
    }

    fn isolation_params(&self) -> IsolationParams {
        IsolationParams {
            n_estimators: self.anomaly_estimators,
            max_samples: self.max_samples,
            contamination: self.contamination,
        }
    }
}

/// Summary of a training run, persisted as `training_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: RegressionMetrics,
    pub regression_hash: String,
    pub anomaly_hash: String,
    pub anomaly_offset: f64,
    /// Share of training rows the isolation forest labels as outliers
    pub training_outlier_fraction: f64,
    pub params: TrainingParams,
}

/// Both fitted models plus the run summary
#[derive(Debug, Clone)]
pub struct TrainedModels {
    pub regression: RegressionPipeline,
    pub anomaly: IsolationForest,
    pub report: TrainingReport,
}

/// Where `write_artifacts` put each file
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub regression: PathBuf,
    pub anomaly: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            regression: dir.join(REGRESSION_ARTIFACT_FILE),
            anomaly: dir.join(ANOMALY_ARTIFACT_FILE),
            report: dir.join(TRAINING_REPORT_FILE),
        }
    }
}

pub struct EstimatorTrainer {
    params: TrainingParams,
}

impl EstimatorTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Fit scaler and forest on the given rows
    pub fn fit_regression(&self, data: &Dataset) -> Result<RegressionPipeline, TrainerError> {
        let scaler = StandardScaler::fit(&data.features)?;
        let scaled: Vec<[f64; FEATURE_COUNT]> =
            data.features.iter().map(|row| scaler.transform(row)).collect();

        let forest = fit_random_forest(
            &scaled,
            &data.targets,
            &self.params.forest_params(),
            self.params.seed,
        )?;

        Ok(RegressionPipeline::new(scaler, forest))
    }

    /// Fit the isolation forest on raw (unscaled) features
    pub fn fit_anomaly(&self, data: &Dataset) -> Result<IsolationForest, TrainerError> {
        Ok(fit_isolation_forest(
            &data.features,
            &self.params.isolation_params(),
            self.params.seed,
        )?)
    }

    /// Run the full training procedure
    #[instrument(skip_all, fields(rows = data.len(), seed = self.params.seed))]
    pub fn train(&self, data: &Dataset) -> Result<TrainedModels, TrainerError> {
        self.params.validate()?;

        let rows = data.len();
        if rows < MIN_TRAINING_ROWS {
            return Err(DataError::TooFewRows {
                rows,
                required: MIN_TRAINING_ROWS,
            }
            .into());
        }

        let (train_idx, test_idx) = train_test_split(rows, self.params.test_size, self.params.seed);
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(DataError::TooFewRows {
                rows,
                required: MIN_TRAINING_ROWS,
            }
            .into());
        }

        let train = data.subset(&train_idx);
        let test = data.subset(&test_idx);
        info!(train_rows = train.len(), test_rows = test.len(), "Split dataset");

        let fitted = self.fit_regression(&train)?;
        let predictions: Vec<f64> = test
            .features
            .iter()
            .map(|row| fitted.predict_row(row))
            .collect();
        let metrics = RegressionMetrics::compute(&test.targets, &predictions);
        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "Evaluated regression model on held-out rows"
        );

        let regression = if self.params.persist_full_fit {
            debug!("Refitting regression model on all rows");
            self.fit_regression(data)?
        } else {
            fitted
        };

        let anomaly = self.fit_anomaly(data)?;
        let outliers = data
            .features
            .iter()
            .filter_map(|row| FeatureVector::from_array(*row).ok())
            .filter(|features| anomaly.predict_label(features) == -1)
            .count();
        let training_outlier_fraction = outliers as f64 / rows as f64;
        info!(
            offset = anomaly.offset,
            outlier_fraction = training_outlier_fraction,
            "Fitted anomaly model"
        );

        let report = TrainingReport {
            trained_at: Utc::now(),
            rows,
            train_rows: train.len(),
            test_rows: test.len(),
            metrics,
            regression_hash: hash_canonical_hex(&regression)
                .map_err(carbon_core::ArtifactError::from)?,
            anomaly_hash: hash_canonical_hex(&anomaly).map_err(carbon_core::ArtifactError::from)?,
            anomaly_offset: anomaly.offset,
            training_outlier_fraction,
            params: self.params.clone(),
        };

        Ok(TrainedModels {
            regression,
            anomaly,
            report,
        })
    }
}

impl TrainedModels {
    /// Label a raw feature row with the anomaly model (1 inlier, -1 outlier)
    pub fn anomaly_label(&self, row: &[f64; FEATURE_COUNT]) -> Result<i8, TrainerError> {
        let features = FeatureVector::from_array(*row)?;
        Ok(self.anomaly.predict_label(&features))
    }

    /// Persist both artifacts and the training report into `dir`
    ///
    /// Both artifacts are fully serialized and flushed to temporary files
    /// before either target path is replaced. If the anomaly artifact
    /// cannot be committed, the regression artifact is rolled back to what
    /// was there before.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn write_artifacts(&self, dir: &Path) -> Result<ArtifactPaths, TrainerError> {
        std::fs::create_dir_all(dir).map_err(|source| TrainerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let paths = ArtifactPaths::in_dir(dir);
        let trained_at = self.report.trained_at;

        let regression = Artifact::new(self.regression.clone(), trained_at)?;
        let anomaly = Artifact::new(self.anomaly.clone(), trained_at)?;

        let staged_regression = stage_artifact(&paths.regression, &regression)?;
        let staged_anomaly = stage_artifact(&paths.anomaly, &anomaly)?;

        // keep the previous regression artifact until the anomaly one lands
        let previous = read_existing(&paths.regression)?;
        staged_regression.commit()?;
        if let Err(e) = staged_anomaly.commit() {
            restore_previous(&paths.regression, previous);
            return Err(e.into());
        }
        info!(
            regression = %paths.regression.display(),
            anomaly = %paths.anomaly.display(),
            "Wrote model artifacts"
        );

        let report_json = serde_json::to_string_pretty(&self.report)
            .map_err(carbon_core::ArtifactError::from)?;
        std::fs::write(&paths.report, report_json).map_err(|source| TrainerError::Io {
            path: paths.report.clone(),
            source,
        })?;

        Ok(paths)
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, TrainerError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TrainerError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn restore_previous(path: &Path, previous: Option<Vec<u8>>) {
    let restored = match previous {
        Some(bytes) => std::fs::write(path, bytes),
        None => std::fs::remove_file(path),
    };
    match restored {
        Ok(()) => warn!("Rolled back {} after failed anomaly commit", path.display()),
        Err(e) => error!("Failed to roll back {}: {}", path.display(), e),
    }
}
