//! Model artifact persistence
//!
//! An artifact is a canonical JSON envelope around one fitted model:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "kind": "regression",
//!   "model": { ... },
//!   "model_hash": "<blake3 hex of the canonical model JSON>",
//!   "trained_at": "2026-01-01T00:00:00Z"
//! }
//! ```
//!
//! Writes are staged in a temporary file next to the target and renamed
//! into place, so readers see either the previous artifact or the new one.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::errors::ModelError;
use crate::isolation::IsolationForest;
use crate::pipeline::RegressionPipeline;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json, CanonicalError};

/// Current envelope format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Default file name of the regression artifact
pub const REGRESSION_ARTIFACT_FILE: &str = "reg_model.json";

/// Default file name of the anomaly artifact
pub const ANOMALY_ARTIFACT_FILE: &str = "iso_model.json";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),

    #[error("Artifact kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: ArtifactKind,
        found: ArtifactKind,
    },

    #[error("Unsupported artifact format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Model hash mismatch: recorded {recorded}, computed {computed}")]
    HashMismatch { recorded: String, computed: String },

    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ModelError),
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Regression,
    Anomaly,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Regression => write!(f, "regression"),
            ArtifactKind::Anomaly => write!(f, "anomaly"),
        }
    }
}

/// A fitted model that can be stored in an artifact envelope
pub trait ArtifactModel: Serialize + DeserializeOwned {
    const KIND: ArtifactKind;

    fn validate_model(&self) -> Result<(), ModelError>;
}

impl ArtifactModel for RegressionPipeline {
    const KIND: ArtifactKind = ArtifactKind::Regression;

    fn validate_model(&self) -> Result<(), ModelError> {
        self.validate()
    }
}

impl ArtifactModel for IsolationForest {
    const KIND: ArtifactKind = ArtifactKind::Anomaly;

    fn validate_model(&self) -> Result<(), ModelError> {
        self.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact<M> {
    pub format_version: u32,
    pub kind: ArtifactKind,
    pub model_hash: String,
    pub trained_at: DateTime<Utc>,
    pub model: M,
}

impl<M: ArtifactModel> Artifact<M> {
    /// Wrap a fitted model, recording its canonical hash
    pub fn new(model: M, trained_at: DateTime<Utc>) -> Result<Self, ArtifactError> {
        model.validate_model()?;
        let model_hash = hash_canonical_hex(&model)?;
        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            kind: M::KIND,
            model_hash,
            trained_at,
            model,
        })
    }

    /// Check envelope metadata and model structure, and optionally the hash
    pub fn verify(&self, verify_hash: bool) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(self.format_version));
        }
        if self.kind != M::KIND {
            return Err(ArtifactError::KindMismatch {
                expected: M::KIND,
                found: self.kind,
            });
        }
        if verify_hash {
            let computed = hash_canonical_hex(&self.model)?;
            if computed != self.model_hash {
                return Err(ArtifactError::HashMismatch {
                    recorded: self.model_hash.clone(),
                    computed,
                });
            }
        }
        self.model.validate_model()?;
        Ok(())
    }

    pub fn into_model(self) -> M {
        self.model
    }
}

/// Artifact bytes written to a temporary sibling, not yet visible
#[derive(Debug)]
pub struct StagedArtifact {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedArtifact {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replace the target with the staged bytes
    pub fn commit(self) -> Result<PathBuf, ArtifactError> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| ArtifactError::io(&target, e.error))?;
        debug!("Committed artifact {}", target.display());
        Ok(target)
    }
}

/// Serialize an artifact into a temporary file in the target's directory
///
/// Dropping the returned value without committing removes the temporary
/// file and leaves any existing artifact untouched.
pub fn stage_artifact<M: ArtifactModel>(
    path: &Path,
    artifact: &Artifact<M>,
) -> Result<StagedArtifact, ArtifactError> {
    let json = to_canonical_json(artifact)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ArtifactError::io(dir, e))?;
    temp.write_all(json.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ArtifactError::io(temp.path(), e))?;

    Ok(StagedArtifact {
        temp,
        target: path.to_path_buf(),
    })
}

/// Stage and commit a single artifact
pub fn write_artifact<M: ArtifactModel>(
    path: &Path,
    artifact: &Artifact<M>,
) -> Result<PathBuf, ArtifactError> {
    stage_artifact(path, artifact)?.commit()
}

/// Load and verify an artifact
///
/// The file handle is scoped to the deserialization and released on
/// every path, including parse failures.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_artifact<M: ArtifactModel>(
    path: &Path,
    verify_hash: bool,
) -> Result<Artifact<M>, ArtifactError> {
    let artifact: Artifact<M> = {
        let file = File::open(path).map_err(|e| ArtifactError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file))?
    };

    artifact.verify(verify_hash)?;
    debug!(model_hash = %artifact.model_hash, "Artifact verified");
    Ok(artifact)
}
