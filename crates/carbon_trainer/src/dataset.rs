//! CSV dataset loading
//!
//! Columns are located by header name, so extra columns and column order
//! in the file do not matter. Feature values are stored in model feature
//! order (`FEATURE_COLUMNS`).

use carbon_core::{FEATURE_COLUMNS, FEATURE_COUNT, TARGET_COLUMN};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::DataError;

/// Historical training records
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Vec<[f64; FEATURE_COUNT]>,
    pub targets: Vec<f64>,
}

impl Dataset {
    /// Build an in-memory dataset, applying the same checks as CSV loading
    pub fn new(features: Vec<[f64; FEATURE_COUNT]>, targets: Vec<f64>) -> Result<Self, DataError> {
        if features.is_empty() {
            return Err(DataError::Empty);
        }
        if features.len() != targets.len() {
            return Err(DataError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }

        for (i, (row, target)) in features.iter().zip(&targets).enumerate() {
            for (column, value) in FEATURE_COLUMNS.into_iter().zip(row) {
                if !value.is_finite() {
                    return Err(DataError::NonNumeric {
                        row: i + 1,
                        column,
                        value: value.to_string(),
                    });
                }
            }
            if !target.is_finite() {
                return Err(DataError::NonNumeric {
                    row: i + 1,
                    column: TARGET_COLUMN,
                    value: target.to_string(),
                });
            }
        }

        Ok(Self { features, targets })
    }

    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Load dataset from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DataError::MissingColumn(name))
        };

        let mut feature_idx = [0usize; FEATURE_COUNT];
        for (slot, name) in feature_idx.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = find(name)?;
        }
        let target_idx = find(TARGET_COLUMN)?;

        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let row = i + 1;

            let mut values = [0.0; FEATURE_COUNT];
            for ((value, &idx), column) in values.iter_mut().zip(&feature_idx).zip(FEATURE_COLUMNS) {
                *value = parse_cell(&record, idx, column, row)?;
            }

            features.push(values);
            targets.push(parse_cell(&record, target_idx, TARGET_COLUMN, row)?);
        }

        if features.is_empty() {
            return Err(DataError::Empty);
        }

        Ok(Self { features, targets })
    }

    /// Copy out the given rows, in the given order
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Per-feature (min, max) for logging
    pub fn feature_stats(&self) -> [(f64, f64); FEATURE_COUNT] {
        let mut stats = [(f64::INFINITY, f64::NEG_INFINITY); FEATURE_COUNT];
        for row in &self.features {
            for (stat, &val) in stats.iter_mut().zip(row) {
                stat.0 = stat.0.min(val);
                stat.1 = stat.1.max(val);
            }
        }
        stats
    }
}

fn parse_cell(
    record: &csv::StringRecord,
    idx: usize,
    column: &'static str,
    row: usize,
) -> Result<f64, DataError> {
    let raw = record.get(idx).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DataError::NonNumeric {
            row,
            column,
            value: raw.to_string(),
        }),
    }
}
