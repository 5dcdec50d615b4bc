//! Ensemble fitting for the random forest and the isolation forest
//!
//! Tree seeds are drawn sequentially from the master generator before any
//! tree is grown, then trees are fitted in parallel. Output order follows
//! seed order, so the ensemble is identical for a given seed regardless of
//! thread scheduling.

use carbon_core::{IsolationForest, ModelError, RandomForestRegressor, FEATURE_COUNT};
use rayon::prelude::*;
use tracing::debug;

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::{bootstrap_indices, sample_without_replacement, seeded_rng, tree_seeds};
use crate::isolation::{isolation_depth_limit, IsolationTreeBuilder};

/// Random forest hyperparameters
#[derive(Clone, Debug)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeConfig,
    pub bootstrap: bool,
}

/// Isolation forest hyperparameters
#[derive(Clone, Debug)]
pub struct IsolationParams {
    pub n_estimators: usize,
    /// Upper bound on the per-tree subsample; capped at the row count
    pub max_samples: usize,
    pub contamination: f64,
}

/// Fit a random forest regressor on (already scaled) features
pub fn fit_random_forest(
    features: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    params: &ForestParams,
    seed: u64,
) -> Result<RandomForestRegressor, ModelError> {
    if params.n_estimators == 0 {
        return Err(ModelError::InvalidParameters(
            "n_estimators must be at least 1".to_string(),
        ));
    }
    if features.is_empty() || features.len() != targets.len() {
        return Err(ModelError::InvalidParameters(format!(
            "cannot fit forest on {} rows with {} targets",
            features.len(),
            targets.len()
        )));
    }

    let n = features.len();
    let seeds = tree_seeds(&mut seeded_rng(seed), params.n_estimators);
    let builder = CartBuilder::new(features, targets, params.tree.clone());

    let trees: Vec<_> = seeds
        .into_par_iter()
        .map(|tree_seed| {
            let indices = if params.bootstrap {
                bootstrap_indices(&mut seeded_rng(tree_seed), n)
            } else {
                (0..n).collect()
            };
            builder.build(&indices)
        })
        .collect();

    debug!(
        trees = trees.len(),
        leaves = trees.iter().map(|t| t.leaf_count()).sum::<usize>(),
        "Fitted random forest"
    );

    Ok(RandomForestRegressor::new(trees))
}

/// Fit an isolation forest and calibrate its offset on the training rows
pub fn fit_isolation_forest(
    features: &[[f64; FEATURE_COUNT]],
    params: &IsolationParams,
    seed: u64,
) -> Result<IsolationForest, ModelError> {
    if params.n_estimators == 0 {
        return Err(ModelError::InvalidParameters(
            "n_estimators must be at least 1".to_string(),
        ));
    }
    if !(params.contamination > 0.0 && params.contamination <= 0.5) {
        return Err(ModelError::InvalidParameters(format!(
            "contamination must be in (0, 0.5], got {}",
            params.contamination
        )));
    }

    let n = features.len();
    let psi = params.max_samples.min(n);
    if psi < 2 {
        return Err(ModelError::InvalidParameters(format!(
            "isolation forest needs at least 2 samples per tree, got {psi}"
        )));
    }

    let seeds = tree_seeds(&mut seeded_rng(seed), params.n_estimators);
    let builder = IsolationTreeBuilder::new(features, isolation_depth_limit(psi));

    let trees: Vec<_> = seeds
        .into_par_iter()
        .map(|tree_seed| {
            let mut rng = seeded_rng(tree_seed);
            let indices = sample_without_replacement(&mut rng, n, psi);
            builder.build(&indices, &mut rng)
        })
        .collect();

    let mut forest = IsolationForest {
        trees,
        max_samples: psi,
        contamination: params.contamination,
        offset: 0.0,
    };

    let mut scores: Vec<f64> = features
        .par_iter()
        .map(|row| forest.score_samples_row(row))
        .collect();
    forest.offset = percentile(&mut scores, 100.0 * params.contamination);

    debug!(
        trees = forest.num_trees(),
        max_samples = psi,
        offset = forest.offset,
        "Fitted isolation forest"
    );

    Ok(forest)
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is in `[0, 100]`. Sorts `values` in place.
pub fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);

    let rank = (q / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}
