//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression trees minimising squared error. Candidate
//! thresholds are midpoints between consecutive distinct feature values;
//! ties in split quality keep the earliest (feature, threshold) candidate.

use carbon_core::{Node, Tree, FEATURE_COUNT};

/// Growth limits for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    score: f64,
}

/// Build a regression tree over rows of a shared feature matrix
pub struct CartBuilder<'a> {
    features: &'a [[f64; FEATURE_COUNT]],
    targets: &'a [f64],
    config: TreeConfig,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [[f64; FEATURE_COUNT]], targets: &'a [f64], config: TreeConfig) -> Self {
        assert_eq!(features.len(), targets.len());
        Self {
            features,
            targets,
            config,
        }
    }

    /// Build a tree from the given row indices (duplicates allowed)
    pub fn build(&self, indices: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes);
        Tree::new(nodes)
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current_idx = nodes.len() as i32;

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
            || self.is_pure(indices)
        {
            nodes.push(Node::leaf(current_idx, self.mean_target(indices)));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices) else {
            nodes.push(Node::leaf(current_idx, self.mean_target(indices)));
            return current_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][split.feature_idx] <= split.threshold);

        // Reserve the slot, children are filled in after recursion
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Scan every feature for the split maximising
    /// `S_left^2 / n_left + S_right^2 / n_right`, which is equivalent to
    /// minimising the summed squared error of the two children.
    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let total: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in 0..FEATURE_COUNT {
            sorted.sort_by(|&a, &b| {
                self.features[a][feature_idx].total_cmp(&self.features[b][feature_idx])
            });

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.targets[sorted[pos]];

                let current = self.features[sorted[pos]][feature_idx];
                let next = self.features[sorted[pos + 1]][feature_idx];
                if current == next {
                    continue;
                }

                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;

                if best.map_or(true, |b| score > b.score) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold: midpoint(current, next),
                        score,
                    });
                }
            }
        }

        best
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        let mut values = indices.iter().map(|&i| self.targets[i]);
        match values.next() {
            Some(first) => values.all(|v| v == first),
            None => true,
        }
    }

    fn mean_target(&self, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        sum / indices.len() as f64
    }
}

/// Threshold strictly below `hi` and at least `lo`
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid >= lo && mid < hi {
        mid
    } else {
        lo
    }
}
