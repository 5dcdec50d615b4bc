//! Isolation tree builder
//!
//! Each node picks a random feature that still varies within the node and
//! a threshold drawn uniformly from `[min, max)` of that feature. Growth
//! stops at `max_depth`, at a single sample, or when every feature is
//! constant. Leaves store `depth + c(n_leaf)`.

use carbon_core::{average_path_length, Node, Tree, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::Rng;

/// Depth limit for a subsample of `psi` rows: `ceil(log2(psi))`
pub fn isolation_depth_limit(psi: usize) -> usize {
    (psi.max(2) as f64).log2().ceil() as usize
}

pub struct IsolationTreeBuilder<'a> {
    features: &'a [[f64; FEATURE_COUNT]],
    max_depth: usize,
}

impl<'a> IsolationTreeBuilder<'a> {
    pub fn new(features: &'a [[f64; FEATURE_COUNT]], max_depth: usize) -> Self {
        Self {
            features,
            max_depth,
        }
    }

    /// Grow one isolation tree over `indices`
    pub fn build(&self, indices: &[usize], rng: &mut StdRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, rng, &mut nodes);
        Tree::new(nodes)
    }

    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        rng: &mut StdRng,
        nodes: &mut Vec<Node>,
    ) -> i32 {
        let current_idx = nodes.len() as i32;

        if depth >= self.max_depth || indices.len() <= 1 {
            nodes.push(self.leaf(current_idx, indices.len(), depth));
            return current_idx;
        }

        let candidates = self.varying_features(indices);
        if candidates.is_empty() {
            nodes.push(self.leaf(current_idx, indices.len(), depth));
            return current_idx;
        }

        let (feature_idx, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = uniform_threshold(rng, lo, hi);

        // x <= threshold keeps at least the minimum on the left and the
        // maximum on the right, so neither side is empty
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][feature_idx] <= threshold);

        nodes.push(Node::internal(
            current_idx,
            feature_idx as i32,
            threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, rng, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, rng, nodes);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    fn leaf(&self, id: i32, n_samples: usize, depth: usize) -> Node {
        Node::leaf(id, depth as f64 + average_path_length(n_samples))
    }

    /// Features with `min < max` inside the node, with their range
    fn varying_features(&self, indices: &[usize]) -> Vec<(usize, f64, f64)> {
        (0..FEATURE_COUNT)
            .filter_map(|f| {
                let (lo, hi) = indices.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| {
                        let v = self.features[i][f];
                        (lo.min(v), hi.max(v))
                    },
                );
                (lo < hi).then_some((f, lo, hi))
            })
            .collect()
    }
}

/// Uniform draw from `[lo, hi)` for finite `lo < hi`
///
/// `hi - lo` can overflow to infinity for columns spanning most of the f64
/// range, so that case interpolates instead of scaling the width.
fn uniform_threshold(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    let u: f64 = rng.gen();
    let width = hi - lo;
    let t = if width.is_finite() {
        lo + u * width
    } else {
        lo * (1.0 - u) + hi * u
    };
    // rounding can land on hi, which would leave the right side empty
    if t < hi && t >= lo {
        t
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deterministic::seeded_rng;

    #[test]
    fn test_depth_limit() {
        assert_eq!(isolation_depth_limit(256), 8);
        assert_eq!(isolation_depth_limit(100), 7);
        assert_eq!(isolation_depth_limit(2), 1);
    }

    #[test]
    fn test_single_sample_is_leaf() {
        let features = vec![[1.0, 2.0, 3.0]];
        let tree = IsolationTreeBuilder::new(&features, 8).build(&[0], &mut seeded_rng(1));
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(0.0));
    }

    #[test]
    fn test_constant_rows_leaf_holds_expected_depth() {
        let features = vec![[1.0, 1.0, 1.0]; 10];
        let indices: Vec<usize> = (0..10).collect();
        let tree = IsolationTreeBuilder::new(&features, 8).build(&indices, &mut seeded_rng(1));
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(average_path_length(10)));
    }

    #[test]
    fn test_tree_is_valid_and_bounded() {
        let features: Vec<[f64; 3]> = (0..64)
            .map(|i| [i as f64, (i % 7) as f64, (i * 3 % 11) as f64])
            .collect();
        let indices: Vec<usize> = (0..64).collect();
        let max_depth = isolation_depth_limit(64);

        let tree = IsolationTreeBuilder::new(&features, max_depth).build(&indices, &mut seeded_rng(42));
        assert!(tree.validate(FEATURE_COUNT).is_ok());

        for row in &features {
            let depth = tree.evaluate(row);
            assert!(depth > 0.0);
            assert!(depth <= max_depth as f64 + average_path_length(64));
        }
    }

    #[test]
    fn test_threshold_stays_in_range() {
        let mut rng = seeded_rng(3);
        for _ in 0..1000 {
            let t = uniform_threshold(&mut rng, 0.25, 0.75);
            assert!((0.25..0.75).contains(&t));

            let t = uniform_threshold(&mut rng, -1.0e308, 1.0e308);
            assert!(t.is_finite());
            assert!(t >= -1.0e308 && t < 1.0e308);
        }
        // adjacent floats leave no room except lo
        let next = f64::from_bits(1.0f64.to_bits() + 1);
        assert_eq!(uniform_threshold(&mut rng, 1.0, next), 1.0);
    }

    #[test]
    fn test_extreme_range_column_splits() {
        let features = vec![
            [-1.0e308, 0.5, 0.4],
            [1.0e308, 0.6, 0.4],
            [0.0, 0.7, 0.4],
            [5.0e307, 0.8, 0.4],
        ];
        let indices: Vec<usize> = (0..features.len()).collect();
        let tree = IsolationTreeBuilder::new(&features, 4).build(&indices, &mut seeded_rng(11));

        assert!(tree.validate(FEATURE_COUNT).is_ok());
        for row in &features {
            assert!(tree.evaluate(row).is_finite());
        }
    }

    #[test]
    fn test_build_is_reproducible() {
        let features: Vec<[f64; 3]> = (0..32).map(|i| [i as f64, 0.5, -(i as f64)]).collect();
        let indices: Vec<usize> = (0..32).collect();
        let builder = IsolationTreeBuilder::new(&features, 5);

        let a = builder.build(&indices, &mut seeded_rng(9));
        let b = builder.build(&indices, &mut seeded_rng(9));
        assert_eq!(a, b);
    }
}
