//! Binary decision tree shared by both ensembles
//!
//! Regression trees store the mean target of a region in their leaves.
//! Isolation trees store the expected path length of a region. Traversal
//! is identical: go left when `feature <= threshold`.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes `feature_idx >= 0`, `left` and `right` index into
/// the owning tree's node vector and `leaf` is `None`. Leaf nodes use
/// `-1` for the indices and carry their output in `leaf`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (preorder position, informational)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold
    pub threshold: f64,

    /// Leaf output (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }

    pub fn leaf_value(&self) -> Option<f64> {
        self.leaf
    }
}

/// A single fitted tree (node 0 is the root)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature slice
    ///
    /// Malformed structure yields 0.0 in release builds and panics in debug
    /// builds. Trees loaded from artifacts are validated before use, so this
    /// only guards hand-built trees.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                debug_assert!(false, "malformed tree: no node {idx}");
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf_value().unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                debug_assert!(false, "malformed tree: node {idx} reads feature {}", node.feature_idx);
                return 0.0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };

            if next < 0 {
                debug_assert!(false, "malformed tree: node {idx} has no child");
                return 0.0;
            }
            idx = next as usize;
        }
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Validate tree structure against the expected feature count
    ///
    /// Children must point forward in the node vector, which rules out
    /// cycles as well as dangling indices.
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        let len = self.nodes.len() as i64;
        for (i, node) in self.nodes.iter().enumerate() {
            let i = i as i64;
            if node.is_leaf() {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    Some(v) => return Err(format!("Leaf node {i} has non-finite value {v}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                let child = child as i64;
                if child <= i || child >= len {
                    return Err(format!("Node {i} has invalid {side} child: {child}"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "Internal node {} has invalid feature index: {}",
                    i, node.feature_idx
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("Internal node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(vec![
            Node::internal(0, 0, 50.0, 1, 2),
            Node::leaf(1, 100.0),
            Node::leaf(2, 200.0),
        ])
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 2, 0.5, 1, 2);
        assert_eq!(internal.feature_idx, 2);
        assert_eq!(internal.threshold, 0.5);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, -2.5);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf_value(), Some(-2.5));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30.0]), 100.0);
        assert_eq!(tree.evaluate(&[50.0]), 100.0); // equal goes left
        assert_eq!(tree.evaluate(&[60.0]), 200.0);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(3).is_ok());

        let dangling = Tree::new(vec![
            Node::internal(0, 0, 50.0, 5, 2),
            Node::leaf(1, 100.0),
            Node::leaf(2, 200.0),
        ]);
        assert!(dangling.validate(3).is_err());

        let cyclic = Tree::new(vec![
            Node::internal(0, 0, 50.0, 0, 1),
            Node::leaf(1, 100.0),
        ]);
        assert!(cyclic.validate(3).is_err());

        let bad_feature = Tree::new(vec![
            Node::internal(0, 7, 50.0, 1, 2),
            Node::leaf(1, 100.0),
            Node::leaf(2, 200.0),
        ]);
        assert!(bad_feature.validate(3).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "malformed tree")]
    fn test_malformed_tree_panics_in_debug() {
        let tree = Tree::new(vec![Node::internal(0, 4, 1.0, 1, 2)]);
        tree.evaluate(&[1.0, 2.0, 3.0]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "malformed tree")]
    fn test_empty_tree_panics_in_debug() {
        Tree::new(vec![]).evaluate(&[1.0]);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_malformed_tree_evaluates_to_zero() {
        let tree = Tree::new(vec![Node::internal(0, 4, 1.0, 1, 2)]);
        assert_eq!(tree.evaluate(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(Tree::new(vec![]).evaluate(&[1.0]), 0.0);
    }
}
