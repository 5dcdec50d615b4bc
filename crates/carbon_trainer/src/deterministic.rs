//! Seeded sampling utilities for reproducible training
//!
//! All randomness flows from one `StdRng` seeded by the run's seed. Each
//! tree gets its own seed drawn up front from the master generator, so
//! trees can be fitted in parallel without changing the result.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Create the master generator for a training run
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draw one independent seed per tree from the master generator
pub fn tree_seeds(rng: &mut StdRng, count: usize) -> Vec<u64> {
    (0..count).map(|_| rng.gen()).collect()
}

/// Shuffle row indices and split them into (train, test)
///
/// The test subset holds `ceil(n * test_size)` rows. Both subsets must be
/// non-empty; callers check the row count first.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut seeded_rng(seed));

    let n_test = test_count(n, test_size);
    let test = indices.split_off(n - n_test);
    (indices, test)
}

/// Number of held-out rows for `n` rows at the given fraction
pub fn test_count(n: usize, test_size: f64) -> usize {
    ((n as f64) * test_size).ceil().min(n as f64) as usize
}

/// Bootstrap sample: `n` draws with replacement from `0..n`
pub fn bootstrap_indices(rng: &mut StdRng, n: usize) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// `k` distinct indices from `0..n`, without replacement
pub fn sample_without_replacement(rng: &mut StdRng, n: usize, k: usize) -> Vec<usize> {
    rand::seq::index::sample(rng, n, k.min(n)).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_determinism() {
        let a = train_test_split(50, 0.2, 42);
        let b = train_test_split(50, 0.2, 42);
        assert_eq!(a, b);
        assert_ne!(a, train_test_split(50, 0.2, 43));
    }

    #[test]
    fn test_split_partitions_rows() {
        let (train, test) = train_test_split(10, 0.2, 7);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let all: HashSet<usize> = train.iter().chain(&test).copied().collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_test_count_rounds_up() {
        assert_eq!(test_count(11, 0.2), 3);
        assert_eq!(test_count(5, 0.2), 1);
        assert_eq!(test_count(2, 1.0), 2);
    }

    #[test]
    fn test_bootstrap_in_range() {
        let mut rng = seeded_rng(42);
        let sample = bootstrap_indices(&mut rng, 20);
        assert_eq!(sample.len(), 20);
        assert!(sample.iter().all(|&i| i < 20));
    }

    #[test]
    fn test_sample_without_replacement_is_distinct() {
        let mut rng = seeded_rng(42);
        let sample = sample_without_replacement(&mut rng, 100, 30);
        let unique: HashSet<usize> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 30);

        assert_eq!(sample_without_replacement(&mut rng, 5, 30).len(), 5);
    }

    #[test]
    fn test_tree_seeds_reproducible() {
        let s1 = tree_seeds(&mut seeded_rng(1), 8);
        let s2 = tree_seeds(&mut seeded_rng(1), 8);
        assert_eq!(s1, s2);
    }
}
