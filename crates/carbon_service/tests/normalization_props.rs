use carbon_service::{clamp_decision_score, fraud_score, fraud_score_percent};
use proptest::prelude::*;

// Property-based tests for the fraud score mapping
// The mapping must be bounded, monotone and saturating for any raw score

fn raw_score() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0f64..=1.0,
        -1.0e6f64..=1.0e6,
        Just(f64::MAX),
        Just(f64::MIN),
    ]
}

proptest! {
    #[test]
    fn fraud_score_is_bounded(s in raw_score()) {
        let pct = fraud_score_percent(s);
        prop_assert!((0.0..=100.0).contains(&pct));
    }
}

proptest! {
    #[test]
    fn fraud_score_is_monotone_non_increasing(a in raw_score(), b in raw_score()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(fraud_score(hi) <= fraud_score(lo));
        prop_assert!(fraud_score_percent(hi) <= fraud_score_percent(lo));
    }
}

proptest! {
    #[test]
    fn scores_beyond_bounds_saturate(excess in 0.0f64..1.0e9) {
        prop_assert_eq!(fraud_score_percent(1.0 + excess), fraud_score_percent(1.0));
        prop_assert_eq!(fraud_score_percent(-1.0 - excess), fraud_score_percent(-1.0));
        prop_assert_eq!(fraud_score_percent(1.0 + excess), 0.0);
        prop_assert_eq!(fraud_score_percent(-1.0 - excess), 100.0);
    }
}

proptest! {
    #[test]
    fn mapping_is_linear_inside_bounds(s in -1.0f64..=1.0) {
        let expected = (1.0 - s) * 50.0;
        prop_assert!((fraud_score(s) - expected).abs() < 1e-9);
        prop_assert_eq!(clamp_decision_score(s), s);
    }
}

proptest! {
    #[test]
    fn small_perturbations_move_score_proportionally(s in -0.99f64..=0.99, d in 0.0f64..0.01) {
        let delta = fraud_score(s) - fraud_score(s + d);
        prop_assert!(delta >= 0.0);
        prop_assert!((delta - d * 50.0).abs() < 1e-9);
    }
}

#[test]
fn boundary_values_are_exact() {
    assert_eq!(fraud_score_percent(1.0), 0.0);
    assert_eq!(fraud_score_percent(-1.0), 100.0);
    assert_eq!(fraud_score_percent(0.0), 50.0);
}
