//! Anomaly score to fraud percentage normalization
//!
//! The raw decision score is saturated to `[-1, 1]`, mapped linearly to
//! `u = (s + 1) / 2` and inverted into a percentage `(1 - u) * 100`. The
//! mapping is continuous and monotonically non-increasing in the raw
//! score; values beyond the bounds saturate rather than fail.

/// Lower saturation bound of the raw decision score
pub const DECISION_SCORE_MIN: f64 = -1.0;

/// Upper saturation bound of the raw decision score
pub const DECISION_SCORE_MAX: f64 = 1.0;

/// Decimal places of the presented fraud score
pub const FRAUD_SCORE_DECIMALS: i32 = 2;

/// Decimal places of the presented CO2 prediction
pub const PREDICTION_DECIMALS: i32 = 4;

/// Saturate a raw decision score into `[-1, 1]`
pub fn clamp_decision_score(raw: f64) -> f64 {
    raw.clamp(DECISION_SCORE_MIN, DECISION_SCORE_MAX)
}

/// Unrounded fraud percentage in `[0, 100]`
pub fn fraud_score(raw: f64) -> f64 {
    let s = clamp_decision_score(raw);
    let u = (s + 1.0) / 2.0;
    (1.0 - u) * 100.0
}

/// Fraud percentage rounded for presentation
pub fn fraud_score_percent(raw: f64) -> f64 {
    round_to(fraud_score(raw), FRAUD_SCORE_DECIMALS)
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(fraud_score_percent(1.0), 0.0);
        assert_eq!(fraud_score_percent(-1.0), 100.0);
        assert_eq!(fraud_score_percent(0.0), 50.0);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(fraud_score_percent(-2.5), 100.0);
        assert_eq!(fraud_score_percent(7.0), 0.0);
        assert_eq!(clamp_decision_score(f64::NEG_INFINITY), -1.0);
    }

    #[test]
    fn test_known_value() {
        assert_eq!(fraud_score_percent(0.6), 20.0);
        assert_eq!(fraud_score_percent(-0.2), 60.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(123.456_749, 4), 123.4567);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-1.005_51, 2), -1.01);
    }
}
