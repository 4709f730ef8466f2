use std::f64::consts::PI;

/// `ln(f64::MAX)`. Logarithms are clamped to `±MAX_LOG_MAGNITUDE`.
pub const MAX_LOG_MAGNITUDE: f64 = 709.782712893384;

/// Squared distance of an eigenvalue from 1 on a log scale: `(ln|v|)²`.
///
/// Negative values use the complex logarithm `ln(-x) = ln(x) + iπ`, which adds
/// `π²` to the squared modulus. `ln|v|` is clamped to
/// `[-MAX_LOG_MAGNITUDE, MAX_LOG_MAGNITUDE]`, so `v == 0` and `v == ∞` both
/// map to the finite penalty `MAX_LOG_MAGNITUDE² ≈ 5.04e5` and
/// `f(v) == f(1/v)` holds at the extremes too. NaN gets the same penalty.
#[inline]
pub fn squared_log_distance(v: f64) -> f64 {
    let log = if v.is_nan() {
        MAX_LOG_MAGNITUDE
    } else {
        v.abs().ln().clamp(-MAX_LOG_MAGNITUDE, MAX_LOG_MAGNITUDE)
    };
    let squared = log * log;
    if v < 0.0 {
        squared + PI * PI
    } else {
        squared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::E;

    #[test]
    fn test_unity_is_zero() {
        assert_eq!(squared_log_distance(1.0), 0.0);
    }

    #[test]
    fn test_minus_one_is_pi_squared() {
        assert!((squared_log_distance(-1.0) - PI * PI).abs() < 1e-12);
    }

    #[test]
    fn test_euler_number_is_one() {
        assert!((squared_log_distance(E) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reciprocal_symmetry() {
        for v in [0.01, 0.3, 2.0, 17.5, 1e6] {
            let forward = squared_log_distance(v);
            let inverse = squared_log_distance(1.0 / v);
            assert!(
                (forward - inverse).abs() < 1e-9 * forward.max(1.0),
                "f({}) = {} but f(1/{}) = {}",
                v,
                forward,
                v,
                inverse
            );
        }
    }

    #[test]
    fn test_negative_adds_constant_penalty() {
        for v in [0.5, 3.0, 40.0] {
            let diff = squared_log_distance(-v) - squared_log_distance(v);
            assert!((diff - PI * PI).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_is_large_but_finite() {
        let zero = squared_log_distance(0.0);
        assert!(zero.is_finite());
        assert_eq!(zero, MAX_LOG_MAGNITUDE * MAX_LOG_MAGNITUDE);
        assert!(zero > squared_log_distance(1e-300));
        assert_eq!(squared_log_distance(-0.0), zero);
    }

    #[test]
    fn test_zero_and_infinity_are_equally_far() {
        assert_eq!(squared_log_distance(0.0), squared_log_distance(f64::INFINITY));
        assert_eq!(squared_log_distance(f64::NAN), squared_log_distance(0.0));
        assert_eq!(
            squared_log_distance(f64::NEG_INFINITY),
            squared_log_distance(0.0) + PI * PI
        );
    }

    #[test]
    fn test_log_limit_matches_largest_float() {
        assert!((f64::MAX.ln() - MAX_LOG_MAGNITUDE).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_inputs_stay_finite() {
        assert!(squared_log_distance(f64::INFINITY).is_finite());
        assert!(squared_log_distance(f64::NEG_INFINITY).is_finite());
        assert!(squared_log_distance(f64::NAN).is_finite());
    }
}
