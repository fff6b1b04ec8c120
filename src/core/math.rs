//! Angle arithmetic and seeded noise sampling.
//!
//! All angles are radians. Sampling helpers take the RNG explicitly so that
//! every engine owns exactly one seeded generator and replays byte-for-byte.

use std::f64::consts::{PI, TAU};

use rand::Rng;
use rand_distr::StandardNormal;

/// Normalizes an angle to the range `[-PI, PI]`.
///
/// # Example
///
/// ```
/// use std::f64::consts::PI;
/// use tula_loc::core::math::normalize_angle;
///
/// let a = normalize_angle(3.0 * PI);
/// assert!((a - PI).abs() < 1e-10 || (a + PI).abs() < 1e-10);
/// ```
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Wraps an angle to the range `[0, 2*PI)`.
///
/// Used before quantizing angles into histogram bins, where negative
/// equivalents of the same heading must land in the same bin.
///
/// # Example
///
/// ```
/// use std::f64::consts::PI;
/// use tula_loc::core::math::wrap_positive;
///
/// assert!((wrap_positive(-PI / 2.0) - 1.5 * PI).abs() < 1e-10);
/// ```
#[inline]
pub fn wrap_positive(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Smallest signed difference `a - b`, normalized to `[-PI, PI]`.
#[inline]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    normalize_angle(a - b)
}

/// Draws one sample from `N(mean, std_dev^2)`.
#[inline]
pub fn sample_gaussian<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let unit: f64 = rng.sample(StandardNormal);
    mean + unit * std_dev
}

/// Draws one sample uniformly from `[low, high)`.
#[inline]
pub fn sample_uniform<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    low + rng.random::<f64>() * (high - low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_normalize_angle_identity() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(1.0), 1.0);
        assert_relative_eq!(normalize_angle(-1.0), -1.0);
    }

    #[test]
    fn test_normalize_angle_wraps() {
        assert_relative_eq!(normalize_angle(TAU + 0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-TAU - 0.5), -0.5, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(5.0 * TAU + 0.25), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_wrap_positive_range() {
        for raw in [-10.0, -PI, -0.1, 0.0, 0.1, PI, 10.0, 100.0] {
            let w = wrap_positive(raw);
            assert!((0.0..TAU).contains(&w), "wrap_positive({raw}) = {w}");
        }
        assert_relative_eq!(wrap_positive(-0.1), TAU - 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_diff_across_seam() {
        let d = angle_diff(PI - 0.1, -PI + 0.1);
        assert_relative_eq!(d, -0.2, epsilon = 1e-10);
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = StdRng::seed_from_u64(17);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| sample_gaussian(&mut rng, 3.0, 0.5)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n as f64;
        assert!((mean - 3.0).abs() < 0.02, "sample mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.02, "sample std {}", var.sqrt());
    }

    #[test]
    fn test_gaussian_zero_std_is_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..8 {
            assert_relative_eq!(sample_gaussian(&mut rng, 2.5, 0.0), 2.5);
        }
    }

    #[test]
    fn test_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            let s = sample_uniform(&mut rng, -2.0, 5.0);
            assert!((-2.0..5.0).contains(&s), "sample {s} out of range");
        }
    }

    #[test]
    fn test_uniform_empty_range_is_low() {
        let mut rng = StdRng::seed_from_u64(4);
        assert_relative_eq!(sample_uniform(&mut rng, 7.0, 7.0), 7.0);
    }

    #[test]
    fn test_seeded_replay_matches() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..32 {
            assert_eq!(sample_gaussian(&mut a, 0.0, 1.0), sample_gaussian(&mut b, 0.0, 1.0));
        }
    }
}
