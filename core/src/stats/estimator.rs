//! Sample mean and 95% confidence margin

use serde::{Deserialize, Serialize};

/// Two-sided 95% critical values of Student's t, indexed by `df - 1`
const T_CRITICAL_95: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, // df 1-10
    2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, // df 11-20
    2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042, // df 21-30
];

/// Normal approximation used once the t table runs out (df > 30)
pub const Z_CRITICAL_95: f64 = 1.96;

/// Derived view of a sample sequence at a point in time
///
/// Always recomputed from the samples; never stored on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Number of samples the estimate was computed from
    pub sample_count: usize,

    /// Arithmetic mean
    pub mean: f64,

    /// Unbiased sample standard deviation (0 for a single sample)
    pub std_dev: f64,

    /// Half-width of the 95% confidence interval
    pub margin: f64,

    /// `margin / mean`
    pub relative_error: f64,
}

impl Estimate {
    /// Whether the confidence interval is finite
    pub fn is_bounded(&self) -> bool {
        self.relative_error.is_finite()
    }
}

/// Two-sided 95% critical value for a sample of size `n` (`n - 1` degrees of freedom)
///
/// Infinite for `n <= 1`, where no interval can be formed.
pub fn t_critical_95(n: usize) -> f64 {
    if n <= 1 {
        return f64::INFINITY;
    }
    T_CRITICAL_95
        .get(n - 2)
        .copied()
        .unwrap_or(Z_CRITICAL_95)
}

/// Estimate the mean of `samples` with a 95% confidence margin.
///
/// A single sample yields infinite margin and relative error. A zero mean
/// yields infinite relative error.
///
/// # Panics
///
/// Panics if `samples` is empty.
pub fn estimate(samples: &[f64]) -> Estimate {
    assert!(!samples.is_empty(), "cannot estimate an empty sample sequence");

    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;

    if n == 1 {
        return Estimate {
            sample_count: 1,
            mean,
            std_dev: 0.0,
            margin: f64::INFINITY,
            relative_error: f64::INFINITY,
        };
    }

    // Summing rounds, so identical samples would leak a spurious non-zero spread
    let first = samples[0];
    if samples.iter().all(|&x| x == first) {
        return Estimate {
            sample_count: n,
            mean: first,
            std_dev: 0.0,
            margin: 0.0,
            relative_error: if first != 0.0 { 0.0 } else { f64::INFINITY },
        };
    }

    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    let margin = t_critical_95(n) * std_dev / (n as f64).sqrt();
    let relative_error = if mean != 0.0 {
        margin / mean
    } else {
        f64::INFINITY
    };

    Estimate {
        sample_count: n,
        mean,
        std_dev,
        margin,
        relative_error,
    }
}
