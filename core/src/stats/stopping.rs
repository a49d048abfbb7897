//! Per-cell stopping rule

use super::estimate;

/// Whether `samples` bound the mean within `relative_error_target`.
///
/// Fewer than two samples never converge.
pub fn is_converged(samples: &[f64], relative_error_target: f64) -> bool {
    if samples.len() < 2 {
        return false;
    }
    estimate(samples).relative_error <= relative_error_target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_two_samples() {
        assert!(!is_converged(&[], 0.05));
        assert!(!is_converged(&[1.0], 0.05));
        assert!(!is_converged(&[1.0], f64::INFINITY));
    }

    #[test]
    fn test_constant_samples_converge_for_any_target() {
        for target in [0.0, 0.05, 1.0] {
            assert!(is_converged(&[10.0, 10.0], target));
        }
    }

    #[test]
    fn test_noisy_samples_need_looser_target() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(!is_converged(&samples, 0.05));
        assert!(is_converged(&samples, 0.7));
    }

    #[test]
    fn test_tight_samples_converge() {
        let samples = [1.00, 1.01, 0.99, 1.00, 1.02, 0.98];
        assert!(is_converged(&samples, 0.05));
    }

    #[test]
    fn test_zero_mean_never_converges() {
        assert!(!is_converged(&[0.0, 0.0, 0.0], 0.05));
        assert!(!is_converged(&[0.0, 0.0], f64::MAX));
    }
}
