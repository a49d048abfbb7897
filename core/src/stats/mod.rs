//! Confidence-interval estimation and the per-cell stopping rule
//!
//! A cell's mean is considered trustworthy once the half-width of its 95%
//! Student's t confidence interval is within a target fraction of the mean.

mod estimator;
mod stopping;

pub use estimator::{estimate, t_critical_95, Estimate, Z_CRITICAL_95};
pub use stopping::is_converged;
