//! lockbench-core: Convergence-driven sampling engine
//!
//! This crate decides how many times each external workload must be run
//! before its mean execution time can be reported with confidence:
//!
//! - Estimation of mean and 95% Student's t confidence margin
//! - The per-cell stopping rule
//! - The (variant x thread count) cell matrix
//! - The round scheduler and the per-case driver
//! - Aggregation into report rows
//!
//! Process and filesystem collaborators are abstracted behind
//! [`WorkloadBuilder`] and [`WorkloadRunner`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod case;
pub mod config;
pub mod error;
pub mod matrix;
pub mod scheduler;
pub mod stats;
pub mod traits;

pub use aggregator::{aggregate, mean_series, MeanSeries, ReportRow};
pub use case::{CaseReport, CaseRunner};
pub use config::{CaseConfig, ConfigError, ConvergenceConfig, Variant, DEFAULT_LEVELS};
pub use error::{BenchError, BenchResult};
pub use matrix::{CellMatrix, CellSnapshot, Level, UnconvergedCell};
pub use scheduler::{SamplingScheduler, ScheduleOutcome, SchedulerState, Termination};
pub use stats::{estimate, is_converged, t_critical_95, Estimate};
pub use traits::{Observation, Prebuilt, WorkloadBuilder, WorkloadRunner};
