//! Convergence-driven sampling loop
//!
//! The scheduler decides, round by round, which variants still need samples:
//! - A variant is re-run while any of its cells misses the relative error target
//! - One run of a variant yields one sample for every level at once
//! - The loop stops when every cell converges or the round cap is hit
//!
//! # Example
//!
//! ```ignore
//! use lockbench_core::{CaseConfig, ConvergenceConfig, SamplingScheduler, Variant};
//!
//! let variants = Variant::defaults();
//! let mut scheduler = SamplingScheduler::new(ConvergenceConfig::default(), &variants, &[1, 2, 4, 8], &runner)?;
//! let outcome = scheduler.run(&CaseConfig::predefined()[0]).await?;
//! ```

mod executor;

pub use executor::SamplingScheduler;

use serde::{Deserialize, Serialize};

use crate::matrix::{CellMatrix, UnconvergedCell};

/// Lifecycle of one scheduler run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Matrix built, no round started
    Initializing,
    /// Round loop in progress
    Sampling,
    /// Every cell met the target
    Converged,
    /// Round cap reached with cells still unconverged
    Capped,
}

impl SchedulerState {
    /// Whether the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, SchedulerState::Converged | SchedulerState::Capped)
    }
}

/// How a scheduler run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Termination {
    /// Every cell met the target
    Converged,
    /// The round cap was reached; these cells are reported best-effort
    Capped {
        /// Cells still above the target, in report order
        unconverged: Vec<UnconvergedCell>,
    },
}

impl Termination {
    /// Whether every cell met the target
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Converged)
    }

    /// Cells still above the target (empty when converged)
    pub fn unconverged(&self) -> &[UnconvergedCell] {
        match self {
            Termination::Converged => &[],
            Termination::Capped { unconverged } => unconverged,
        }
    }
}

/// Result of a scheduler run
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// Final sample histories
    pub matrix: CellMatrix,

    /// How the run ended
    pub termination: Termination,

    /// Rounds in which at least one variant was invoked
    pub rounds: usize,

    /// Invocations per variant, in declaration order
    pub variant_rounds: Vec<(String, usize)>,
}
