//! Collaborator traits for building and running workloads
//!
//! These traits are defined in core so the scheduler can be driven by fake
//! collaborators in tests. Process-backed implementations live in the binary.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::{CaseConfig, Variant};
use crate::error::BenchResult;
use crate::matrix::Level;

/// Timings from one invocation of a workload: seconds per concurrency level
pub type Observation = BTreeMap<Level, f64>;

/// Produces an executable for a variant
pub trait WorkloadBuilder: Send + Sync {
    /// Make sure the variant's artifact exists and is current.
    ///
    /// A failure here is a [`crate::BenchError::Build`] and aborts the run.
    fn ensure_built(&self, variant: &Variant) -> BenchResult<()>;
}

/// Runs one observation round of a variant
#[async_trait]
pub trait WorkloadRunner: Send + Sync {
    /// Invoke the variant's workload once under `case` and return one
    /// elapsed-time sample for every level it swept.
    async fn observe(&self, variant: &Variant, case: &CaseConfig) -> BenchResult<Observation>;
}

/// Builder for workloads that are already compiled
#[derive(Debug, Default, Clone, Copy)]
pub struct Prebuilt;

impl WorkloadBuilder for Prebuilt {
    fn ensure_built(&self, _variant: &Variant) -> BenchResult<()> {
        Ok(())
    }
}
