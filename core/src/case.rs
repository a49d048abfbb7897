//! Per-case driver: build, sample to convergence, aggregate

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::aggregator::{aggregate, mean_series, MeanSeries, ReportRow};
use crate::config::{CaseConfig, ConvergenceConfig, Variant, DEFAULT_LEVELS};
use crate::error::BenchResult;
use crate::matrix::Level;
use crate::scheduler::{SamplingScheduler, Termination};
use crate::traits::{WorkloadBuilder, WorkloadRunner};

/// Everything reported for one case
#[derive(Debug, Clone)]
pub struct CaseReport {
    /// The scenario that was run
    pub case: CaseConfig,

    /// Variants in report order
    pub variants: Vec<Variant>,

    /// One row per (variant, level)
    pub rows: Vec<ReportRow>,

    /// Whether every cell converged
    pub termination: Termination,

    /// Scheduler rounds used
    pub rounds: usize,

    /// Invocations per variant
    pub variant_rounds: Vec<(String, usize)>,

    /// Wall-clock time spent on the case
    pub elapsed: Duration,
}

impl CaseReport {
    /// Mean time per level for each variant
    pub fn mean_series(&self) -> Vec<MeanSeries> {
        mean_series(&self.rows)
    }

    /// Chart legend label for a variant identifier
    pub fn label_of<'a>(&'a self, variant: &'a str) -> &'a str {
        self.variants
            .iter()
            .find(|v| v.name == variant)
            .map(|v| v.label.as_str())
            .unwrap_or(variant)
    }
}

/// Runs the sampling scheduler once per case
pub struct CaseRunner {
    convergence: ConvergenceConfig,
    variants: Vec<Variant>,
    levels: Vec<Level>,
    builder: Arc<dyn WorkloadBuilder>,
    runner: Arc<dyn WorkloadRunner>,
}

impl CaseRunner {
    /// Create a runner over the given variants and the default levels
    pub fn new(
        convergence: ConvergenceConfig,
        variants: Vec<Variant>,
        builder: Arc<dyn WorkloadBuilder>,
        runner: Arc<dyn WorkloadRunner>,
    ) -> Self {
        Self {
            convergence,
            variants,
            levels: DEFAULT_LEVELS.to_vec(),
            builder,
            runner,
        }
    }

    /// Set the concurrency levels the workloads sweep
    pub fn with_levels(mut self, levels: &[Level]) -> Self {
        self.levels = levels.to_vec();
        self
    }

    /// Variants in report order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Run one case to convergence (or the round cap) and aggregate it.
    ///
    /// Build failures and execution failures are returned as errors; a failed
    /// case produces no report.
    pub async fn run_case(&self, case: &CaseConfig) -> BenchResult<CaseReport> {
        case.validate()?;
        info!("=== {case} ===");
        let started = Instant::now();

        for variant in &self.variants {
            self.builder.ensure_built(variant)?;
        }

        let scheduler = SamplingScheduler::new(
            self.convergence.clone(),
            &self.variants,
            &self.levels,
            self.runner.as_ref(),
        )?;
        let outcome = scheduler.run(case).await?;

        let rows = aggregate(&outcome.matrix, self.convergence.relative_error_target);
        let elapsed = started.elapsed();
        info!(
            case = case.id,
            rounds = outcome.rounds,
            converged = outcome.termination.is_converged(),
            "case finished in {:.2}s",
            elapsed.as_secs_f64()
        );

        Ok(CaseReport {
            case: case.clone(),
            variants: self.variants.clone(),
            rows,
            termination: outcome.termination,
            rounds: outcome.rounds,
            variant_rounds: outcome.variant_rounds,
            elapsed,
        })
    }
}
