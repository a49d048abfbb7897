//! Scheduler executor: the round loop

use tracing::{debug, info, warn};

use crate::config::{CaseConfig, ConvergenceConfig, Variant};
use crate::error::{BenchError, BenchResult};
use crate::matrix::{CellMatrix, Level};
use crate::stats::estimate;
use crate::traits::{Observation, WorkloadRunner};

use super::{ScheduleOutcome, SchedulerState, Termination};

/// Drives external observation rounds until every cell converges or the
/// round cap is reached
///
/// The scheduler owns the case's [`CellMatrix`] exclusively; rounds run
/// strictly one after another.
pub struct SamplingScheduler<'a, R: WorkloadRunner + ?Sized> {
    config: ConvergenceConfig,
    variants: &'a [Variant],
    runner: &'a R,
    matrix: CellMatrix,
    state: SchedulerState,
    rounds: usize,
    variant_rounds: Vec<usize>,
}

impl<'a, R: WorkloadRunner + ?Sized> SamplingScheduler<'a, R> {
    /// Create a scheduler with an empty matrix over `variants` x `levels`
    pub fn new(
        config: ConvergenceConfig,
        variants: &'a [Variant],
        levels: &[Level],
        runner: &'a R,
    ) -> BenchResult<Self> {
        config.validate()?;
        let matrix = CellMatrix::new(variants.iter().map(|v| v.name.clone()), levels)?;

        Ok(Self {
            config,
            variants,
            runner,
            matrix,
            state: SchedulerState::Initializing,
            rounds: 0,
            variant_rounds: vec![0; variants.len()],
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Sample histories collected so far
    pub fn matrix(&self) -> &CellMatrix {
        &self.matrix
    }

    /// Rounds completed so far
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run rounds until a terminal state is reached
    pub async fn run(mut self, case: &CaseConfig) -> BenchResult<ScheduleOutcome> {
        while !self.state.is_terminal() {
            self.step(case).await?;
        }
        Ok(self.into_outcome())
    }

    /// Advance by at most one round and return the resulting state.
    ///
    /// A failed invocation leaves the matrix untouched for that round; the
    /// caller is expected to discard the scheduler.
    pub async fn step(&mut self, case: &CaseConfig) -> BenchResult<SchedulerState> {
        match self.state {
            SchedulerState::Converged | SchedulerState::Capped => return Ok(self.state),
            SchedulerState::Initializing => self.transition(SchedulerState::Sampling),
            SchedulerState::Sampling => {}
        }

        let target = self.config.relative_error_target;
        let pending = self.pending_indices(target);

        if pending.is_empty() {
            info!(rounds = self.rounds, "all cells converged");
            self.transition(SchedulerState::Converged);
            return Ok(self.state);
        }

        if self.rounds >= self.config.max_rounds {
            warn!(
                max_rounds = self.config.max_rounds,
                "round cap reached; some cells may not meet the {:.1}% target",
                target * 100.0
            );
            for cell in self.matrix.unconverged_cells(target) {
                warn!(
                    variant = %cell.variant,
                    threads = cell.level,
                    n = cell.sample_count,
                    "still at {:.2}% relative error",
                    cell.relative_error * 100.0
                );
            }
            self.transition(SchedulerState::Capped);
            return Ok(self.state);
        }

        self.rounds += 1;
        info!(
            round = self.rounds,
            pending = ?pending.iter().map(|&i| self.variants[i].name.as_str()).collect::<Vec<_>>(),
            "starting round"
        );

        // Collect the whole round before recording so a failure leaves no partial round behind
        let mut observations = Vec::with_capacity(pending.len());
        for &idx in &pending {
            let variant = &self.variants[idx];
            let observation = self.runner.observe(variant, case).await?;
            self.check_observation(variant, &observation)?;
            observations.push((idx, observation));
        }

        for (idx, observation) in observations {
            let name = &self.variants[idx].name;
            for (level, seconds) in observation {
                self.matrix.record(name, level, seconds);
                let est = estimate(self.matrix.samples(name, level));
                info!(
                    variant = %name,
                    threads = level,
                    n = est.sample_count,
                    "mean={:.6}s rel_err={:.2}%",
                    est.mean,
                    est.relative_error * 100.0
                );
            }
            self.variant_rounds[idx] += 1;
        }

        Ok(self.state)
    }

    fn pending_indices(&self, target: f64) -> Vec<usize> {
        let pending = self.matrix.pending_variants(target);
        self.variants
            .iter()
            .enumerate()
            .filter(|(_, v)| pending.contains(&v.name.as_str()))
            .map(|(idx, _)| idx)
            .collect()
    }

    fn check_observation(&self, variant: &Variant, observation: &Observation) -> BenchResult<()> {
        let fail = |message: String| BenchError::Execution {
            variant: variant.name.clone(),
            message,
        };

        for level in self.matrix.levels() {
            if !observation.contains_key(level) {
                return Err(fail(format!("no timing reported for {level} threads")));
            }
        }

        for (&level, &seconds) in observation {
            if !self.matrix.contains(&variant.name, level) {
                return Err(fail(format!("unexpected thread count {level}")));
            }
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(fail(format!(
                    "invalid time {seconds} for {level} threads"
                )));
            }
        }

        Ok(())
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!(from = ?self.state, to = ?next, "scheduler transition");
        self.state = next;
    }

    fn into_outcome(self) -> ScheduleOutcome {
        let target = self.config.relative_error_target;
        let termination = match self.state {
            SchedulerState::Capped => Termination::Capped {
                unconverged: self.matrix.unconverged_cells(target),
            },
            _ => Termination::Converged,
        };

        let variant_rounds = self
            .variants
            .iter()
            .map(|v| v.name.clone())
            .zip(self.variant_rounds)
            .collect();

        ScheduleOutcome {
            matrix: self.matrix,
            termination,
            rounds: self.rounds,
            variant_rounds,
        }
    }
}
