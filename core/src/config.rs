//! Experiment configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::matrix::Level;

/// Two-sided confidence level used by the stopping rule
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Thread counts swept by the workloads in one invocation
pub const DEFAULT_LEVELS: [Level; 4] = [1, 2, 4, 8];

const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Convergence configuration
///
/// Controls when the sampling scheduler considers a cell's mean trustworthy
/// and how many rounds it may spend trying to get there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Largest acceptable ratio of confidence margin to mean
    pub relative_error_target: f64,

    /// Confidence level of the interval (fixed at 95% two-sided)
    pub confidence_level: f64,

    /// Upper bound on scheduler rounds per case
    pub max_rounds: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            relative_error_target: 0.05,
            confidence_level: CONFIDENCE_LEVEL,
            max_rounds: 200,
        }
    }
}

impl ConvergenceConfig {
    /// Set the relative error target
    pub fn with_relative_error_target(mut self, target: f64) -> Self {
        self.relative_error_target = target;
        self
    }

    /// Set the round cap
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.relative_error_target.is_finite() || self.relative_error_target <= 0.0 {
            return Err(ConfigError::InvalidTarget(format!(
                "relative error target must be a positive number, got {}",
                self.relative_error_target
            )));
        }

        if (self.confidence_level - CONFIDENCE_LEVEL).abs() > f64::EPSILON {
            return Err(ConfigError::InvalidTarget(format!(
                "only a {CONFIDENCE_LEVEL} confidence level is supported, got {}",
                self.confidence_level
            )));
        }

        if self.max_rounds == 0 {
            return Err(ConfigError::InvalidRoundCap(
                "max rounds must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// One workload-probability scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseConfig {
    /// Case identifier used in output file names
    pub id: u32,

    /// Probability of a member lookup
    pub member: f64,

    /// Probability of an insert
    pub insert: f64,

    /// Probability of a delete
    pub delete: f64,
}

impl CaseConfig {
    /// Create a new case
    pub fn new(id: u32, member: f64, insert: f64, delete: f64) -> Self {
        Self {
            id,
            member,
            insert,
            delete,
        }
    }

    /// The three scenarios run by default, read-heavy first
    pub fn predefined() -> Vec<CaseConfig> {
        vec![
            CaseConfig::new(1, 0.99, 0.005, 0.005),
            CaseConfig::new(2, 0.90, 0.05, 0.05),
            CaseConfig::new(3, 0.50, 0.25, 0.25),
        ]
    }

    /// Probabilities in the order the workloads expect them on the command line
    pub fn probabilities(&self) -> [f64; 3] {
        [self.member, self.insert, self.delete]
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, p) in [
            ("member", self.member),
            ("insert", self.insert),
            ("delete", self.delete),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidProbability(format!(
                    "case {}: {name} probability {p} is outside [0, 1]",
                    self.id
                )));
            }
        }

        let sum: f64 = self.probabilities().iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ConfigError::InvalidProbability(format!(
                "case {}: probabilities sum to {sum}, expected 1.0",
                self.id
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for CaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Case {}: member={} insert={} delete={}",
            self.id, self.member, self.insert, self.delete
        )
    }
}

/// A synchronization strategy under comparison, and where its workload lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Identifier used in tables and logs
    pub name: String,

    /// Human-readable name used in chart legends
    pub label: String,

    /// Workload source file, relative to the work directory
    pub source: PathBuf,

    /// Compiled executable, relative to the work directory
    pub artifact: PathBuf,

    /// CSV the workload writes its per-thread timings to
    pub results_file: PathBuf,
}

impl Variant {
    /// Create a new variant
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        source: impl Into<PathBuf>,
        artifact: impl Into<PathBuf>,
        results_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            source: source.into(),
            artifact: artifact.into(),
            results_file: results_file.into(),
        }
    }

    /// The two linked-list workloads: one global mutex, and a read-write lock
    pub fn defaults() -> Vec<Variant> {
        let exe = std::env::consts::EXE_SUFFIX;
        vec![
            Variant::new(
                "one_mutex",
                "One Mutex",
                "one_mutex_linkedList.c",
                format!("one_mutex{exe}"),
                "results-one_mutex.csv",
            ),
            Variant::new(
                "rw_lock",
                "Read-Write Lock",
                "read-write_lock.c",
                format!("read_write_lock{exe}"),
                "results-read-write_lock.csv",
            ),
        ]
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid relative error target or confidence level
    #[error("Invalid convergence target: {0}")]
    InvalidTarget(String),

    /// Invalid round cap
    #[error("Invalid round cap: {0}")]
    InvalidRoundCap(String),

    /// Invalid case probabilities
    #[error("Invalid probability: {0}")]
    InvalidProbability(String),

    /// Invalid variant or level set
    #[error("Invalid matrix layout: {0}")]
    InvalidLayout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_convergence_config() {
        let config = ConvergenceConfig::default();
        assert_eq!(config.relative_error_target, 0.05);
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.max_rounds, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_convergence_config_builder_pattern() {
        let config = ConvergenceConfig::default()
            .with_relative_error_target(0.02)
            .with_max_rounds(50);

        assert_eq!(config.relative_error_target, 0.02);
        assert_eq!(config.max_rounds, 50);
    }

    #[test]
    fn test_convergence_config_validation() {
        let config = ConvergenceConfig::default().with_max_rounds(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRoundCap(_))
        ));

        let config = ConvergenceConfig::default().with_relative_error_target(0.0);
        assert!(config.validate().is_err());

        let config = ConvergenceConfig::default().with_relative_error_target(f64::NAN);
        assert!(config.validate().is_err());

        let config = ConvergenceConfig {
            confidence_level: 0.99,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_predefined_cases_are_valid() {
        let cases = CaseConfig::predefined();
        assert_eq!(cases.len(), 3);
        assert_eq!(
            cases.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        for case in &cases {
            assert!(case.validate().is_ok(), "{case} should be valid");
        }
        assert_eq!(cases[0].member, 0.99);
    }

    #[test]
    fn test_case_validation_rejects_bad_probabilities() {
        let case = CaseConfig::new(9, -0.99, 0.005, 0.005);
        assert!(matches!(
            case.validate(),
            Err(ConfigError::InvalidProbability(_))
        ));

        let case = CaseConfig::new(9, 0.5, 0.25, 0.5);
        assert!(case.validate().is_err());
    }

    #[test]
    fn test_case_display() {
        let case = CaseConfig::new(2, 0.9, 0.05, 0.05);
        assert_eq!(case.to_string(), "Case 2: member=0.9 insert=0.05 delete=0.05");
    }

    #[test]
    fn test_default_variants_in_declaration_order() {
        let variants = Variant::defaults();
        let names: Vec<_> = variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["one_mutex", "rw_lock"]);
        assert_eq!(
            variants[1].results_file,
            PathBuf::from("results-read-write_lock.csv")
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = ConvergenceConfig::default().with_max_rounds(25);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ConvergenceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.max_rounds, 25);

        let case = CaseConfig::new(3, 0.5, 0.25, 0.25);
        let json = serde_json::to_string(&case).unwrap();
        let deserialized: CaseConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, case);
    }
}
