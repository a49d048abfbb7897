//! Error types for lockbench-core

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type
///
/// Only failures at the external boundary (compiling or running a workload)
/// are represented here. Reaching the round cap is not an error; it is reported
/// through [`crate::scheduler::Termination::Capped`].
#[derive(Error, Debug)]
pub enum BenchError {
    /// Compiling a workload exited non-zero or could not be started
    #[error("build of '{variant}' failed: {message}")]
    Build {
        /// Variant whose build failed
        variant: String,
        /// Compiler status or diagnostic
        message: String,
    },

    /// Running a workload exited non-zero or returned an unusable round
    #[error("execution of '{variant}' failed: {message}")]
    Execution {
        /// Variant whose execution failed
        variant: String,
        /// Exit status or validation failure
        message: String,
    },

    /// The result file written by a workload was missing or malformed
    #[error("could not read results from {}: {message}", .path.display())]
    ResultParse {
        /// Result file that was read
        path: PathBuf,
        /// Parse failure
        message: String,
    },

    /// Configuration rejected by validation
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Whether this error must abort every remaining case, not just the current one
    pub fn is_fatal(&self) -> bool {
        matches!(self, BenchError::Build { .. } | BenchError::Config(_))
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
