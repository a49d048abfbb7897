//! Running a compiled workload and collecting its timings

use std::path::PathBuf;

use async_trait::async_trait;
use indicatif::ProgressBar;
use lockbench_core::{BenchError, BenchResult, CaseConfig, Observation, Variant, WorkloadRunner};
use tokio::process::Command;

use super::results::read_results;

/// Runs `<artifact> <member> <insert> <delete>` in the work directory and
/// reads back the variant's result file
pub struct ProcessRunner {
    workdir: PathBuf,
    progress: Option<ProgressBar>,
}

impl ProcessRunner {
    /// Create a runner resolving variant paths against `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            progress: None,
        }
    }

    /// Report each invocation on a progress spinner
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[async_trait]
impl WorkloadRunner for ProcessRunner {
    async fn observe(&self, variant: &Variant, case: &CaseConfig) -> BenchResult<Observation> {
        let exe = self.workdir.join(&variant.artifact);
        let exe = exe.canonicalize().unwrap_or(exe);
        let args: Vec<String> = case.probabilities().iter().map(|p| p.to_string()).collect();

        if let Some(pb) = &self.progress {
            pb.set_message(format!("case {} / {}", case.id, variant.name));
            pb.inc(1);
        }
        tracing::debug!("Running {} {}", exe.display(), args.join(" "));

        // A file left by the previous round must never be read as this round's
        let results = self.workdir.join(&variant.results_file);
        match std::fs::remove_file(&results) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let output = Command::new(&exe)
            .args(&args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| BenchError::Execution {
                variant: variant.name.clone(),
                message: format!("could not start {}: {e}", exe.display()),
            })?;

        if !output.status.success() {
            tracing::error!(
                "{} exited with {}\nstdout:\n{}\nstderr:\n{}",
                variant.name,
                output.status,
                String::from_utf8_lossy(&output.stdout).trim_end(),
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
            return Err(BenchError::Execution {
                variant: variant.name.clone(),
                message: output.status.to_string(),
            });
        }

        read_results(&results)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    fn script(dir: &Path, name: &str, body: &str) -> Variant {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        Variant::new(name, name, format!("{name}.c"), name, format!("results-{name}.csv"))
    }

    #[tokio::test]
    async fn test_observe_reads_result_file() {
        let dir = tempdir().unwrap();
        let variant = script(
            dir.path(),
            "fake",
            r#"printf 'Threads,Time\n1,0.4\n2,0.3\n' > results-fake.csv
echo "$1 $2 $3" > args.txt"#,
        );

        let runner = ProcessRunner::new(dir.path());
        let case = CaseConfig::new(2, 0.9, 0.05, 0.05);
        let observation = runner.observe(&variant, &case).await.unwrap();

        assert_eq!(observation[&1], 0.4);
        assert_eq!(observation[&2], 0.3);
        let args = fs::read_to_string(dir.path().join("args.txt")).unwrap();
        assert_eq!(args.trim(), "0.9 0.05 0.05");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_execution_failure() {
        let dir = tempdir().unwrap();
        let variant = script(dir.path(), "crash", "exit 3");

        let runner = ProcessRunner::new(dir.path());
        let err = runner
            .observe(&variant, &CaseConfig::predefined()[0])
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Execution { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_missing_result_file_is_parse_failure() {
        let dir = tempdir().unwrap();
        let variant = script(dir.path(), "silent", "exit 0");

        let runner = ProcessRunner::new(dir.path());
        let err = runner
            .observe(&variant, &CaseConfig::predefined()[0])
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::ResultParse { .. }));
    }

    #[tokio::test]
    async fn test_previous_round_results_are_not_reused() {
        let dir = tempdir().unwrap();
        let variant = script(
            dir.path(),
            "once",
            r#"if [ ! -f ran.txt ]; then
  touch ran.txt
  printf 'Threads,Time\n1,0.4\n' > results-once.csv
fi"#,
        );

        let runner = ProcessRunner::new(dir.path());
        let case = CaseConfig::predefined()[1].clone();
        let first = runner.observe(&variant, &case).await.unwrap();
        assert_eq!(first[&1], 0.4);

        let err = runner.observe(&variant, &case).await.unwrap_err();
        assert!(matches!(err, BenchError::ResultParse { .. }));
        assert!(!dir.path().join("results-once.csv").exists());
    }

    #[tokio::test]
    async fn test_unremovable_result_path_is_io_failure() {
        let dir = tempdir().unwrap();
        let variant = script(dir.path(), "blocked", "exit 0");
        // A directory in place of the result file cannot be removed as a file
        fs::create_dir(dir.path().join("results-blocked.csv")).unwrap();

        let runner = ProcessRunner::new(dir.path());
        let err = runner
            .observe(&variant, &CaseConfig::predefined()[0])
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Io(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_missing_executable_is_execution_failure() {
        let dir = tempdir().unwrap();
        let variant = Variant::defaults().remove(1);

        let runner = ProcessRunner::new(dir.path());
        let err = runner
            .observe(&variant, &CaseConfig::predefined()[2])
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Execution { .. }));
    }
}
