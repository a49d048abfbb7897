//! Compiling workload sources on demand

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use lockbench_core::{BenchError, BenchResult, Variant, WorkloadBuilder};

/// Compiles a variant's C source with `-O2 -pthread` when its executable is
/// missing or older than the source
pub struct GccBuilder {
    compiler: String,
    workdir: PathBuf,
}

impl GccBuilder {
    /// Create a builder resolving variant paths against `workdir`
    pub fn new(compiler: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            workdir: workdir.into(),
        }
    }

    fn compile(&self, variant: &Variant, source: &Path, artifact: &Path) -> BenchResult<()> {
        let mut cmd = Command::new(&self.compiler);
        cmd.arg("-O2")
            .arg("-pthread")
            .arg(source)
            .arg("-o")
            .arg(artifact);
        tracing::info!("Compiling: {:?}", cmd);

        let output = cmd.output().map_err(|e| BenchError::Build {
            variant: variant.name.clone(),
            message: format!("could not start {}: {e}", self.compiler),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("{} failed for {}:\n{}", self.compiler, variant.name, stderr.trim_end());
            return Err(BenchError::Build {
                variant: variant.name.clone(),
                message: output.status.to_string(),
            });
        }

        Ok(())
    }
}

impl WorkloadBuilder for GccBuilder {
    fn ensure_built(&self, variant: &Variant) -> BenchResult<()> {
        let source = self.workdir.join(&variant.source);
        let artifact = self.workdir.join(&variant.artifact);

        let stale = needs_rebuild(&source, &artifact).map_err(|e| BenchError::Build {
            variant: variant.name.clone(),
            message: format!("cannot stat {}: {e}", source.display()),
        })?;

        if stale {
            self.compile(variant, &source, &artifact)?;
        } else {
            tracing::debug!(variant = %variant.name, "artifact up to date");
        }
        Ok(())
    }
}

/// Whether `artifact` is missing or strictly older than `source`
pub fn needs_rebuild(source: &Path, artifact: &Path) -> io::Result<bool> {
    let source_mtime = fs::metadata(source)?.modified()?;
    match fs::metadata(artifact) {
        Ok(meta) => Ok(meta.modified()? < source_mtime),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}
