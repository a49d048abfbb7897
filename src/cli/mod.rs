//! CLI argument parsing and case dispatch

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lockbench_core::{
    CaseConfig, CaseReport, CaseRunner, ConvergenceConfig, Prebuilt, Variant, WorkloadBuilder,
};
use lockbench_report::{CsvExporter, JsonExporter, LinePlotter};

use crate::workload::{GccBuilder, ProcessRunner};

/// lockbench - sample concurrent linked-list workloads until their mean times converge
#[derive(Parser, Debug)]
#[command(name = "lockbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the workload sources; executables and result files land here too
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Directory for aggregated tables and charts
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// C compiler used to build the workloads
    #[arg(long, env = "CC", default_value = "gcc")]
    pub compiler: String,

    /// Skip compilation and run the existing executables
    #[arg(long)]
    pub no_build: bool,

    /// Target ratio of 95% confidence margin to mean
    #[arg(short, long, default_value = "0.05")]
    pub target: f64,

    /// Maximum sampling rounds per case
    #[arg(short, long, default_value = "200")]
    pub max_rounds: usize,

    /// Only run these predefined cases (repeatable)
    #[arg(short, long = "case", value_name = "ID")]
    pub cases: Vec<u32>,

    /// Do not render charts
    #[arg(long)]
    pub no_plot: bool,

    /// Also export a JSON summary per case
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Run every selected case in sequence and export its results
    pub async fn run(&self) -> Result<()> {
        let started = Instant::now();
        let convergence = ConvergenceConfig::default()
            .with_relative_error_target(self.target)
            .with_max_rounds(self.max_rounds);
        convergence.validate()?;
        let cases = self.selected_cases()?;

        println!("\n{}", "=".repeat(70));
        println!("   lockbench - Adaptive Lock Benchmark");
        println!("{}", "=".repeat(70));
        println!();
        println!("Configuration:");
        println!("  Work dir:     {}", self.workdir.display());
        println!("  Output dir:   {}", self.output_dir.display());
        println!("  Target:       {:.1}% relative error at 95% confidence", self.target * 100.0);
        println!("  Max rounds:   {}", self.max_rounds);
        println!(
            "  Cases:        {}",
            cases.iter().map(|c| c.id.to_string()).collect::<Vec<_>>().join(", ")
        );
        println!("{}", "=".repeat(70));
        println!();

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.output_dir.display())
        })?;

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} runs {msg}")?,
        );
        progress.enable_steady_tick(Duration::from_millis(120));

        let builder: Arc<dyn WorkloadBuilder> = if self.no_build {
            Arc::new(Prebuilt)
        } else {
            Arc::new(GccBuilder::new(self.compiler.clone(), self.workdir.clone()))
        };
        let runner = ProcessRunner::new(self.workdir.clone()).with_progress(progress.clone());
        let case_runner =
            CaseRunner::new(convergence, Variant::defaults(), builder, Arc::new(runner));

        let mut reports = Vec::new();
        let mut failed = Vec::new();
        for case in &cases {
            match case_runner.run_case(case).await {
                Ok(report) => {
                    progress.suspend(|| self.print_report(&report));
                    progress.suspend(|| self.export(&report))?;
                    reports.push(report);
                }
                Err(e) if e.is_fatal() => {
                    progress.abandon();
                    return Err(e).with_context(|| format!("{case} aborted the run"));
                }
                Err(e) => {
                    tracing::error!("{case} aborted, results discarded: {e}");
                    failed.push(case.id);
                }
            }
        }
        progress.finish_and_clear();

        if !reports.is_empty() {
            let path = self.output_dir.join("run_summary.csv");
            CsvExporter::export_runs(&reports, &path)
                .with_context(|| format!("Failed to export run summary to: {}", path.display()))?;
            println!("✓ Run summary: {}", path.display());
        }

        if !failed.is_empty() {
            anyhow::bail!("{} case(s) failed: {:?}", failed.len(), failed);
        }

        println!(
            "All cases complete in {:.2}s.",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Predefined cases, narrowed to `--case` ids when given
    fn selected_cases(&self) -> Result<Vec<CaseConfig>> {
        let all = CaseConfig::predefined();
        if self.cases.is_empty() {
            return Ok(all);
        }

        for id in &self.cases {
            if !all.iter().any(|c| c.id == *id) {
                anyhow::bail!("Unknown case: {}. Available cases are 1, 2 and 3", id);
            }
        }
        Ok(all
            .into_iter()
            .filter(|c| self.cases.contains(&c.id))
            .collect())
    }

    fn export(&self, report: &CaseReport) -> Result<()> {
        let id = report.case.id;

        let csv_path = self.output_path(&format!("aggregated_results_case{id}.csv"));
        CsvExporter::export(report, &csv_path)
            .with_context(|| format!("Failed to export CSV to: {}", csv_path.display()))?;
        println!("✓ CSV exported to: {}", csv_path.display());

        if self.json {
            let json_path = self.output_path(&format!("summary_case{id}.json"));
            JsonExporter::export(report, &json_path)
                .with_context(|| format!("Failed to export JSON to: {}", json_path.display()))?;
            println!("✓ JSON exported to: {}", json_path.display());
        }

        if !self.no_plot {
            let plot_path = self.output_path(&format!("plot_case{id}.png"));
            LinePlotter::plot(report, &plot_path)
                .with_context(|| format!("Failed to generate chart: {}", plot_path.display()))?;
            println!("✓ Chart: {}", plot_path.display());
        }

        Ok(())
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Print a case's table in a readable format
    fn print_report(&self, report: &CaseReport) {
        println!("{}", "=".repeat(70));
        println!("   {}", report.case);
        println!("{}", "=".repeat(70));
        println!(
            "  {:<12} {:>7} {:>7} {:>12} {:>12} {:>9}",
            "Algorithm", "Threads", "Samples", "Mean (s)", "Margin (s)", "RelErr"
        );
        for row in &report.rows {
            println!(
                "  {:<12} {:>7} {:>7} {:>12.6} {:>12.6} {:>8.2}%{}",
                row.variant,
                row.level,
                row.sample_count,
                row.mean,
                row.margin,
                row.relative_error * 100.0,
                if row.converged { "" } else { "  (not converged)" }
            );
        }
        println!();
        println!(
            "  Rounds: {}   Converged: {}   Time: {:.2}s",
            report.rounds,
            if report.termination.is_converged() { "yes" } else { "no (round cap reached)" },
            report.elapsed.as_secs_f64()
        );
        println!("{}", "=".repeat(70));
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_runs_every_case_with_defaults() {
        let cli = Cli::try_parse_from(["lockbench"]).unwrap();
        assert_eq!(cli.target, 0.05);
        assert_eq!(cli.max_rounds, 200);
        assert!(!cli.no_plot);

        let ids: Vec<_> = cli.selected_cases().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_case_selection() {
        let cli = Cli::try_parse_from(["lockbench", "--case", "3", "-c", "1"]).unwrap();
        let ids: Vec<_> = cli.selected_cases().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let cli = Cli::try_parse_from(["lockbench", "--case", "4"]).unwrap();
        assert!(cli.selected_cases().is_err());
    }

    #[test]
    fn test_output_paths() {
        let cli = Cli::try_parse_from(["lockbench", "--output-dir", "out", "--max-rounds", "20"])
            .unwrap();
        assert_eq!(cli.max_rounds, 20);
        assert_eq!(
            cli.output_path("plot_case1.png"),
            PathBuf::from("out").join("plot_case1.png")
        );
    }
}
