//! CSV export functionality

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use csv::Writer;
use lockbench_core::CaseReport;

/// Writes aggregated case tables as CSV
pub struct CsvExporter;

impl CsvExporter {
    /// Export one row per (variant, thread count) cell
    pub fn export(report: &CaseReport, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record([
            "Algorithm",
            "Threads",
            "Samples",
            "MeanTime",
            "Margin",
            "RelError",
            "Converged",
        ])?;

        for row in &report.rows {
            wtr.write_record(&[
                row.variant.clone(),
                row.level.to_string(),
                row.sample_count.to_string(),
                row.mean.to_string(),
                row.margin.to_string(),
                row.relative_error.to_string(),
                row.converged.to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Export one line per case: rounds used, convergence and duration
    pub fn export_runs(reports: &[CaseReport], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record([
            "Case",
            "Member",
            "Insert",
            "Delete",
            "Rounds",
            "Converged",
            "UnconvergedCells",
            "Seconds",
        ])?;

        for report in reports {
            wtr.write_record(&[
                report.case.id.to_string(),
                report.case.member.to_string(),
                report.case.insert.to_string(),
                report.case.delete.to_string(),
                report.rounds.to_string(),
                report.termination.is_converged().to_string(),
                report.termination.unconverged().len().to_string(),
                format!("{:.2}", report.elapsed.as_secs_f64()),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}
