//! JSON export functionality

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use lockbench_core::CaseReport;
use serde_json::json;

/// Writes case summaries as JSON
pub struct JsonExporter;

impl JsonExporter {
    /// Export the case, its termination and every row.
    ///
    /// Infinite margins and relative errors are written as `null`.
    pub fn export(report: &CaseReport, path: &Path) -> Result<()> {
        let rows: Vec<_> = report
            .rows
            .iter()
            .map(|row| {
                json!({
                    "variant": row.variant,
                    "threads": row.level,
                    "samples": row.sample_count,
                    "mean_s": row.mean,
                    "margin_s": row.margin,
                    "relative_error": row.relative_error,
                    "converged": row.converged,
                })
            })
            .collect();

        let invocations: serde_json::Map<String, serde_json::Value> = report
            .variant_rounds
            .iter()
            .map(|(name, count)| (name.clone(), json!(count)))
            .collect();

        let output = json!({
            "case": report.case,
            "termination": report.termination,
            "rounds": report.rounds,
            "invocations": invocations,
            "elapsed_s": report.elapsed.as_secs_f64(),
            "rows": rows,
        });

        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &output)?;

        Ok(())
    }
}
