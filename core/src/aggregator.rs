//! Reduce a case's cell matrix to report rows

use serde::{Deserialize, Serialize};

use crate::matrix::{CellMatrix, Level};

/// One reported cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Variant identifier
    pub variant: String,

    /// Thread count
    pub level: Level,

    /// Samples collected
    pub sample_count: usize,

    /// Mean time in seconds (NaN for an empty cell)
    pub mean: f64,

    /// 95% confidence half-width in seconds
    pub margin: f64,

    /// `margin / mean`
    pub relative_error: f64,

    /// Whether the cell met the relative error target
    pub converged: bool,
}

/// Mean time per level for one variant, ready to be drawn as a line
#[derive(Debug, Clone, PartialEq)]
pub struct MeanSeries {
    /// Variant identifier
    pub variant: String,

    /// `(level, mean seconds)` in ascending level order, empty cells skipped
    pub points: Vec<(Level, f64)>,
}

/// Flatten `matrix` into one row per cell: variants in declaration order,
/// levels ascending.
pub fn aggregate(matrix: &CellMatrix, target: f64) -> Vec<ReportRow> {
    matrix
        .snapshot()
        .into_iter()
        .map(|cell| match cell.estimate {
            Some(est) => ReportRow {
                variant: cell.variant,
                level: cell.level,
                sample_count: est.sample_count,
                mean: est.mean,
                margin: est.margin,
                relative_error: est.relative_error,
                converged: est.sample_count >= 2 && est.relative_error <= target,
            },
            None => ReportRow {
                variant: cell.variant,
                level: cell.level,
                sample_count: 0,
                mean: f64::NAN,
                margin: f64::INFINITY,
                relative_error: f64::INFINITY,
                converged: false,
            },
        })
        .collect()
}

/// Group rows into one mean-time series per variant, keeping row order
pub fn mean_series(rows: &[ReportRow]) -> Vec<MeanSeries> {
    let mut series: Vec<MeanSeries> = Vec::new();
    for row in rows {
        let idx = match series.iter().position(|s| s.variant == row.variant) {
            Some(idx) => idx,
            None => {
                series.push(MeanSeries {
                    variant: row.variant.clone(),
                    points: Vec::new(),
                });
                series.len() - 1
            }
        };
        if row.sample_count > 0 {
            series[idx].points.push((row.level, row.mean));
        }
    }
    series
}
