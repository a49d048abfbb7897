//! Mean time vs thread count line charts

use std::path::Path;

use anyhow::Result;
use lockbench_core::CaseReport;
use plotters::prelude::*;

const COLORS: [RGBColor; 4] = [BLUE, RED, GREEN, MAGENTA];

/// Draws one line per variant: thread count on x, mean time on y
pub struct LinePlotter;

impl LinePlotter {
    /// Plot the case's mean times to a PNG at `path`
    pub fn plot(report: &CaseReport, path: &Path) -> Result<()> {
        let root = BitMapBackend::new(path, (1120, 700)).into_drawing_area();
        root.fill(&WHITE)?;

        let series = report.mean_series();
        let points = series.iter().flat_map(|s| s.points.iter());
        if points.clone().next().is_none() {
            root.present()?;
            return Ok(());
        }

        let min_threads = points.clone().map(|(level, _)| *level).min().unwrap_or(1) as f64;
        let max_threads = points.clone().map(|(level, _)| *level).max().unwrap_or(1) as f64;
        let max_mean = points.map(|(_, mean)| *mean).fold(0.0, f64::max);

        let (x_lo, x_hi) = if max_threads > min_threads {
            (min_threads, max_threads)
        } else {
            (min_threads - 1.0, max_threads + 1.0)
        };
        let y_hi = if max_mean > 0.0 { max_mean * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(report.case.to_string(), ("sans-serif", 32))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_lo..x_hi, 0f64..y_hi)?;

        chart
            .configure_mesh()
            .x_desc("Threads")
            .y_desc("Mean Time (s)")
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.4}", y))
            .light_line_style(WHITE.mix(0.3))
            .draw()?;

        for (idx, line) in series.iter().enumerate() {
            let color = COLORS[idx % COLORS.len()];
            let data: Vec<(f64, f64)> = line
                .points
                .iter()
                .map(|(level, mean)| (*level as f64, *mean))
                .collect();

            chart
                .draw_series(LineSeries::new(data.clone(), color.stroke_width(2)))?
                .label(report.label_of(&line.variant))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            chart.draw_series(
                data.into_iter()
                    .map(move |point| Circle::new(point, 4, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbench_core::{aggregate, CaseConfig, CellMatrix, Termination, Variant};
    use std::time::Duration;
    use tempfile::tempdir;

    fn report(matrix: &CellMatrix) -> CaseReport {
        CaseReport {
            case: CaseConfig::new(3, 0.5, 0.25, 0.25),
            variants: Variant::defaults(),
            rows: aggregate(matrix, 0.05),
            termination: Termination::Converged,
            rounds: 2,
            variant_rounds: vec![("one_mutex".into(), 2), ("rw_lock".into(), 2)],
            elapsed: Duration::from_secs(1),
        }
    }

    fn assert_png(path: &Path) {
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_plot_without_samples_writes_blank_png() {
        let matrix = CellMatrix::new(["one_mutex", "rw_lock"], &[1, 2]).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot_case3.png");

        LinePlotter::plot(&report(&matrix), &path).unwrap();
        assert_png(&path);
    }

    #[test]
    #[ignore = "renders text, needs system fonts"]
    fn test_plot_writes_png() {
        let mut matrix = CellMatrix::new(["one_mutex", "rw_lock"], &[1, 2, 4, 8]).unwrap();
        for level in [1, 2, 4, 8] {
            for _ in 0..2 {
                matrix.record("one_mutex", level, 0.01 * level as f64);
                matrix.record("rw_lock", level, 0.005 * level as f64);
            }
        }
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot_case3.png");

        LinePlotter::plot(&report(&matrix), &path).unwrap();
        assert_png(&path);
    }
}
