//! Sample histories for every (variant, level) cell of a case

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::stats::{estimate, is_converged, Estimate};

/// Concurrency level (thread count)
pub type Level = u32;

/// Current state of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// Variant identifier
    pub variant: String,

    /// Concurrency level
    pub level: Level,

    /// Estimate over the cell's samples, `None` while the cell is empty
    pub estimate: Option<Estimate>,
}

/// A cell that has not met the relative error target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnconvergedCell {
    /// Variant identifier
    pub variant: String,

    /// Concurrency level
    pub level: Level,

    /// Samples collected so far
    pub sample_count: usize,

    /// Current relative error (infinite below two samples)
    pub relative_error: f64,
}

/// Fixed cross product of variants and levels, each cell owning an
/// append-only sample sequence
///
/// Variants keep their declaration order and levels are held in ascending
/// order; both are fixed at construction.
#[derive(Debug, Clone)]
pub struct CellMatrix {
    variants: Vec<String>,
    levels: Vec<Level>,
    /// Row-major: `cells[variant_idx * levels.len() + level_idx]`
    cells: Vec<Vec<f64>>,
}

impl CellMatrix {
    /// Create an empty matrix over `variants` x `levels`
    pub fn new<S: Into<String>>(
        variants: impl IntoIterator<Item = S>,
        levels: &[Level],
    ) -> Result<Self, ConfigError> {
        let variants: Vec<String> = variants.into_iter().map(Into::into).collect();
        if variants.is_empty() {
            return Err(ConfigError::InvalidLayout("at least one variant is required".into()));
        }
        for (idx, name) in variants.iter().enumerate() {
            if variants[..idx].contains(name) {
                return Err(ConfigError::InvalidLayout(format!(
                    "duplicate variant '{name}'"
                )));
            }
        }

        let mut levels = levels.to_vec();
        levels.sort_unstable();
        levels.dedup();
        if levels.is_empty() {
            return Err(ConfigError::InvalidLayout("at least one level is required".into()));
        }

        let cells = vec![Vec::new(); variants.len() * levels.len()];
        Ok(Self {
            variants,
            levels,
            cells,
        })
    }

    /// Variants in declaration order
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Levels in ascending order
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of cells (fixed for the matrix lifetime)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: construction requires at least one cell
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `(variant, level)` names a cell of this matrix
    pub fn contains(&self, variant: &str, level: Level) -> bool {
        self.index_of(variant, level).is_some()
    }

    fn index_of(&self, variant: &str, level: Level) -> Option<usize> {
        let v = self.variants.iter().position(|name| name == variant)?;
        let l = self.levels.binary_search(&level).ok()?;
        Some(v * self.levels.len() + l)
    }

    fn cell_index(&self, variant: &str, level: Level) -> usize {
        match self.index_of(variant, level) {
            Some(idx) => idx,
            None => panic!("no cell for variant '{variant}' at level {level}"),
        }
    }

    /// Append a sample to one cell.
    ///
    /// # Panics
    ///
    /// Panics if `(variant, level)` is not a cell of this matrix.
    pub fn record(&mut self, variant: &str, level: Level, sample: f64) {
        let idx = self.cell_index(variant, level);
        self.cells[idx].push(sample);
    }

    /// Samples of one cell in round order.
    ///
    /// # Panics
    ///
    /// Panics if `(variant, level)` is not a cell of this matrix.
    pub fn samples(&self, variant: &str, level: Level) -> &[f64] {
        &self.cells[self.cell_index(variant, level)]
    }

    fn variant_cells(&self, variant_idx: usize) -> &[Vec<f64>] {
        let width = self.levels.len();
        &self.cells[variant_idx * width..(variant_idx + 1) * width]
    }

    /// Variants with at least one unconverged cell, in declaration order
    pub fn pending_variants(&self, target: f64) -> Vec<&str> {
        self.variants
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                self.variant_cells(*idx)
                    .iter()
                    .any(|samples| !is_converged(samples, target))
            })
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Whether every cell meets `target`
    pub fn is_fully_converged(&self, target: f64) -> bool {
        self.pending_variants(target).is_empty()
    }

    /// Every cell that does not meet `target`, in report order
    pub fn unconverged_cells(&self, target: f64) -> Vec<UnconvergedCell> {
        self.iter_cells()
            .filter(|(_, _, samples)| !is_converged(samples, target))
            .map(|(variant, level, samples)| UnconvergedCell {
                variant: variant.to_string(),
                level,
                sample_count: samples.len(),
                relative_error: if samples.is_empty() {
                    f64::INFINITY
                } else {
                    estimate(samples).relative_error
                },
            })
            .collect()
    }

    /// Estimates for every cell, variants in declaration order and levels ascending
    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        self.iter_cells()
            .map(|(variant, level, samples)| CellSnapshot {
                variant: variant.to_string(),
                level,
                estimate: (!samples.is_empty()).then(|| estimate(samples)),
            })
            .collect()
    }

    fn iter_cells(&self) -> impl Iterator<Item = (&str, Level, &[f64])> + '_ {
        let width = self.levels.len();
        self.cells.iter().enumerate().map(move |(idx, samples)| {
            (
                self.variants[idx / width].as_str(),
                self.levels[idx % width],
                samples.as_slice(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> CellMatrix {
        CellMatrix::new(["one_mutex", "rw_lock"], &[1, 2, 4, 8]).unwrap()
    }

    #[test]
    fn test_fresh_matrix_has_every_variant_pending() {
        let matrix = matrix();
        assert_eq!(matrix.len(), 8);
        assert_eq!(matrix.pending_variants(0.05), vec!["one_mutex", "rw_lock"]);
        assert!(!matrix.is_fully_converged(0.05));
        assert_eq!(matrix.unconverged_cells(0.05).len(), 8);
    }

    #[test]
    fn test_converged_variant_leaves_pending_set() {
        let mut matrix = matrix();
        for level in [1, 2, 4, 8] {
            matrix.record("rw_lock", level, 0.5);
            matrix.record("rw_lock", level, 0.5);
        }

        assert_eq!(matrix.pending_variants(0.05), vec!["one_mutex"]);

        for level in [1, 2, 4, 8] {
            matrix.record("one_mutex", level, 1.0);
            matrix.record("one_mutex", level, 1.0);
        }
        assert!(matrix.is_fully_converged(0.05));
        assert!(matrix.unconverged_cells(0.05).is_empty());
    }

    #[test]
    fn test_single_unconverged_cell_keeps_variant_pending() {
        let mut matrix = matrix();
        for level in [1, 2, 4] {
            matrix.record("one_mutex", level, 2.0);
            matrix.record("one_mutex", level, 2.0);
        }
        matrix.record("one_mutex", 8, 1.0);
        matrix.record("one_mutex", 8, 3.0);

        assert!(matrix.pending_variants(0.05).contains(&"one_mutex"));
        let stuck = matrix.unconverged_cells(0.05);
        let stuck_mutex: Vec<_> = stuck.iter().filter(|c| c.variant == "one_mutex").collect();
        assert_eq!(stuck_mutex.len(), 1);
        assert_eq!(stuck_mutex[0].level, 8);
        assert_eq!(stuck_mutex[0].sample_count, 2);
        assert!(stuck_mutex[0].relative_error > 0.05);
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut matrix = matrix();
        matrix.record("one_mutex", 4, 0.3);
        matrix.record("one_mutex", 4, 0.1);
        matrix.record("one_mutex", 4, 0.2);
        assert_eq!(matrix.samples("one_mutex", 4), &[0.3, 0.1, 0.2]);
        assert!(matrix.samples("one_mutex", 2).is_empty());
    }

    #[test]
    #[should_panic(expected = "no cell for variant 'spin_lock'")]
    fn test_record_unknown_variant_panics() {
        matrix().record("spin_lock", 1, 1.0);
    }

    #[test]
    #[should_panic(expected = "at level 3")]
    fn test_record_unknown_level_panics() {
        matrix().record("one_mutex", 3, 1.0);
    }

    #[test]
    fn test_levels_are_sorted_and_variants_keep_declaration_order() {
        let matrix = CellMatrix::new(["zeta", "alpha"], &[8, 1, 4, 2, 4]).unwrap();
        assert_eq!(matrix.levels(), &[1, 2, 4, 8]);
        assert_eq!(matrix.variants(), &["zeta".to_string(), "alpha".to_string()]);

        let keys: Vec<_> = matrix
            .snapshot()
            .into_iter()
            .map(|cell| (cell.variant, cell.level))
            .collect();
        assert_eq!(keys[0], ("zeta".to_string(), 1));
        assert_eq!(keys[3], ("zeta".to_string(), 8));
        assert_eq!(keys[4], ("alpha".to_string(), 1));
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_snapshot_reflects_current_samples() {
        let mut matrix = matrix();
        matrix.record("one_mutex", 1, 10.0);

        let snapshot = matrix.snapshot();
        assert_eq!(snapshot.len(), matrix.len());
        let first = snapshot[0].estimate.unwrap();
        assert_eq!(first.sample_count, 1);
        assert_eq!(first.mean, 10.0);
        assert!(snapshot[1].estimate.is_none());

        matrix.record("one_mutex", 1, 10.0);
        let first = matrix.snapshot()[0].estimate.unwrap();
        assert_eq!(first.sample_count, 2);
        assert_eq!(first.margin, 0.0);
        assert_eq!(matrix.len(), 8);
    }

    #[test]
    fn test_invalid_layouts_are_rejected() {
        assert!(CellMatrix::new(Vec::<String>::new(), &[1]).is_err());
        assert!(CellMatrix::new(["a"], &[]).is_err());
        assert!(CellMatrix::new(["a", "a"], &[1]).is_err());
    }
}
