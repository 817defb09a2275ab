//! Extraction Quality Scorer

use dealsight_models::{FieldMapping, NormalizedTable};

pub const HEADER_WEIGHT: f64 = 0.7;
pub const COMPLETENESS_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// `0.7 * mean mapping confidence + 0.3 * fraction of filled cells`.
    pub fn score(&self, mapping: &FieldMapping, table: &NormalizedTable) -> f64 {
        Self::combine(mapping.mean_confidence(), Self::fill_ratio(table))
    }

    /// Unmapped tables contribute nothing on the header term.
    pub fn combine(mean_confidence: Option<f64>, fill_ratio: f64) -> f64 {
        let header = mean_confidence.unwrap_or(0.0).clamp(0.0, 1.0);
        let fill = fill_ratio.clamp(0.0, 1.0);
        (HEADER_WEIGHT * header + COMPLETENESS_WEIGHT * fill).clamp(0.0, 1.0)
    }

    /// Share of non-empty cells; zero for a table without rows or columns.
    pub fn fill_ratio(table: &NormalizedTable) -> f64 {
        let total = table.row_count() * table.column_count();
        if total == 0 {
            return 0.0;
        }
        let filled = table
            .rows()
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| !cell.trim().is_empty())
            .count();
        filled as f64 / total as f64
    }
}
