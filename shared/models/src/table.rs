//! Table domain models for the Dealsight extraction pipeline.
//!
//! `RawTable` is what a document-conversion collaborator hands over;
//! `NormalizedTable` is what the structure normalizer builds from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Origin of a table inside its source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableSource {
    /// Identifier of the source document (or document + sheet)
    pub source_id: String,
    pub filename: Option<String>,
    /// Heading or section text surrounding the table
    pub section_context: Option<String>,
    /// When the source was first ingested; drives the legacy-data policy
    pub ingested_at: Option<DateTime<Utc>>,
}

/// Table as produced by document conversion. Rows are positional: cell `i`
/// of a row belongs to header `i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTable {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub source: TableSource,
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source_id: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: TableSource {
                source_id: source_id.into(),
                ..Default::default()
            },
            headers,
            rows,
        }
    }

    /// Builder pattern: attach the source filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.source.filename = Some(filename.into());
        self
    }

    /// Builder pattern: attach surrounding section text
    pub fn with_section_context(mut self, context: impl Into<String>) -> Self {
        self.source.section_context = Some(context.into());
        self
    }

    /// Builder pattern: attach the ingestion timestamp
    pub fn with_ingested_at(mut self, ingested_at: DateTime<Utc>) -> Self {
        self.source.ingested_at = Some(ingested_at);
        self
    }

    /// Header/cell pairs of one row, in column order.
    pub fn row_pairs(&self, row: usize) -> Vec<(&str, &str)> {
        self.rows
            .get(row)
            .map(|cells| {
                self.headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(h, c)| (h.as_str(), c.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Table after merged-cell expansion, stacked-header combination and
/// continuation-row joining. Fields are private: a normalized table is
/// never edited in place, derived tables are new values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedTable {
    id: Uuid,
    raw_table_id: Uuid,
    source: TableSource,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    extraction_quality: f64,
    warnings: Vec<String>,
}

impl NormalizedTable {
    /// Rows are padded or truncated to the header width. Quality is
    /// clamped into [0, 1]; NaN becomes 0.
    pub fn new(
        raw_table_id: Uuid,
        source: TableSource,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        extraction_quality: f64,
        warnings: Vec<String>,
    ) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            raw_table_id,
            source,
            headers,
            rows,
            extraction_quality: clamp_unit(extraction_quality),
            warnings,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn raw_table_id(&self) -> Uuid {
        self.raw_table_id
    }

    pub fn source(&self) -> &TableSource {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn extraction_quality(&self) -> f64 {
        self.extraction_quality
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Cell text, empty when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.as_str())
            .unwrap_or("")
    }

    /// Same table with a re-computed quality score.
    pub fn with_quality(mut self, extraction_quality: f64) -> Self {
        self.extraction_quality = clamp_unit(extraction_quality);
        self
    }

    /// Splits rows by the key derived from `column`, dropping that column
    /// from every partition. Returns the indices of rows whose cell yields
    /// no key as the error.
    pub fn partition_by_column<K, F>(
        &self,
        column: usize,
        key_of: F,
    ) -> Result<BTreeMap<K, NormalizedTable>, Vec<usize>>
    where
        K: Ord,
        F: Fn(&str) -> Option<K>,
    {
        let mut groups: BTreeMap<K, Vec<Vec<String>>> = BTreeMap::new();
        let mut unkeyed = Vec::new();

        for (idx, row) in self.rows.iter().enumerate() {
            let cell = row.get(column).map(|c| c.as_str()).unwrap_or("");
            match key_of(cell) {
                Some(key) => {
                    let kept = row
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != column)
                        .map(|(_, c)| c.clone())
                        .collect();
                    groups.entry(key).or_default().push(kept);
                }
                None => unkeyed.push(idx),
            }
        }

        if !unkeyed.is_empty() {
            return Err(unkeyed);
        }

        let headers: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != column)
            .map(|(_, h)| h.clone())
            .collect();

        Ok(groups
            .into_iter()
            .map(|(key, rows)| {
                let table = NormalizedTable::new(
                    self.raw_table_id,
                    self.source.clone(),
                    headers.clone(),
                    rows,
                    self.extraction_quality,
                    self.warnings.clone(),
                );
                (key, table)
            })
            .collect())
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
