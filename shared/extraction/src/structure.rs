//! Table Structure Normalizer
//! 
//! Turns a `RawTable` into a `NormalizedTable`: text canonicalization,
//! merged header expansion, stacked header combination, ragged row repair
//! and continuation row joining.

use dealsight_models::{NormalizedTable, RawTable, TableSource};
use dealsight_utils::ExtractionConfig;
use tracing::debug;
use uuid::Uuid;

use crate::cells::is_numeric_cell;
use crate::unicode::normalize_text;

/// Placeholder for a header that has no text of its own and nothing to
/// inherit from.
pub const UNKNOWN_COLUMN: &str = "Unknown Column";

#[derive(Debug, Clone)]
pub struct TableNormalizer {
    header_row_text_ratio: f64,
    data_row_numeric_ratio: f64,
    max_stacked_header_rows: usize,
    separator: String,
}

/// Headers and data rows of a table before continuation rows are joined.
/// Joining needs the key column, which is only known once headers are mapped.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Number of leading raw rows consumed as additional header rows
    pub stacked_header_rows: usize,
    pub warnings: Vec<String>,
}

impl TableNormalizer {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            header_row_text_ratio: config.header_row_text_ratio,
            data_row_numeric_ratio: config.data_row_numeric_ratio,
            max_stacked_header_rows: config.max_stacked_header_rows.max(1),
            separator: config.header_separator.clone(),
        }
    }

    /// Everything except continuation joining.
    pub fn layout(&self, raw: &RawTable) -> TableLayout {
        let mut warnings = Vec::new();

        let width = if raw.headers.is_empty() {
            raw.rows.iter().map(|r| r.len()).max().unwrap_or(0)
        } else {
            raw.headers.len()
        };

        let mut top: Vec<String> = raw.headers.iter().map(|h| normalize_text(h)).collect();
        top.resize(width, String::new());

        let mut rows = Vec::with_capacity(raw.rows.len());
        let mut ragged = 0usize;
        let mut truncated_values = 0usize;
        for row in &raw.rows {
            let mut cells: Vec<String> = row.iter().map(|c| normalize_text(c)).collect();
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            if cells.len() != width {
                ragged += 1;
                if cells.len() > width {
                    truncated_values += cells[width..].iter().filter(|c| !c.is_empty()).count();
                }
                cells.resize(width, String::new());
            }
            rows.push(cells);
        }
        let dropped = raw.rows.len() - rows.len();
        if ragged > 0 {
            warnings.push(format!(
                "{} row(s) did not match the header width of {} and were padded or truncated",
                ragged, width
            ));
        }
        if truncated_values > 0 {
            warnings.push(format!(
                "{} value(s) beyond the last header were discarded",
                truncated_values
            ));
        }
        if dropped > 0 {
            debug!("Dropped {} empty row(s) from table {}", dropped, raw.id);
        }

        let stacked = self.stacked_header_rows(&top, &rows);
        let lower: Vec<Vec<String>> = rows.drain(..stacked).collect();
        let headers = self.combine_headers(&expand_merged_headers(&top), &lower);

        TableLayout {
            headers,
            rows,
            stacked_header_rows: stacked,
            warnings,
        }
    }

    /// Full normalization with a known continuation key column.
    pub fn normalize(&self, raw: &RawTable, key_column: usize) -> NormalizedTable {
        self.layout(raw).into_table(raw.id, raw.source.clone(), key_column)
    }

    /// How many leading data rows continue the header. They must all be
    /// text-like, label every column the top row labels, and be followed by
    /// a predominantly numeric row filling at least half the columns.
    fn stacked_header_rows(&self, top: &[String], rows: &[Vec<String>]) -> usize {
        if !self.is_text_like(top) {
            return 0;
        }
        let limit = (self.max_stacked_header_rows - 1).min(rows.len());
        let mut count = 0;
        while count < limit && self.is_header_continuation(top, &rows[count]) {
            count += 1;
        }
        if count == 0 {
            return 0;
        }
        match rows.get(count) {
            Some(next) if self.is_numeric_like(next) && is_mostly_filled(next) => count,
            _ => 0,
        }
    }

    /// A sub-header row names something under every labelled top column;
    /// a data row with a blank there is just data.
    fn is_header_continuation(&self, top: &[String], row: &[String]) -> bool {
        let covers_top = top
            .iter()
            .enumerate()
            .filter(|(_, head)| !head.trim().is_empty())
            .all(|(col, _)| row.get(col).map_or(false, |cell| !cell.is_empty()));
        covers_top && self.is_text_like(row)
    }

    fn is_text_like(&self, row: &[String]) -> bool {
        let filled: Vec<&String> = row.iter().filter(|c| !c.is_empty()).collect();
        if filled.is_empty() {
            return false;
        }
        let text = filled.iter().filter(|c| !is_numeric_cell(c)).count();
        text as f64 / filled.len() as f64 > self.header_row_text_ratio
    }

    fn is_numeric_like(&self, row: &[String]) -> bool {
        let filled: Vec<&String> = row.iter().filter(|c| !c.is_empty()).collect();
        if filled.is_empty() {
            return false;
        }
        let numeric = filled.iter().filter(|c| is_numeric_cell(c)).count();
        numeric as f64 / filled.len() as f64 >= self.data_row_numeric_ratio
    }

    fn combine_headers(&self, top: &[String], lower: &[Vec<String>]) -> Vec<String> {
        top.iter()
            .enumerate()
            .map(|(col, head)| {
                let mut parts: Vec<&str> = Vec::new();
                let column_parts = std::iter::once(head.as_str())
                    .chain(lower.iter().map(|row| row[col].as_str()));
                for part in column_parts {
                    if part.is_empty() || parts.last() == Some(&part) {
                        continue;
                    }
                    parts.push(part);
                }
                if parts.is_empty() {
                    UNKNOWN_COLUMN.to_string()
                } else {
                    parts.join(&self.separator)
                }
            })
            .collect()
    }
}

impl TableLayout {
    /// Joins continuation rows on `key_column` and freezes the table.
    /// Quality starts at zero until the scorer has run.
    pub fn into_table(self, raw_table_id: Uuid, source: TableSource, key_column: usize) -> NormalizedTable {
        let rows = join_continuations(self.rows, key_column);
        NormalizedTable::new(raw_table_id, source, self.headers, rows, 0.0, self.warnings)
    }
}

/// Empty headers inherit the nearest preceding non-empty header. Leading
/// empty headers stay empty here and become `UNKNOWN_COLUMN` unless a lower
/// header row names them.
pub fn expand_merged_headers(headers: &[String]) -> Vec<String> {
    let mut current: Option<&str> = None;
    headers
        .iter()
        .map(|h| {
            if h.trim().is_empty() {
                current.unwrap_or("").to_string()
            } else {
                current = Some(h.as_str());
                h.clone()
            }
        })
        .collect()
}

fn is_mostly_filled(row: &[String]) -> bool {
    let filled = row.iter().filter(|c| !c.is_empty()).count();
    filled * 2 >= row.len()
}

/// A row whose key cell is empty continues the previous row: its non-empty
/// cells are appended, space-joined, to the matching cells above.
pub fn join_continuations(rows: Vec<Vec<String>>, key_column: usize) -> Vec<Vec<String>> {
    let mut joined: Vec<Vec<String>> = Vec::with_capacity(rows.len());

    for row in rows {
        let is_continuation = row.get(key_column).map_or(true, |c| c.is_empty());
        if is_continuation {
            if let Some(previous) = joined.last_mut() {
                for (target, value) in previous.iter_mut().zip(row) {
                    if value.is_empty() {
                        continue;
                    }
                    if target.is_empty() {
                        *target = value;
                    } else {
                        target.push(' ');
                        target.push_str(&value);
                    }
                }
                continue;
            }
        }
        joined.push(row);
    }

    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TableNormalizer {
        TableNormalizer::new(&ExtractionConfig::default())
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_merged_header_expansion() {
        let expanded = expand_merged_headers(&strings(&["Application", "", "Vendor", ""]));
        assert_eq!(expanded, strings(&["Application", "Application", "Vendor", "Vendor"]));
    }

    #[test]
    fn test_leading_empty_header_becomes_placeholder() {
        let raw = RawTable::new("doc", strings(&["", "Vendor"]), vec![strings(&["SAP", "SAP SE"])]);
        let layout = normalizer().layout(&raw);
        assert_eq!(layout.headers, strings(&[UNKNOWN_COLUMN, "Vendor"]));
    }

    #[test]
    fn test_stacked_headers_are_combined() {
        let raw = RawTable::new(
            "doc",
            strings(&["Application", "", "Usage", ""]),
            vec![
                strings(&["Name", "Vendor", "Users", "Integrations"]),
                strings(&["12", "3", "1,200", "5"]),
                strings(&["SAP ECC", "SAP", "800", "9"]),
            ],
        );
        let layout = normalizer().layout(&raw);

        assert_eq!(layout.stacked_header_rows, 1);
        assert_eq!(
            layout.headers,
            strings(&["Application Name", "Application Vendor", "Usage Users", "Usage Integrations"])
        );
        assert_eq!(layout.rows.len(), 2);
    }

    #[test]
    fn test_text_rows_without_numeric_follow_up_stay_data() {
        let raw = RawTable::new(
            "doc",
            strings(&["Application", "Vendor", "Category"]),
            vec![
                strings(&["Slack", "Salesforce", "Collaboration"]),
                strings(&["Jira", "Atlassian", "Engineering"]),
                strings(&["Workday", "Workday", "HR"]),
            ],
        );
        let layout = normalizer().layout(&raw);
        assert_eq!(layout.stacked_header_rows, 0);
        assert_eq!(layout.rows.len(), 3);
    }

    #[test]
    fn test_text_row_over_numeric_continuation_stays_data() {
        let raw = RawTable::new(
            "doc",
            strings(&["Application", "Vendor", "Category", "Users"]),
            vec![
                strings(&["SAP ECC", "SAP", "ERP", ""]),
                strings(&["", "", "", "300"]),
                strings(&["Slack", "Salesforce", "Collaboration", "50"]),
            ],
        );
        let layout = normalizer().layout(&raw);
        assert_eq!(layout.stacked_header_rows, 0);
        assert_eq!(layout.headers, strings(&["Application", "Vendor", "Category", "Users"]));
        assert_eq!(layout.rows.len(), 3);
    }

    #[test]
    fn test_sparse_numeric_row_does_not_confirm_header() {
        let raw = RawTable::new(
            "doc",
            strings(&["Application", "Vendor", "Category", "Notes"]),
            vec![
                strings(&["SAP ECC", "SAP", "ERP", "legacy"]),
                strings(&["", "", "", "2019"]),
                strings(&["Slack", "Salesforce", "Collaboration", "chat"]),
            ],
        );
        let layout = normalizer().layout(&raw);
        assert_eq!(layout.stacked_header_rows, 0);
        assert_eq!(layout.rows[0][0], "SAP ECC");
    }

    #[test]
    fn test_ragged_and_empty_rows() {
        let raw = RawTable::new(
            "doc",
            strings(&["Application", "Vendor"]),
            vec![
                strings(&["SAP", "SAP SE", "extra"]),
                strings(&["", ""]),
                strings(&["Slack"]),
            ],
        );
        let layout = normalizer().layout(&raw);

        assert_eq!(layout.rows, vec![strings(&["SAP", "SAP SE"]), strings(&["Slack", ""])]);
        assert_eq!(layout.warnings.len(), 2);
    }

    #[test]
    fn test_continuation_rows_join() {
        let rows = vec![
            strings(&["Oracle", "Finance and", "400"]),
            strings(&["", "Accounting", ""]),
            strings(&["Slack", "", "50"]),
            strings(&["", "Chat", ""]),
        ];
        let joined = join_continuations(rows, 0);
        assert_eq!(
            joined,
            vec![strings(&["Oracle", "Finance and Accounting", "400"]), strings(&["Slack", "Chat", "50"])]
        );
    }

    #[test]
    fn test_leading_continuation_is_kept() {
        let rows = vec![strings(&["", "orphan"]), strings(&["SAP", "ERP"])];
        assert_eq!(join_continuations(rows.clone(), 0), rows);
    }

    #[test]
    fn test_normalize_applies_text_canonicalization() {
        let raw = RawTable::new(
            "doc",
            strings(&["\u{201C}Application\u{201D}", "Vendor\u{00A0}Name"]),
            vec![strings(&["  SAP\u{2013}ECC ", "SAP"])],
        );
        let table = normalizer().normalize(&raw, 0);
        assert_eq!(table.headers(), &strings(&["\"Application\"", "Vendor Name"])[..]);
        assert_eq!(table.cell(0, 0), "SAP-ECC");
        assert_eq!(table.raw_table_id(), raw.id);
    }
}
