//! Spreadsheet Reader
//! 
//! Multi-format reader turning CSV and Excel bytes into raw tables.

use std::path::Path;

use chrono::{DateTime, Utc};
use dealsight_models::RawTable;
use tracing::debug;

use crate::error::{DealsightError, DealsightResult};

/// Supported spreadsheet formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Csv,
    Excel, // XLSX/XLS
}

impl SpreadsheetFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Detect format from content type header
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(Self::Excel),
            "application/vnd.ms-excel" => Some(Self::Excel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Excel => "Excel",
        }
    }
}

/// Tables decoded from one uploaded document
#[derive(Debug, Clone)]
pub struct SpreadsheetDocument {
    pub filename: String,
    pub format: SpreadsheetFormat,
    pub tables: Vec<RawTable>,
    pub warnings: Vec<String>,
}

/// Reader stamping every table with the document's filename and ingestion
/// time.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetReader {
    ingested_at: Option<DateTime<Utc>>,
}

impl SpreadsheetReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the ingestion timestamp recorded on each table
    pub fn with_ingested_at(mut self, ingested_at: DateTime<Utc>) -> Self {
        self.ingested_at = Some(ingested_at);
        self
    }

    /// Read spreadsheet bytes
    pub fn read_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<SpreadsheetFormat>,
    ) -> DealsightResult<SpreadsheetDocument> {
        let format = format
            .or_else(|| SpreadsheetFormat::from_extension(Path::new(filename)))
            .ok_or_else(|| {
                DealsightError::table_source(format!("Could not determine file format of {}", filename))
            })?;

        let document = match format {
            SpreadsheetFormat::Csv => self.read_csv(filename, data)?,
            SpreadsheetFormat::Excel => self.read_excel(filename, data)?,
        };

        debug!(
            filename,
            format = format.as_str(),
            tables = document.tables.len(),
            "Decoded spreadsheet"
        );
        Ok(document)
    }

    fn read_csv(&self, filename: &str, data: &[u8]) -> DealsightResult<SpreadsheetDocument> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        let mut warnings = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => rows.push(record.iter().map(|v| v.to_string()).collect()),
                Err(e) => warnings.push(format!("Row {}: Parse error - {}", idx + 2, e)),
            }
        }

        let tables = if headers.iter().all(|h| h.trim().is_empty()) && rows.is_empty() {
            Vec::new()
        } else {
            vec![self.stamp(RawTable::new(filename, headers, rows).with_filename(filename))]
        };

        Ok(SpreadsheetDocument {
            filename: filename.to_string(),
            format: SpreadsheetFormat::Csv,
            tables,
            warnings,
        })
    }

    fn read_excel(&self, filename: &str, data: &[u8]) -> DealsightResult<SpreadsheetDocument> {
        use calamine::{open_workbook_auto_from_rs, DataType, Reader};

        // Sniffs legacy BIFF (.xls) before OOXML, so the extension is only a hint
        let mut workbook = open_workbook_auto_from_rs(std::io::Cursor::new(data))
            .map_err(|e| DealsightError::table_source(format!("Failed to open Excel workbook: {}", e)))?;

        let mut tables = Vec::new();
        let mut warnings = Vec::new();

        for sheet_name in workbook.sheet_names().to_owned() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Some(Ok(range)) => range,
                Some(Err(e)) => {
                    warnings.push(format!("Sheet '{}': {}", sheet_name, e));
                    continue;
                }
                None => continue,
            };

            let mut rows_iter = range.rows();

            // First row is headers
            let headers: Vec<String> = match rows_iter.next() {
                Some(row) => row.iter().map(|cell: &DataType| cell_text(cell)).collect(),
                None => continue,
            };

            let rows: Vec<Vec<String>> = rows_iter
                .map(|row| row.iter().map(cell_text).collect())
                .collect();

            let table = RawTable::new(format!("{}#{}", filename, sheet_name), headers, rows)
                .with_filename(filename)
                .with_section_context(sheet_name.clone());
            tables.push(self.stamp(table));
        }

        if tables.is_empty() {
            warnings.push("No non-empty worksheets found".to_string());
        }

        Ok(SpreadsheetDocument {
            filename: filename.to_string(),
            format: SpreadsheetFormat::Excel,
            tables,
            warnings,
        })
    }

    fn stamp(&self, table: RawTable) -> RawTable {
        match self.ingested_at {
            Some(at) => table.with_ingested_at(at),
            None => table,
        }
    }
}

fn cell_text(cell: &calamine::DataType) -> String {
    match cell {
        calamine::DataType::Empty => String::new(),
        other => other.to_string(),
    }
}
