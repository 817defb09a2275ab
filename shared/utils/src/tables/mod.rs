//! Spreadsheet Table Source
//! 
//! Decodes spreadsheet uploads into `RawTable`s for the extraction pipeline.
//! Supports CSV and Excel (XLSX/XLS) workbooks; every non-empty worksheet
//! becomes one table.

pub mod reader;

pub use reader::{SpreadsheetDocument, SpreadsheetFormat, SpreadsheetReader};
