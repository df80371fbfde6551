//! Error types for fichas-extract.

use thiserror::Error;

/// Failures turning file bytes into a [`crate::Workbook`].
///
/// A workbook that decodes fine but lacks the expected sheets is *not* an
/// error; see [`crate::FormExtractor::extract`].
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// The file extension is not a recognised spreadsheet format.
    #[error("unsupported spreadsheet type: {0}")]
    Unsupported(String),

    /// Error from the spreadsheet container reader.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Error from the CSV reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An A1-style cell reference could not be parsed.
    #[error("invalid cell reference `{0}`")]
    InvalidCellRef(String),
}
