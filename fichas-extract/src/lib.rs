//! # fichas-extract
//!
//! Reads WBS closure workbooks.
//!
//! [`decode`] turns the bytes of an `.xlsx`/`.xlsm`/`.xls`/`.csv` file into an
//! in-memory [`Workbook`]; [`FormExtractor::extract`] then locates the
//! project code and the closure notes across loosely named sheets.

pub mod decode;
pub mod error;
pub mod form;
pub mod workbook;

pub use decode::{decode, is_spreadsheet};
pub use error::WorkbookError;
pub use form::{CodeSource, Extraction, FormExtractor, QUALITY_TARGET};
pub use workbook::{Cell, CellRef, Sheet, Workbook};
