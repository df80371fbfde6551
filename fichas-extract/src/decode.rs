//! Bytes → [`Workbook`].
//!
//! Excel containers go through `calamine`; `.csv` files become a single
//! sheet named after the file stem.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::WorkbookError;
use crate::workbook::{Cell, CellRef, Sheet, Workbook};

/// Extensions listed and decoded as spreadsheets.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsm", "xlsx", "xls", "csv"];

/// `true` when `file_name` carries a recognised spreadsheet extension
/// (case-insensitive).
pub fn is_spreadsheet(file_name: &str) -> bool {
    extension(file_name)
        .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decode the content of `file_name`.
pub fn decode(file_name: &str, bytes: Vec<u8>) -> Result<Workbook, WorkbookError> {
    match extension(file_name).as_deref() {
        Some("xlsx" | "xlsm" | "xls") => decode_excel(bytes),
        Some("csv") => decode_csv(file_stem(file_name), &bytes),
        _ => Err(WorkbookError::Unsupported(file_name.to_string())),
    }
}

fn decode_excel(bytes: Vec<u8>) -> Result<Workbook, WorkbookError> {
    let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();
    for name in reader.sheet_names() {
        let range = reader.worksheet_range(&name)?;
        sheets.push(sheet_from_range(name, &range));
    }
    Ok(Workbook::new(sheets))
}

fn sheet_from_range(name: String, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let Some((row0, col0)) = range.start() else {
        return sheet;
    };
    for (row, col, value) in range.cells() {
        let cell = cell_from_data(value);
        if cell == Cell::Empty {
            continue;
        }
        sheet.put(
            CellRef::new(row0 as usize + row, col0 as usize + col),
            cell,
        );
    }
    sheet
}

fn cell_from_data(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
    }
}

fn decode_csv(sheet_name: &str, bytes: &[u8]) -> Result<Workbook, WorkbookError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from).collect());
    }
    Ok(Workbook::new(vec![Sheet::from_rows(sheet_name, rows)]))
}

fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

fn file_stem(file_name: &str) -> &str {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Ficha.xlsx", true)]
    #[case("FICHA.XLSM", true)]
    #[case("old.xls", true)]
    #[case("export.csv", true)]
    #[case("notes.docx", false)]
    #[case("README", false)]
    #[case("archive.xlsx.bak", false)]
    fn recognises_spreadsheet_extensions(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_spreadsheet(name), expected);
    }

    #[test]
    fn csv_becomes_single_sheet_named_after_stem() {
        let bytes = b"Retos,Risk of delay\n,,\nLecciones,Plan,earlier\n".to_vec();
        let wb = decode("/docs/Ficha Cierre.csv", bytes).expect("decode");
        assert_eq!(wb.sheet_names(), vec!["Ficha Cierre"]);

        let sheet = &wb.sheets()[0];
        assert_eq!(sheet.cell(CellRef::new(0, 1)), &Cell::Text("Risk of delay".into()));
        assert_eq!(sheet.cell(CellRef::new(1, 0)), &Cell::Empty);
        assert_eq!(sheet.cell(CellRef::new(2, 2)), &Cell::Text("earlier".into()));
    }

    #[test]
    fn garbage_excel_bytes_fail_to_decode() {
        let err = decode("broken.xlsx", b"not a zip archive".to_vec()).expect_err("should fail");
        assert!(matches!(err, WorkbookError::Spreadsheet(_)), "got {err:?}");
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = decode("notes.txt", Vec::new()).expect_err("should fail");
        assert!(matches!(err, WorkbookError::Unsupported(_)));
    }
}
