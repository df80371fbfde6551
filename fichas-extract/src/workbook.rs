//! In-memory workbook model.
//!
//! Only what the extractor reads is modelled: sheet names and a grid of
//! display values addressed from `A1`. Formulas, styles and merged ranges are
//! out of scope; cells carry their cached value.

use std::fmt;
use std::str::FromStr;

use crate::error::WorkbookError;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// The cell rendered as text, or `None` when it is empty.
    ///
    /// Integral numbers print without a fractional part, so a code typed as
    /// `12345` reads back as `"12345"` and not `"12345.0"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// `true` for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_owned())
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

// ---------------------------------------------------------------------------
// CellRef
// ---------------------------------------------------------------------------

/// Zero-based cell coordinates, parsed from A1 notation (`"H27"` is row 26,
/// column 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl FromStr for CellRef {
    type Err = WorkbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WorkbookError::InvalidCellRef(s.to_string());
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut col = 0usize;
        for c in letters.chars() {
            let value = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(value))
                .ok_or_else(invalid)?;
        }
        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(Self::new(row - 1, col - 1))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let letters: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", letters, self.row + 1)
    }
}

// ---------------------------------------------------------------------------
// Sheet / Workbook
// ---------------------------------------------------------------------------

/// One worksheet: a name and a dense, ragged grid of rows anchored at `A1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Place `cell` at `at`, growing the grid as needed.
    pub fn put(&mut self, at: CellRef, cell: Cell) {
        if self.rows.len() <= at.row {
            self.rows.resize_with(at.row + 1, Vec::new);
        }
        let row = &mut self.rows[at.row];
        if row.len() <= at.col {
            row.resize_with(at.col + 1, Cell::default);
        }
        row[at.col] = cell;
    }

    /// Builder form of [`Sheet::put`].
    pub fn with_cell(mut self, at: CellRef, cell: impl Into<Cell>) -> Self {
        self.put(at, cell.into());
        self
    }

    /// The cell at `at`; out-of-range reads are [`Cell::Empty`].
    pub fn cell(&self, at: CellRef) -> &Cell {
        self.rows
            .get(at.row)
            .and_then(|row| row.get(at.col))
            .unwrap_or(&EMPTY)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// A decoded spreadsheet file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("A1", 0, 0)]
    #[case("H27", 26, 7)]
    #[case("a2", 1, 0)]
    #[case("Z10", 9, 25)]
    #[case("AA1", 0, 26)]
    #[case("AZ3", 2, 51)]
    fn parses_a1_references(#[case] input: &str, #[case] row: usize, #[case] col: usize) {
        let at: CellRef = input.parse().expect("parse");
        assert_eq!(at, CellRef::new(row, col));
    }

    #[rstest]
    #[case("")]
    #[case("27")]
    #[case("H")]
    #[case("H0")]
    #[case("H-1")]
    #[case("1H")]
    #[case("É4")]
    fn rejects_malformed_references(#[case] input: &str) {
        assert!(input.parse::<CellRef>().is_err(), "{input} should not parse");
    }

    #[test]
    fn display_is_inverse_of_parse() {
        for s in ["A1", "H27", "Z9", "AA10", "AZ3", "BA100"] {
            let at: CellRef = s.parse().expect("parse");
            assert_eq!(at.to_string(), s);
        }
    }

    #[test]
    fn out_of_range_cells_are_empty() {
        let sheet = Sheet::new("Portada").with_cell(CellRef::new(1, 1), "x");
        assert_eq!(sheet.cell(CellRef::new(1, 1)), &Cell::Text("x".into()));
        assert_eq!(sheet.cell(CellRef::new(0, 5)), &Cell::Empty);
        assert_eq!(sheet.cell(CellRef::new(40, 0)), &Cell::Empty);
    }

    #[test]
    fn numbers_render_without_spurious_fraction() {
        assert_eq!(Cell::Number(12345.0).as_text().as_deref(), Some("12345"));
        assert_eq!(Cell::Number(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(Cell::Bool(true).as_text().as_deref(), Some("true"));
        assert_eq!(Cell::Empty.as_text(), None);
    }

    #[test]
    fn blank_detection() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("   ".into()).is_blank());
        assert!(!Cell::Text(" x ".into()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }
}
