//! File ingestion and schema sniffing.
//!
//! Accepts raw file bytes plus the declared extension and produces an ordered
//! header list and ordered data rows. Cell values keep their source typing
//! (text vs. number) so that spreadsheet serial dates survive untouched until
//! a caller decides how to interpret them.

use std::io::Cursor;

use calamine::{Data, Reader, Xls, Xlsx};

use crate::TabularError;

/// A single loosely typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Render the cell as trimmed text. Whole numbers drop the fraction so a
    /// numeric identifier column does not grow a trailing `.0`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
        }
    }

    /// True when the cell holds non-empty text that is not itself a bare
    /// integer token. Used by the header sniffer: a label row is all text,
    /// while a data row typically leads with a numeric identifier.
    fn is_label_text(&self) -> bool {
        match self {
            Cell::Text(s) => {
                let t = s.trim();
                !t.is_empty() && !is_integer_token(t)
            }
            _ => false,
        }
    }

    /// True when the cell is a purely-integer token (typed number without a
    /// fraction, or digit-only text).
    fn is_integer_token(&self) -> bool {
        match self {
            Cell::Number(n) => n.fract() == 0.0,
            Cell::Text(s) => is_integer_token(s.trim()),
            Cell::Empty => false,
        }
    }
}

fn is_integer_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Parsed tabular data: ordered headers plus ordered data rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Position of a header, matched on the trimmed original text.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at (row, column), `Cell::Empty` when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or(Cell::Empty)
    }
}

/// Parse raw file bytes into a [`Sheet`] according to the declared extension.
///
/// Only the first worksheet of a workbook is read. Returns
/// [`TabularError::Empty`] when no data rows remain after dropping blank
/// rows, and [`TabularError::Unreadable`] when the bytes cannot be decoded.
pub fn parse_bytes(bytes: &[u8], extension: &str) -> Result<Sheet, TabularError> {
    let grid = match extension.trim().to_ascii_lowercase().as_str() {
        "csv" => parse_csv(bytes)?,
        "xlsx" => parse_workbook::<Xlsx<_>>(bytes, "xlsx")?,
        "xls" => parse_workbook::<Xls<_>>(bytes, "xls")?,
        other => return Err(TabularError::UnsupportedExtension(other.to_string())),
    };
    sniff(grid)
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TabularError::unreadable("csv", e.to_string()))?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        grid.push(row);
    }
    Ok(grid)
}

fn parse_workbook<R>(bytes: &[u8], kind: &'static str) -> Result<Vec<Vec<Cell>>, TabularError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        R::new(cursor).map_err(|e| TabularError::unreadable(kind, e.to_string()))?;

    // First sheet only.
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TabularError::Empty)?
        .map_err(|e| TabularError::unreadable(kind, e.to_string()))?;

    let mut grid = Vec::new();
    for row in range.rows() {
        let cells: Vec<Cell> = row.iter().map(convert_cell).collect();
        grid.push(cells);
    }
    Ok(grid)
}

fn convert_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("{e:?}")),
    }
}

/// Header-detection heuristic: the first row is a header iff every cell is
/// non-empty label text AND (there is no second row OR the second row holds
/// at least one purely-integer token). Distinguishes label rows from data
/// rows that begin with numeric identifiers.
fn sniff(grid: Vec<Vec<Cell>>) -> Result<Sheet, TabularError> {
    let mut rows: Vec<Vec<Cell>> = grid
        .into_iter()
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    if rows.is_empty() {
        return Err(TabularError::Empty);
    }

    let first_is_header = {
        let first = &rows[0];
        let all_labels = !first.is_empty() && first.iter().all(Cell::is_label_text);
        let second_has_integer = match rows.get(1) {
            None => true,
            Some(second) => second.iter().any(Cell::is_integer_token),
        };
        all_labels && second_has_integer
    };

    let headers = if first_is_header {
        rows.remove(0).iter().map(Cell::as_text).collect()
    } else {
        (1..=rows[0].len()).map(|i| format!("col_{i}")).collect()
    };

    if rows.is_empty() {
        return Err(TabularError::Empty);
    }

    Ok(Sheet { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_sheet(text: &str) -> Result<Sheet, TabularError> {
        parse_bytes(text.as_bytes(), "csv")
    }

    #[test]
    fn detects_header_row_before_numeric_data() {
        let sheet = csv_sheet("dpi,nombre\n1234567890123,Ana Lopez\n").unwrap();
        assert_eq!(sheet.headers, vec!["dpi", "nombre"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.cell(0, 1).as_text(), "Ana Lopez");
    }

    #[test]
    fn headerless_file_gets_positional_headers() {
        let sheet = csv_sheet("1234567890123,Ana Lopez\n9876543210987,Luis Paz\n").unwrap();
        assert_eq!(sheet.headers, vec!["col_1", "col_2"]);
        assert_eq!(sheet.rows.len(), 2);
    }

    #[test]
    fn all_text_rows_without_integers_are_data() {
        // Row 2 exists but has no integer token, so row 1 is not a header.
        let sheet = csv_sheet("alpha,beta\ngamma,delta\n").unwrap();
        assert_eq!(sheet.headers, vec!["col_1", "col_2"]);
        assert_eq!(sheet.rows.len(), 2);
    }

    #[test]
    fn single_label_row_is_a_header() {
        let err = csv_sheet("dpi,nombre\n").unwrap_err();
        assert!(matches!(err, TabularError::Empty));
    }

    #[test]
    fn blank_rows_are_dropped() {
        let sheet = csv_sheet("dpi,nombre\n,,\n1234567890123,Ana\n , \n").unwrap();
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(csv_sheet(""), Err(TabularError::Empty)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_bytes(b"x", "pdf").unwrap_err();
        assert!(matches!(err, TabularError::UnsupportedExtension(_)));
    }

    #[test]
    fn whole_number_cells_render_without_fraction() {
        assert_eq!(Cell::Number(32947.0).as_text(), "32947");
        assert_eq!(Cell::Number(1.5).as_text(), "1.5");
    }
}
