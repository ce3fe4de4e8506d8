//! Spreadsheet decoding into a column catalog plus raw data rows.
//!
//! Only the first sheet of a workbook is read and its first row is the
//! header. Bytes that are not a workbook but decode as UTF-8 text are read
//! as comma-separated values.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use thiserror::Error;
use tracing::debug;

const COLUMN_KEY_PREFIX: &str = "col_";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not a readable spreadsheet: {0}")]
    Unreadable(String),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("spreadsheet must have at least a header row and one data row (found {found} row(s))")]
    TooFewRows { found: usize },
    #[error("invalid column key '{0}' (expected col_<index>)")]
    InvalidColumnKey(String),
}

/// Position-based column identifier, rendered as `col_<index>`.
///
/// Keys never depend on header text, so blank or duplicated headers cannot
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey(usize);

impl ColumnKey {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", COLUMN_KEY_PREFIX, self.0)
    }
}

impl FromStr for ColumnKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .strip_prefix(COLUMN_KEY_PREFIX)
            .and_then(|digits| digits.parse::<usize>().ok())
            .map(ColumnKey)
            .ok_or_else(|| ParseError::InvalidColumnKey(s.to_string()))
    }
}

/// A single spreadsheet field as seen in the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: ColumnKey,
    pub label: String,
    /// Non-blank data cells of this column, top to bottom. Informational only.
    pub values: Vec<String>,
}

/// Decoded first sheet: header-derived columns plus the untouched data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Data>>,
}

impl ParsedTable {
    /// Look up a column by key.
    pub fn column(&self, key: ColumnKey) -> Option<&Column> {
        self.columns.get(key.index())
    }
}

/// Decode spreadsheet bytes into a [`ParsedTable`].
pub fn parse_table(bytes: &[u8]) -> Result<ParsedTable, ParseError> {
    let grid = match read_first_sheet(bytes) {
        Ok(grid) => grid,
        Err(ParseError::Unreadable(reason)) => match read_delimited(bytes) {
            Some(grid) => {
                debug!(%reason, "input is not a workbook; read as CSV");
                grid
            }
            None => return Err(ParseError::Unreadable(reason)),
        },
        Err(err) => return Err(err),
    };
    table_from_grid(grid)
}

/// Stringify a cell the way it is shown to users and matched by the mapper.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.clone(),
        Data::DurationIso(v) => v.clone(),
        Data::Error(v) => v.to_string(),
        Data::Empty => String::new(),
    }
}

pub(crate) fn table_from_grid(mut grid: Vec<Vec<Data>>) -> Result<ParsedTable, ParseError> {
    if grid.len() < 2 {
        return Err(ParseError::TooFewRows { found: grid.len() });
    }
    let header = grid.remove(0);
    let rows = grid;
    let width = column_count(&header);

    let columns = (0..width)
        .map(|index| {
            let label = header
                .get(index)
                .map(cell_to_string)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| format!("Column {}", index + 1));
            let values = rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(cell_to_string)
                .filter(|text| !text.trim().is_empty())
                .collect();
            Column {
                key: ColumnKey(index),
                label,
                values,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        columns = columns.len(),
        rows = rows.len(),
        "parsed spreadsheet"
    );
    Ok(ParsedTable { columns, rows })
}

/// One column per header position, up to the last non-blank header cell.
/// Data cells further right are not part of any column.
fn column_count(header: &[Data]) -> usize {
    header
        .iter()
        .rposition(|cell| !cell_to_string(cell).trim().is_empty())
        .map_or(0, |index| index + 1)
}

fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<Data>>, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| ParseError::Unreadable(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoSheets)?
        .map_err(|err| ParseError::Unreadable(err.to_string()))?;
    Ok(range.rows().map(<[Data]>::to_vec).collect())
}

fn read_delimited(bytes: &[u8]) -> Option<Vec<Vec<Data>>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.contains('\0') {
        return None;
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Data::Empty
                    } else {
                        Data::String(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Some(grid)
}
