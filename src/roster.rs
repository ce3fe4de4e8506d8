//! Projection of a parsed spreadsheet into certificate recipients.

use std::collections::BTreeMap;

use calamine::Data;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sheet::{ColumnKey, ParsedTable, cell_to_string};

const NAME_HINTS: [&str; 2] = ["name", "student"];
const EMAIL_HINTS: [&str; 2] = ["email", "mail"];

/// One certificate recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub email: String,
    /// Additional named fields. Never populated by [`map_records`].
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, email: E) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// Build records from two columns of `table`.
///
/// A row becomes a record only when both cells are non-empty after
/// trimming; other rows are skipped without error. Source order is kept and
/// duplicates are not collapsed. A key with no column in `table` reads as
/// empty in every row.
pub fn map_records(table: &ParsedTable, name_key: ColumnKey, email_key: ColumnKey) -> Vec<Record> {
    let cell = |row: &[Data], key: ColumnKey| {
        table
            .column(key)
            .and_then(|column| trimmed_cell(row, column.key))
    };
    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        match (cell(row, name_key), cell(row, email_key)) {
            (Some(name), Some(email)) => records.push(Record::new(name, email)),
            // +2: one for the header, one for 1-based sheet rows
            _ => debug!(row = idx + 2, "row lacks a name or email; skipped"),
        }
    }
    debug!(
        kept = records.len(),
        dropped = table.rows.len() - records.len(),
        name = %name_key,
        email = %email_key,
        "mapped spreadsheet rows"
    );
    records
}

fn trimmed_cell(row: &[Data], key: ColumnKey) -> Option<String> {
    let text = row.get(key.index()).map(cell_to_string)?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Columns pre-selected from header labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnSuggestion {
    pub name: Option<ColumnKey>,
    pub email: Option<ColumnKey>,
}

impl ColumnSuggestion {
    /// Both columns, when both were found.
    pub fn complete(&self) -> Option<(ColumnKey, ColumnKey)> {
        Some((self.name?, self.email?))
    }
}

/// Pick the first column whose label mentions a name and the first whose
/// label mentions an email, case-insensitively.
pub fn suggest_columns(table: &ParsedTable) -> ColumnSuggestion {
    let find = |hints: &[&str]| {
        table
            .columns
            .iter()
            .find(|column| {
                let label = column.label.to_lowercase();
                hints.iter().any(|hint| label.contains(hint))
            })
            .map(|column| column.key)
    };
    ColumnSuggestion {
        name: find(&NAME_HINTS),
        email: find(&EMAIL_HINTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::table_from_grid;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Data {
        if value.is_empty() {
            Data::Empty
        } else {
            Data::String(value.to_string())
        }
    }

    fn table(rows: &[&[&str]]) -> ParsedTable {
        let grid = rows
            .iter()
            .map(|row| row.iter().map(|value| text(value)).collect())
            .collect();
        table_from_grid(grid).unwrap()
    }

    #[test]
    fn keeps_rows_with_both_cells_in_order() {
        let table = table(&[
            &["Name", "Email", "Notes"],
            &["  Jane Doe ", " jane@example.com", ""],
            &["", "ghost@example.com", "no name"],
            &["Bob", "   ", "blank email"],
            &["Ada", "ada@example.com", ""],
            &["Ada", "ada@example.com", "duplicate"],
        ]);
        let records = map_records(&table, ColumnKey::new(0), ColumnKey::new(1));

        assert_eq!(
            records,
            vec![
                Record::new("Jane Doe", "jane@example.com"),
                Record::new("Ada", "ada@example.com"),
                Record::new("Ada", "ada@example.com"),
            ]
        );
        let dropped = table.rows.len() - records.len();
        assert_eq!(dropped + records.len(), 5);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn numeric_cells_are_stringified() {
        let grid = vec![
            vec![text("Id"), text("Mail")],
            vec![Data::Float(7.0), text("seven@example.com")],
            vec![Data::Int(0), text("zero@example.com")],
        ];
        let table = table_from_grid(grid).unwrap();
        let records = map_records(&table, ColumnKey::new(0), ColumnKey::new(1));
        assert_eq!(records[0].name, "7");
        assert_eq!(records[1].name, "0");
    }

    #[test]
    fn out_of_range_key_yields_nothing() {
        let table = table(&[&["Name", "Email"], &["Jane", "jane@example.com"]]);
        assert!(map_records(&table, ColumnKey::new(0), ColumnKey::new(9)).is_empty());
    }

    #[test]
    fn cells_beyond_the_header_are_not_mapped() {
        let table = table(&[
            &["Name", "Email"],
            &["Jane", "jane@example.com", "stray@example.com"],
        ]);
        assert_eq!(table.columns.len(), 2);
        assert!(map_records(&table, ColumnKey::new(0), ColumnKey::new(2)).is_empty());
        assert_eq!(
            map_records(&table, ColumnKey::new(0), ColumnKey::new(1)),
            vec![Record::new("Jane", "jane@example.com")]
        );
    }

    #[test]
    fn suggestion_takes_first_matching_label() {
        let table = table(&[
            &["ID", "Student", "Full Name", "E-Mail Address", "Email"],
            &["1", "Jane", "Jane Doe", "jane@example.com", "j@example.com"],
        ]);
        let suggestion = suggest_columns(&table);
        assert_eq!(suggestion.name, Some(ColumnKey::new(1)));
        assert_eq!(suggestion.email, Some(ColumnKey::new(3)));
        assert_eq!(
            suggestion.complete(),
            Some((ColumnKey::new(1), ColumnKey::new(3)))
        );
    }

    #[test]
    fn suggestion_can_be_partial() {
        let table = table(&[&["Participant", "Contact"], &["Jane", "jane@example.com"]]);
        let suggestion = suggest_columns(&table);
        assert_eq!(suggestion, ColumnSuggestion::default());
        assert_eq!(suggestion.complete(), None);
    }

    #[test]
    fn extra_fields_serialize_flat() {
        let mut record = Record::new("Jane", "jane@example.com");
        record.extra.insert("course".into(), "Rust 101".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Jane", "email": "jane@example.com", "course": "Rust 101"})
        );
    }
}
