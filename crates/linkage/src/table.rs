//! In-memory tables: an ordered list of unique column names plus rows of
//! positionally aligned cells.
//!
//! The engine only ever borrows tables. Loading from CSV is provided as a
//! convenience for callers; cells read from CSV are text, with empty fields
//! becoming [`Cell::Null`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::{Read, Write};

use serde::ser::{Serialize, Serializer};

use crate::error::LinkError;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Emitted for the absent side of an outer-join row. Never produced by
    /// loading; distinct from an empty input cell.
    Missing,
    /// Empty input cell.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Text form used for comparison. Numbers use Rust's shortest
    /// round-trip formatting (no locale separators); `NaN` and empty cells
    /// become the empty string.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Missing | Self::Null => Cow::Borrowed(""),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) if f.is_nan() => Cow::Borrowed(""),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing | Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) if f.is_nan() => serializer.serialize_none(),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Cell {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, rejecting duplicate column names and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, LinkError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(LinkError::Table(format!("duplicate column '{col}'")));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(LinkError::Table(format!(
                    "row {i} has {} cell(s), expected {}",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Convenience constructor for literal data.
    pub fn from_rows<C, R, V>(columns: C, rows: R) -> Result<Self, LinkError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<V>>,
        V: Into<Cell>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    // -----------------------------------------------------------------------
    // CSV
    // -----------------------------------------------------------------------

    pub fn from_csv_str(data: &str) -> Result<Self, LinkError> {
        Self::from_csv_reader(data.as_bytes(), b',')
    }

    /// Read a headed CSV. Every field becomes [`Cell::Text`] except empty
    /// fields, which become [`Cell::Null`].
    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, LinkError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = record
                .iter()
                .map(|v| {
                    if v.is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(v.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    /// Write a headed CSV; missing and null cells become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), LinkError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.to_text().into_owned()))?;
        }
        wtr.flush().map_err(|e| LinkError::Io(e.to_string()))?;
        Ok(())
    }
}
