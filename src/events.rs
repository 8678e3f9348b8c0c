//! Positional ID hand-off files.
//!
//! A step that runs on its own (the `generate` command, or the external
//! process `suite`) cannot see the ids assigned by earlier steps in memory.
//! It recovers them from the files those steps wrote: row N of the sibling
//! file belongs to row N of the current table.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

use crate::parser::{normalize_field, SqlValue};

/// `(42, ...` at the start of an INSERT tuple line
static TUPLE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\((\d+)\s*[,)]").expect("valid regex"));

/// `INSERT INTO X (a, b) VALUES (1, 7);`
static EVENT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^INSERT INTO\s+\w+\s*\([^)]*\)\s*VALUES\s*\(\s*(\d+)\s*,\s*(\d+|NULL)\s*\)\s*;")
        .expect("valid regex")
});

/// How ids are laid out in a sibling file
#[derive(Debug, Clone, PartialEq)]
pub enum EventFormat {
    /// Batched INSERT file; the leading integer of every tuple line
    InsertTuples,
    /// One `INSERT ... VALUES (event, id);` per line; the referenced id
    EventStatements,
    /// CSV with a header; one column, integers
    CsvIntegers(&'static str),
    /// CSV with a header; one column, kept as text
    CsvText(&'static str),
}

/// Read the ids of a sibling file, in file order.
///
/// A missing file is not an error: it yields no ids, and the caller pads
/// the related column with NULL.
pub fn read_event_ids(path: &Path, format: &EventFormat) -> Result<Vec<SqlValue>> {
    if !path.exists() {
        warn!("event file {} not found, related ids will be NULL", path.display());
        return Ok(Vec::new());
    }

    match format {
        EventFormat::InsertTuples => read_lines(path, parse_tuple_line),
        EventFormat::EventStatements => read_lines(path, parse_event_statement),
        EventFormat::CsvIntegers(column) => read_csv_column(path, column, true),
        EventFormat::CsvText(column) => read_csv_column(path, column, false),
    }
}

fn read_lines(path: &Path, parse: fn(&str) -> Option<SqlValue>) -> Result<Vec<SqlValue>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read line in {:?}", path))?;
        if let Some(id) = parse(line.trim()) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Leading id of an INSERT tuple line, if the line is one
pub fn parse_tuple_line(line: &str) -> Option<SqlValue> {
    let caps = TUPLE_ID.captures(line)?;
    caps[1].parse().ok().map(SqlValue::Integer)
}

/// Referenced id of a single-row event statement
pub fn parse_event_statement(line: &str) -> Option<SqlValue> {
    let caps = EVENT_STATEMENT.captures(line)?;
    match &caps[2] {
        "NULL" => Some(SqlValue::Null),
        id => id.parse().ok().map(SqlValue::Integer),
    }
}

fn read_csv_column(path: &Path, column: &str, integers: bool) -> Result<Vec<SqlValue>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let headers = reader.headers()?.clone();
    let Some(idx) = headers.iter().position(|h| h.trim() == column) else {
        warn!("{} has no {} column", path.display(), column);
        return Ok(Vec::new());
    };

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read {:?}", path))?;
        let field = record.get(idx).and_then(normalize_field);
        let value = match field {
            None => SqlValue::Null,
            Some(raw) if integers => match raw.parse::<i64>() {
                Ok(id) => SqlValue::Integer(id),
                Err(_) => {
                    warn!("{}: {:?} is not an id, using NULL", path.display(), raw);
                    SqlValue::Null
                }
            },
            Some(raw) => SqlValue::Text(raw),
        };
        values.push(value);
    }
    Ok(values)
}

/// Fit related ids to a table of `len` rows.
///
/// Missing entries become NULL and surplus entries are dropped, both with a
/// warning. The table itself is never shortened.
pub fn align(mut values: Vec<SqlValue>, len: usize, label: &str) -> Vec<SqlValue> {
    if values.len() < len {
        warn!(
            "{}: only {} related ids for {} rows, padding with NULL",
            label,
            values.len(),
            len
        );
        values.resize(len, SqlValue::Null);
    } else if values.len() > len {
        warn!(
            "{}: {} related ids for {} rows, ignoring the surplus",
            label,
            values.len(),
            len
        );
        values.truncate(len);
    }
    values
}
