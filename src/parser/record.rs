use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Tokens treated as a missing value
const NULL_TOKENS: &[&str] = &["", "NULL", "null", "nan", "NaN", "NA"];

/// How the columns of a source CSV are laid out
#[derive(Debug, Clone)]
pub enum Columns {
    /// Positional columns after the preamble lines
    Named(&'static [&'static str]),
    /// Column names come from the first line of the file
    Header,
}

/// Layout of a source CSV extract
#[derive(Debug, Clone)]
pub struct SourceLayout {
    /// Lines before the first data row (table name, annotated header, ...)
    pub skip_lines: usize,
    pub columns: Columns,
}

impl SourceLayout {
    /// Fixed column names, skipping `skip_lines` preamble lines
    pub const fn named(skip_lines: usize, names: &'static [&'static str]) -> Self {
        Self {
            skip_lines,
            columns: Columns::Named(names),
        }
    }

    /// Header line provides the column names
    pub const fn header() -> Self {
        Self {
            skip_lines: 1,
            columns: Columns::Header,
        }
    }
}

/// A loaded, normalized CSV extract
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    index: HashMap<String, usize>,
}

impl SourceTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            columns,
            rows,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Ensure every listed column is present
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        let missing: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect();
        if !missing.is_empty() {
            bail!("Missing columns {:?} (found {:?})", missing, self.columns);
        }
        Ok(())
    }

    /// Field of `row` in `column`; `None` for NULL or an unknown column
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = *self.index.get(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

/// Trim a raw field and map NULL-ish tokens to the NULL sentinel
pub fn normalize_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if NULL_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read a CSV extract according to its layout
pub fn read_source(path: &Path, layout: &SourceLayout) -> Result<SourceTable> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    read_source_from(file, layout).with_context(|| format!("Failed to read CSV: {:?}", path))
}

pub fn read_source_from(reader: impl std::io::Read, layout: &SourceLayout) -> Result<SourceTable> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv.records();
    let mut header: Option<StringRecord> = None;

    for line in 0..layout.skip_lines {
        match records.next() {
            Some(record) => {
                let record = record.context("Failed to read preamble line")?;
                if line == 0 {
                    header = Some(record);
                }
            }
            None => break,
        }
    }

    let columns: Vec<String> = match &layout.columns {
        Columns::Named(names) => names.iter().map(|n| n.to_string()).collect(),
        Columns::Header => header
            .context("Missing header line")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.context("Failed to read record")?;
        let row: Vec<Option<String>> = (0..columns.len())
            .map(|i| record.get(i).and_then(normalize_field))
            .collect();
        rows.push(row);
    }

    Ok(SourceTable::new(columns, rows))
}
