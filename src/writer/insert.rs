use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::parser::SqlValue;
use crate::schema::TableSchema;

/// Maximum tuples per INSERT statement
pub const BATCH_SIZE: usize = 500;

/// Render rows as batched `INSERT INTO ... VALUES` statements.
///
/// Each statement carries at most [`BATCH_SIZE`] tuples, one per line.
pub fn render_inserts(schema: &TableSchema, rows: &[Vec<SqlValue>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("-- INSERT statements for {} table\n", schema.name));
    out.push_str(&format!("-- Total records: {}\n\n", rows.len()));

    let header = format!(
        "INSERT INTO {} ({}) VALUES\n",
        schema.name,
        schema.column_names().join(", ")
    );

    for batch in rows.chunks(BATCH_SIZE) {
        out.push_str(&header);
        let tuples: Vec<String> = batch.iter().map(|row| render_tuple(row)).collect();
        out.push_str(&tuples.join(",\n"));
        out.push_str(";\n");
    }

    out
}

/// `(v1, v2, ...)` with every value rendered as a SQL literal
pub fn render_tuple(row: &[SqlValue]) -> String {
    let values: Vec<String> = row.iter().map(SqlValue::to_sql_literal).collect();
    format!("({})", values.join(", "))
}

/// Render one single-row INSERT per event: `(Event_ID, <target id>)`.
///
/// Event ids are the 1-based position of the source row.
pub fn render_event_statements(schema: &TableSchema, targets: &[SqlValue]) -> String {
    let columns = schema.column_names().join(", ");
    let mut out = String::new();
    out.push_str(&format!("-- Inserts for {} table\n", schema.name));
    out.push_str(&format!("-- Total events: {}\n\n", targets.len()));

    for (idx, target) in targets.iter().enumerate() {
        out.push_str(&format!(
            "INSERT INTO {} ({}) VALUES ({}, {});\n",
            schema.name,
            columns,
            idx + 1,
            target.to_sql_literal()
        ));
    }

    out
}

/// Write a two-column CSV event file: `<position column>,<value column>`
pub fn write_event_csv(
    path: &Path,
    position_column: &str,
    value_column: &str,
    values: &[SqlValue],
) -> Result<()> {
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create: {:?}", path))?;
    writer.write_record([position_column, value_column])?;

    for (idx, value) in values.iter().enumerate() {
        let cell = match value {
            SqlValue::Null => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
        };
        writer.write_record([(idx + 1).to_string(), cell])?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write: {:?}", path))?;
    Ok(())
}

/// Write rendered SQL text to `path`, creating parent directories
pub fn write_sql(path: &Path, sql: &str) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("Failed to create: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(sql.as_bytes())
        .with_context(|| format!("Failed to write: {:?}", path))?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    Ok(())
}
