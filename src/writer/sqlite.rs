use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::schema_gen::{generate_create_table, generate_indexes};
use crate::config::Config;
use crate::schema::{TableSchema, ALL_TABLES};
use crate::ui::Ui;

/// Loads generated INSERT scripts into a fresh SQLite database
pub struct SqliteLoader {
    conn: Connection,
}

impl SqliteLoader {
    pub fn new(db_path: &Path) -> Result<Self> {
        // Always start from an empty database
        if db_path.exists() {
            fs::remove_file(db_path).context("Failed to remove existing database")?;
        }
        super::ensure_parent(db_path)?;

        let conn = Connection::open(db_path).context("Failed to create database")?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Ok(Self { conn })
    }

    /// Create every table and its foreign key indexes
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        info!("creating {} tables", schemas.len());

        for schema in schemas {
            let sql = generate_create_table(schema);
            self.conn
                .execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn
                    .execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(())
    }

    /// Execute one generated script in a transaction; returns the table's row count.
    /// A missing script is skipped with a warning.
    pub fn load_script(&mut self, schema: &TableSchema, script: &Path) -> Result<u64> {
        if !script.exists() {
            warn!("{}: {} not found, skipping", schema.name, script.display());
            return Ok(0);
        }

        let sql = fs::read_to_string(script)
            .with_context(|| format!("Failed to read: {:?}", script))?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .with_context(|| format!("Failed to execute {:?}", script))?;
        tx.commit()?;

        self.count(schema.name)
    }

    pub fn count(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("Failed to count rows of {}", table))?;
        Ok(count as u64)
    }

    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// Script for `schema`, taken from `input_dir` when given instead of the
/// configured output path.
fn script_path(config: &Config, schema: &TableSchema, input_dir: Option<&Path>) -> Option<PathBuf> {
    let configured = config.table_sql(schema.name)?;
    match input_dir {
        Some(dir) => configured.file_name().map(|name| dir.join(name)),
        None => Some(configured),
    }
}

/// Build a SQLite database from the generated scripts, in dependency order
pub fn load_sql_files(
    db_path: &Path,
    config: &Config,
    input_dir: Option<&Path>,
    ui: &mut impl Ui,
) -> Result<u64> {
    let mut loader = SqliteLoader::new(db_path)?;
    loader.create_tables(ALL_TABLES)?;

    let mut total: u64 = 0;
    for (idx, schema) in ALL_TABLES.iter().enumerate() {
        ui.set_progress(idx as u64, ALL_TABLES.len() as u64, schema.name);

        let Some(script) = script_path(config, schema, input_dir) else {
            warn!("{}: no script configured", schema.name);
            continue;
        };

        let rows = loader.load_script(schema, &script)?;
        ui.log(format!("{}: {} rows", schema.name, rows));
        total += rows;
    }
    ui.clear_progress();

    loader.finalize()?;
    info!("loaded {} rows into {}", total, db_path.display());
    Ok(total)
}
