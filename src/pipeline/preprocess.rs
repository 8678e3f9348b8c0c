//! Airport deduplication and name backfill.
//!
//! Airport codes that occur under more than one timezone get their name
//! from the manual override map or the OurAirports database. Airport rows
//! that end up without a name are removed, and the same data rows are
//! dropped from every sibling extract so that row N keeps lining up across
//! files.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use super::{accidents, day_periods, locations, road_features, weather, weather_conditions};
use super::{Pipeline, Step, StepReport};
use crate::config::{Config, SourcePaths};
use crate::parser::{read_source, SourceLayout, SourceTable};
use crate::writer::ensure_parent;

const AIRPORT_NAME: &str = "Airport_Name";

/// Name lookups built from the OurAirports database
#[derive(Debug, Default)]
pub struct AirportNames {
    manual: BTreeMap<String, String>,
    by_ident: HashMap<String, String>,
    by_gps_code: HashMap<String, String>,
}

impl AirportNames {
    pub fn new(manual: BTreeMap<String, String>) -> Self {
        Self {
            manual,
            ..Default::default()
        }
    }

    /// Load `ident`/`gps_code` → `name` from the database CSV.
    ///
    /// Later rows win when a code appears twice.
    pub fn with_database(mut self, path: &Path) -> Result<Self> {
        let db = read_source(path, &SourceLayout::header())?;
        db.require_columns(&["ident", "gps_code", "name"])?;

        for row in 0..db.len() {
            let Some(name) = db.get(row, "name") else {
                continue;
            };
            if let Some(ident) = db.get(row, "ident") {
                self.by_ident.insert(ident.to_string(), name.to_string());
            }
            if let Some(gps) = db.get(row, "gps_code") {
                self.by_gps_code.insert(gps.to_string(), name.to_string());
            }
        }
        info!(
            "airport database: {} idents, {} gps codes",
            self.by_ident.len(),
            self.by_gps_code.len()
        );
        Ok(self)
    }

    /// Manual override, then `ident`, then `gps_code`
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.manual
            .get(code)
            .or_else(|| self.by_ident.get(code))
            .or_else(|| self.by_gps_code.get(code))
            .map(String::as_str)
    }
}

/// (Airport_Code, Timezone) combinations seen more than once, sorted
pub fn repeated_combinations(airports: &SourceTable) -> Vec<(String, String, usize)> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in 0..airports.len() {
        let code = airports.get(row, "Airport_Code").unwrap_or_default();
        let timezone = airports.get(row, "Timezone").unwrap_or_default();
        *counts
            .entry((code.to_string(), timezone.to_string()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((code, timezone), count)| (code, timezone, count))
        .collect()
}

/// Outcome of filtering the airports table
#[derive(Debug)]
pub struct AirportFilter {
    pub columns: Vec<String>,
    pub kept: Vec<Vec<String>>,
    /// Zero-based data-row indices that were removed
    pub removed: Vec<usize>,
}

/// Keep rows with a resolved or existing name, remove the rest
pub fn filter_airports(airports: &SourceTable, names: &HashMap<String, String>) -> AirportFilter {
    let mut columns = airports.columns.clone();
    let name_col = match columns.iter().position(|c| c == AIRPORT_NAME) {
        Some(idx) => idx,
        None => {
            columns.push(AIRPORT_NAME.to_string());
            columns.len() - 1
        }
    };

    let mut kept = Vec::new();
    let mut removed = Vec::new();

    for (idx, row) in airports.rows.iter().enumerate() {
        let mut fields: Vec<String> = row
            .iter()
            .map(|f| f.clone().unwrap_or_default())
            .collect();
        fields.resize(columns.len(), String::new());

        let code = airports.get(idx, "Airport_Code").unwrap_or_default();
        if let Some(name) = names.get(code) {
            fields[name_col] = name.clone();
            kept.push(fields);
        } else if !fields[name_col].trim().is_empty() {
            kept.push(fields);
        } else {
            removed.push(idx);
        }
    }

    AirportFilter {
        columns,
        kept,
        removed,
    }
}

/// Copy `source` to `dest`, keeping `skip_lines` preamble records and
/// dropping the listed data-row indices. Returns the rows written.
pub fn filter_sibling(
    source: &Path,
    dest: &Path,
    skip_lines: usize,
    removed: &BTreeSet<usize>,
) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(source)
        .with_context(|| format!("Failed to open: {:?}", source))?;

    ensure_parent(dest)?;
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(dest)
        .with_context(|| format!("Failed to create: {:?}", dest))?;

    let mut written = 0;
    for (line, record) in reader.records().enumerate() {
        let record: StringRecord =
            record.with_context(|| format!("Failed to read {:?}", source))?;
        if line < skip_lines {
            writer.write_record(&record)?;
            continue;
        }
        if removed.contains(&(line - skip_lines)) {
            continue;
        }
        writer.write_record(&record)?;
        written += 1;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write: {:?}", dest))?;
    Ok(written)
}

fn siblings(config: &Config) -> Vec<(&'static str, &SourcePaths, SourceLayout)> {
    let paths = &config.paths;
    vec![
        ("WEATHER_CONDITIONS", &paths.weather_conditions, weather_conditions::LAYOUT),
        ("WEATHER", &paths.weather, weather::LAYOUT),
        ("ROAD_FEATURES", &paths.road_features, road_features::LAYOUT),
        ("LOCATIONS", &paths.locations, locations::LAYOUT),
        ("DAY_PERIODS", &paths.day_periods, day_periods::LAYOUT),
        ("ACCIDENTS", &paths.accidents, accidents::LAYOUT),
    ]
}

fn load_names(config: &Config) -> Result<AirportNames> {
    let names = AirportNames::new(config.manual_airport_names.clone());
    let database = config.airports_database();
    if !database.exists() {
        warn!(
            "airport database {} not found, using manual names only (try `fetch-airports`)",
            database.display()
        );
        return Ok(names);
    }
    names.with_database(&database)
}

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let paths = &config.paths;
    let mut report = StepReport::new(Step::Preprocess);

    let airports = read_source(&config.resolve(&paths.airports_raw), &SourceLayout::header())?;
    airports.require_columns(&["Airport_Code", "Timezone"])?;

    // Repeated combinations
    let repeated = repeated_combinations(&airports);
    let repeated_path = config.resolve(&paths.airports_repeated);
    write_csv(
        &repeated_path,
        &["Airport_Code", "Timezone", "Occurrences"],
        repeated
            .iter()
            .map(|(code, tz, count)| vec![code.clone(), tz.clone(), count.to_string()]),
    )?;
    report.push("repeated airports", repeated.len(), repeated_path);

    // Names for the repeated codes
    let lookup = load_names(config)?;
    let mut resolved: HashMap<String, String> = HashMap::new();
    let mut unresolved: BTreeSet<&str> = BTreeSet::new();
    let named_rows: Vec<Vec<String>> = repeated
        .iter()
        .map(|(code, tz, count)| {
            let name = lookup.lookup(code).unwrap_or_default().to_string();
            if name.is_empty() {
                unresolved.insert(code.as_str());
            } else {
                resolved.insert(code.clone(), name.clone());
            }
            vec![code.clone(), tz.clone(), count.to_string(), name]
        })
        .collect();
    if !unresolved.is_empty() {
        warn!("airport codes without a name: {:?}", unresolved);
    }

    let named_path = config.resolve(&paths.airports_repeated_named);
    write_csv(
        &named_path,
        &["Airport_Code", "Timezone", "Occurrences", AIRPORT_NAME],
        named_rows.into_iter(),
    )?;
    report.push("named airports", resolved.len(), named_path);

    // Filtered airports table
    let filtered = filter_airports(&airports, &resolved);
    let filtered_path = config.resolve(&paths.airports_filtered);
    let header: Vec<&str> = filtered.columns.iter().map(String::as_str).collect();
    write_csv(&filtered_path, &header, filtered.kept.iter().cloned())?;
    report.push("filtered airports", filtered.kept.len(), filtered_path);
    info!(
        "airports: {} kept, {} removed for lack of a name",
        filtered.kept.len(),
        filtered.removed.len()
    );

    let indices_path = config.resolve(&paths.removed_indices);
    write_indices(&indices_path, &filtered.removed)?;
    report.push("removed indices", filtered.removed.len(), indices_path);

    // Same rows out of every sibling extract
    let removed: BTreeSet<usize> = filtered.removed.iter().copied().collect();
    for (name, source, layout) in siblings(config) {
        let raw = config.resolve(&source.raw);
        if !raw.exists() {
            warn!("{} extract {} not found, skipping", name, raw.display());
            continue;
        }
        let dest = config.resolve(&source.filtered);
        let rows = filter_sibling(&raw, &dest, layout.skip_lines, &removed)?;
        info!("{} filtered: {} rows -> {}", name, rows, dest.display());
        report.push(name, rows, dest);
    }

    Ok(report)
}

fn write_csv<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: Iterator<Item = Vec<String>>,
{
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create: {:?}", path))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write: {:?}", path))?;
    Ok(())
}

fn write_indices(path: &Path, indices: &[usize]) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("Failed to create: {:?}", path))?;
    let mut out = BufWriter::new(file);
    for idx in indices {
        writeln!(out, "{}", idx)?;
    }
    out.flush()?;
    Ok(())
}
