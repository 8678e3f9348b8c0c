//! One step per table family, run in a fixed order.
//!
//! Steps hand foreign keys to each other through [`Links`]: a vector of ids
//! per source row, kept in memory when the steps share a process and read
//! back from the event files otherwise.

pub mod accidents;
pub mod airports;
pub mod day_periods;
pub mod dependencies;
pub mod dimension;
pub mod locations;
pub mod preprocess;
pub mod road_features;
pub mod weather;
pub mod weather_conditions;

pub use dependencies::*;
pub use dimension::Dimension;

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::events::{self, EventFormat};
use crate::parser::{convert, SourceTable, SqlValue};
use crate::schema::{self, ColumnType, TableSchema};
use crate::ui::Ui;
use crate::writer::{render_inserts, write_sql};

/// A unit of work producing one family of tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Preprocess,
    WeatherConditions,
    DayPeriods,
    Weather,
    Airports,
    Locations,
    RoadFeatures,
    Accidents,
}

impl Step {
    /// All steps in execution order
    pub const ALL: [Step; 8] = [
        Step::Preprocess,
        Step::WeatherConditions,
        Step::DayPeriods,
        Step::Weather,
        Step::Airports,
        Step::Locations,
        Step::RoadFeatures,
        Step::Accidents,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Preprocess => "preprocess",
            Step::WeatherConditions => "weather_conditions",
            Step::DayPeriods => "day_periods",
            Step::Weather => "weather",
            Step::Airports => "airports",
            Step::Locations => "locations",
            Step::RoadFeatures => "road_features",
            Step::Accidents => "accidents",
        }
    }

    /// Steps whose outputs this step reads
    pub fn dependencies(&self) -> &'static [Step] {
        match self {
            Step::Preprocess => &[],
            Step::WeatherConditions | Step::DayPeriods | Step::Airports | Step::RoadFeatures => {
                &[Step::Preprocess]
            }
            Step::Weather => &[Step::WeatherConditions, Step::DayPeriods],
            Step::Locations => &[Step::Airports],
            Step::Accidents => &[Step::Weather, Step::Locations, Step::RoadFeatures],
        }
    }

    /// Tables whose INSERT scripts this step writes
    pub fn tables(&self) -> &'static [&'static TableSchema] {
        match self {
            Step::Preprocess => &[],
            Step::WeatherConditions => WEATHER_CONDITIONS_TABLES,
            Step::DayPeriods => DAY_PERIODS_TABLES,
            Step::Weather => WEATHER_TABLES,
            Step::Airports => AIRPORTS_TABLES,
            Step::Locations => LOCATIONS_TABLES,
            Step::RoadFeatures => ROAD_FEATURES_TABLES,
            Step::Accidents => ACCIDENTS_TABLES,
        }
    }
}

static WEATHER_CONDITIONS_TABLES: &[&TableSchema] =
    &[&schema::WEATHER_CONDITIONS, &schema::WEATHER_CONDITIONS_EVENTS];
static DAY_PERIODS_TABLES: &[&TableSchema] = &[&schema::DAY_PERIODS, &schema::PERIOD_EVENTS];
static WEATHER_TABLES: &[&TableSchema] = &[&schema::WEATHER];
static AIRPORTS_TABLES: &[&TableSchema] = &[&schema::AIRPORTS];
static LOCATIONS_TABLES: &[&TableSchema] = &[&schema::LOCATIONS];
static ROAD_FEATURES_TABLES: &[&TableSchema] = &[&schema::ROAD_FEATURES];
static ACCIDENTS_TABLES: &[&TableSchema] = &[&schema::ACCIDENTS];

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Step::ALL
            .iter()
            .copied()
            .find(|step| step.name() == wanted)
            .ok_or_else(|| anyhow!("Unknown step: {}", s))
    }
}

/// Ids handed from one step to the next, one entry per source row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    WeatherConditionIds,
    DayPeriodIds,
    WeatherIds,
    AirportCodes,
    LocationIds,
    RoadFeatureIds,
}

impl Link {
    pub fn label(&self) -> &'static str {
        match self {
            Link::WeatherConditionIds => "weather condition ids",
            Link::DayPeriodIds => "day period ids",
            Link::WeatherIds => "weather ids",
            Link::AirportCodes => "airport codes",
            Link::LocationIds => "location ids",
            Link::RoadFeatureIds => "road feature ids",
        }
    }

    /// File the link is recovered from when not in memory
    pub fn source(&self, config: &Config) -> (PathBuf, EventFormat) {
        let paths = &config.paths;
        match self {
            Link::WeatherConditionIds => (
                config.resolve(&paths.weather_conditions_events),
                EventFormat::EventStatements,
            ),
            Link::DayPeriodIds => (
                config.resolve(&paths.day_periods_events),
                EventFormat::EventStatements,
            ),
            Link::WeatherIds => (config.resolve(&paths.weather_sql), EventFormat::InsertTuples),
            Link::AirportCodes => (
                config.resolve(&paths.airport_events),
                EventFormat::CsvText("Airport_Code"),
            ),
            Link::LocationIds => (config.resolve(&paths.locations_sql), EventFormat::InsertTuples),
            Link::RoadFeatureIds => (
                config.resolve(&paths.road_features_events),
                EventFormat::CsvIntegers("Road_Feature_ID"),
            ),
        }
    }
}

/// In-memory foreign keys produced by earlier steps
#[derive(Debug, Default)]
pub struct Links {
    values: HashMap<Link, Vec<SqlValue>>,
}

impl Links {
    pub fn provide(&mut self, link: Link, values: Vec<SqlValue>) {
        self.values.insert(link, values);
    }

    pub fn get(&self, link: Link) -> Option<&[SqlValue]> {
        self.values.get(&link).map(|v| v.as_slice())
    }
}

/// One generated file
#[derive(Debug, Clone)]
pub struct TableOutput {
    pub table: &'static str,
    pub rows: usize,
    pub path: PathBuf,
}

/// What a step produced
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    pub outputs: Vec<TableOutput>,
}

impl StepReport {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            outputs: Vec::new(),
        }
    }

    pub fn push(&mut self, table: &'static str, rows: usize, path: PathBuf) {
        self.outputs.push(TableOutput { table, rows, path });
    }

    pub fn total_rows(&self) -> usize {
        self.outputs.iter().map(|o| o.rows).sum()
    }

    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .outputs
            .iter()
            .map(|o| format!("{} {}", o.table, o.rows))
            .collect();
        format!("{}: {}", self.step, parts.join(", "))
    }
}

/// Runs steps against a configuration, carrying links between them
pub struct Pipeline {
    config: Config,
    links: Links,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            links: Links::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a single step
    pub fn run_step(&mut self, step: Step, ui: &mut impl Ui) -> Result<StepReport> {
        info!(step = step.name(), "running step");
        let report = match step {
            Step::Preprocess => preprocess::run(self)?,
            Step::WeatherConditions => weather_conditions::run(self)?,
            Step::DayPeriods => day_periods::run(self)?,
            Step::Weather => weather::run(self)?,
            Step::Airports => airports::run(self)?,
            Step::Locations => locations::run(self)?,
            Step::RoadFeatures => road_features::run(self)?,
            Step::Accidents => accidents::run(self)?,
        };

        for output in &report.outputs {
            ui.log(format!(
                "{}: {} rows -> {}",
                output.table,
                output.rows,
                output.path.display()
            ));
        }
        Ok(report)
    }

    pub(crate) fn provide(&mut self, link: Link, values: Vec<SqlValue>) {
        debug!("{} provided in memory ({} rows)", link.label(), values.len());
        self.links.provide(link, values);
    }

    /// Related ids for a table of `len` rows, padded with NULL when short
    pub(crate) fn link(&self, link: Link, len: usize, label: &str) -> Result<Vec<SqlValue>> {
        let values = match self.links.get(link) {
            Some(values) => values.to_vec(),
            None => {
                let (path, format) = link.source(&self.config);
                debug!("reading {} from {}", link.label(), path.display());
                events::read_event_ids(&path, &format)?
            }
        };
        Ok(events::align(values, len, label))
    }

    /// Render and write the INSERT script of a table
    pub(crate) fn write_table(
        &self,
        report: &mut StepReport,
        schema: &'static TableSchema,
        path: &std::path::Path,
        rows: &[Vec<SqlValue>],
    ) -> Result<()> {
        let path = self.config.resolve(path);
        write_sql(&path, &render_inserts(schema, rows))?;
        report.push(schema.name, rows.len(), path);
        Ok(())
    }
}

/// Convert one field, substituting NULL (with a warning) when it does not parse
pub(crate) fn convert_or_null(
    table: &SourceTable,
    row: usize,
    column: &str,
    col_type: ColumnType,
) -> SqlValue {
    match convert(table.get(row, column), col_type) {
        Ok(value) => value,
        Err(e) => {
            warn!("row {} column {}: {}, using NULL", row + 1, column, e);
            SqlValue::Null
        }
    }
}

/// Count of non-NULL values
pub(crate) fn count_present(values: &[SqlValue]) -> usize {
    values.iter().filter(|v| !v.is_null()).count()
}

/// `1..=n` as integer values
pub(crate) fn sequential_ids(n: usize) -> Vec<SqlValue> {
    (1..=n as i64).map(SqlValue::Integer).collect()
}
