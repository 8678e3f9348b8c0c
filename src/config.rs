//! Named logical paths for every input and output of the pipeline.
//!
//! Relative paths are resolved against `base_dir`. The defaults mirror the
//! `data/input`, `data/output`, `logs` layout the extracts are delivered in.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

/// Raw extract and its airport-filtered copy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcePaths {
    pub raw: PathBuf,
    pub filtered: PathBuf,
}

impl SourcePaths {
    fn new(stem: &str) -> Self {
        Self {
            raw: PathBuf::from(format!("data/input/{}.csv", stem)),
            filtered: PathBuf::from(format!("data/input/{}_filtrado.csv", stem)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,

    // Airport preprocessing
    pub airports_raw: PathBuf,
    /// OurAirports database, installed here by `fetch-airports`
    #[serde(default = "default_airports_database")]
    pub airports_database: PathBuf,
    pub airports_repeated: PathBuf,
    pub airports_repeated_named: PathBuf,
    pub airports_filtered: PathBuf,
    pub removed_indices: PathBuf,

    // Sibling extracts, filtered by the removed airport rows
    pub weather_conditions: SourcePaths,
    pub day_periods: SourcePaths,
    pub weather: SourcePaths,
    pub locations: SourcePaths,
    pub road_features: SourcePaths,
    pub accidents: SourcePaths,

    // Generated SQL and event files
    pub weather_conditions_sql: PathBuf,
    pub weather_conditions_events: PathBuf,
    pub day_periods_sql: PathBuf,
    pub day_periods_events: PathBuf,
    pub weather_sql: PathBuf,
    pub airports_sql: PathBuf,
    pub airport_events: PathBuf,
    pub locations_sql: PathBuf,
    pub road_features_sql: PathBuf,
    pub road_features_events: PathBuf,
    pub accidents_sql: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let output = |name: &str| PathBuf::from(format!("data/output/{}", name));
        Self {
            logs_dir: PathBuf::from("logs"),
            airports_raw: PathBuf::from("data/input/AIRPORTS.csv"),
            airports_database: default_airports_database(),
            airports_repeated: output("airports_repeated.csv"),
            airports_repeated_named: output("airports_repeated_named.csv"),
            airports_filtered: output("AIRPORTS_filtrado.csv"),
            removed_indices: output("removed_indices.txt"),
            weather_conditions: SourcePaths::new("WEATHER_CONDITIONS"),
            day_periods: SourcePaths::new("DAY_PERIODS"),
            weather: SourcePaths::new("WEATHER"),
            locations: SourcePaths::new("LOCATIONS"),
            road_features: SourcePaths::new("ROAD_FEATURES"),
            accidents: SourcePaths::new("ACCIDENTS"),
            weather_conditions_sql: output("WEATHER_CONDITIONS_insert.sql"),
            weather_conditions_events: output("WEATHER_CONDITIONS_events.sql"),
            day_periods_sql: output("DAY_PERIODS_insert.sql"),
            day_periods_events: output("DAY_PERIODS_events.sql"),
            weather_sql: output("WEATHER_insert.sql"),
            airports_sql: output("AIRPORTS_insert.sql"),
            airport_events: output("AIRPORTS_events.csv"),
            locations_sql: output("LOCATIONS_insert.sql"),
            road_features_sql: output("ROAD_FEATURES_insert.sql"),
            road_features_events: output("ROAD_FEATURES_events.csv"),
            accidents_sql: output("ACCIDENTS_insert.sql"),
        }
    }
}

fn default_airports_database() -> PathBuf {
    PathBuf::from("data/input/airports_database.csv")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub base_dir: PathBuf,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Airport names that neither `ident` nor `gps_code` resolve
    #[serde(default = "default_manual_airport_names")]
    pub manual_airport_names: BTreeMap<String, String>,
}

fn default_manual_airport_names() -> BTreeMap<String, String> {
    [
        ("K3A6", "Pacific City State Airport"),
        ("KATT", "Central City Municipal - Larry Reineke Field"),
        ("KCQT", "Pacific Valley Aviation Airport"),
        ("KMCJ", "Salina Municipal Airport"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

impl Config {
    /// Default layout rooted at `base_dir`
    pub fn default_for(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            paths: PathsConfig::default(),
            manual_airport_names: default_manual_airport_names(),
        }
    }

    /// Load from an explicit file, the user config dir, or fall back to
    /// defaults rooted at the current directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = user_config_path().filter(|p| p.exists()) {
            return Self::from_file(&path);
        }

        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        Ok(Self::default_for(cwd))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Failed to read config: {:?}", path))?;
        let mut config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        // A relative base_dir is relative to the config file itself
        if config.base_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.base_dir = parent.join(&config.base_dir);
            }
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Resolve a configured path against `base_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.resolve(&self.paths.logs_dir)
    }

    /// Generated script holding the rows of `table`
    pub fn table_sql(&self, table: &str) -> Option<PathBuf> {
        let paths = &self.paths;
        let path = match table {
            "WEATHER_CONDITIONS" => &paths.weather_conditions_sql,
            "WEATHER_CONDITIONS_EVENTS" => &paths.weather_conditions_events,
            "DAY_PERIODS" => &paths.day_periods_sql,
            "PERIOD_EVENTS" => &paths.day_periods_events,
            "WEATHER" => &paths.weather_sql,
            "AIRPORTS" => &paths.airports_sql,
            "location" => &paths.locations_sql,
            "ROAD_FEATURES" => &paths.road_features_sql,
            "ACCIDENTS" => &paths.accidents_sql,
            _ => return None,
        };
        Some(self.resolve(path))
    }

    pub fn airports_database(&self) -> PathBuf {
        self.resolve(&self.paths.airports_database)
    }
}

/// `config.json` in the per-user config directory
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "accidents-sql").map(|d| d.config_dir().join(CONFIG_FILE))
}
