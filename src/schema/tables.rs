//! Table definitions for the accidents relational schema

use super::types::*;

// =============================================================================
// Dimension Tables (deduplicated lookups)
// =============================================================================

pub static WEATHER_CONDITIONS: TableSchema = TableSchema {
    name: "WEATHER_CONDITIONS",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("Description", ColumnType::Text),
    ],
    primary_key: Some("id"),
    foreign_keys: &[],
};

pub static DAY_PERIODS: TableSchema = TableSchema {
    name: "DAY_PERIODS",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("Sunrise_Sunset", ColumnType::Text),
        Column::new("Civil_Twilight", ColumnType::Text),
        Column::new("Nautical_Twilight", ColumnType::Text),
        Column::new("Astronomical_Twilight", ColumnType::Text),
    ],
    primary_key: Some("id"),
    foreign_keys: &[],
};

pub static AIRPORTS: TableSchema = TableSchema {
    name: "AIRPORTS",
    columns: &[
        Column::required("Airport_Code", ColumnType::Text),
        Column::new("Name", ColumnType::Text),
        Column::new("Timezone", ColumnType::Text),
    ],
    primary_key: None,
    foreign_keys: &[],
};

pub static ROAD_FEATURES: TableSchema = TableSchema {
    name: "ROAD_FEATURES",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("Amenity", ColumnType::Boolean),
        Column::required("Bump", ColumnType::Boolean),
        Column::required("Crossing", ColumnType::Boolean),
        Column::required("Give_Way", ColumnType::Boolean),
        Column::required("Junction", ColumnType::Boolean),
        Column::required("No_Exit", ColumnType::Boolean),
        Column::required("Railway", ColumnType::Boolean),
        Column::required("Roundabout", ColumnType::Boolean),
        Column::required("Station", ColumnType::Boolean),
        Column::required("Stop", ColumnType::Boolean),
        Column::required("Traffic_Calming", ColumnType::Boolean),
        Column::required("Traffic_Signal", ColumnType::Boolean),
        Column::required("Turning_Loop", ColumnType::Boolean),
    ],
    primary_key: Some("id"),
    foreign_keys: &[],
};

// =============================================================================
// Event Tables (one row per source row, pointing at a dimension id)
// =============================================================================

pub static WEATHER_CONDITIONS_EVENTS: TableSchema = TableSchema {
    name: "WEATHER_CONDITIONS_EVENTS",
    columns: &[
        Column::required("Event_ID", ColumnType::Integer),
        Column::new("Weather_Condition_ID", ColumnType::Integer),
    ],
    primary_key: Some("Event_ID"),
    foreign_keys: &[ForeignKey::new("Weather_Condition_ID", "WEATHER_CONDITIONS")],
};

pub static PERIOD_EVENTS: TableSchema = TableSchema {
    name: "PERIOD_EVENTS",
    columns: &[
        Column::required("Event_ID", ColumnType::Integer),
        Column::new("day_period_id", ColumnType::Integer),
    ],
    primary_key: Some("Event_ID"),
    foreign_keys: &[ForeignKey::new("day_period_id", "DAY_PERIODS")],
};

// =============================================================================
// Fact Tables
// =============================================================================

pub static WEATHER: TableSchema = TableSchema {
    name: "WEATHER",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("Weather_Timestamp", ColumnType::Timestamp),
        Column::new("Temperature", ColumnType::Real),
        Column::new("Humidity", ColumnType::Real),
        Column::new("Pressure", ColumnType::Real),
        Column::new("Visibility", ColumnType::Real),
        Column::new("Wind_Direction", ColumnType::Text),
        Column::new("Wind_Speed", ColumnType::Real),
        Column::new("Precipitation", ColumnType::Real),
        Column::new("Weather_Condition_ID", ColumnType::Integer),
        Column::new("Day_Period_ID", ColumnType::Integer),
    ],
    primary_key: Some("id"),
    foreign_keys: &[
        ForeignKey::new("Weather_Condition_ID", "WEATHER_CONDITIONS"),
        ForeignKey::new("Day_Period_ID", "DAY_PERIODS"),
    ],
};

/// `Airport_Code` is not a declared foreign key: AIRPORTS has no unique key,
/// the same code can appear under several timezones.
pub static LOCATIONS: TableSchema = TableSchema {
    name: "location",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("Street", ColumnType::Text),
        Column::new("City", ColumnType::Text),
        Column::new("County", ColumnType::Text),
        Column::new("State", ColumnType::Text),
        Column::new("Zipcode", ColumnType::Text),
        Column::new("Country", ColumnType::Text),
        Column::new("Airport_Code", ColumnType::Text),
    ],
    primary_key: Some("id"),
    foreign_keys: &[],
};

pub static ACCIDENTS: TableSchema = TableSchema {
    name: "ACCIDENTS",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("Severity", ColumnType::Integer),
        Column::new("Start_Time", ColumnType::Timestamp),
        Column::new("End_Time", ColumnType::Timestamp),
        Column::new("Distance", ColumnType::Real),
        Column::new("Description", ColumnType::Text),
        Column::new("Year", ColumnType::Year),
        Column::new("Weather_ID", ColumnType::Integer),
        Column::new("Location_ID", ColumnType::Integer),
        Column::new("Feature_ID", ColumnType::Integer),
    ],
    primary_key: Some("id"),
    foreign_keys: &[
        ForeignKey::new("Weather_ID", "WEATHER"),
        ForeignKey::new("Location_ID", "location"),
        ForeignKey::new("Feature_ID", "ROAD_FEATURES"),
    ],
};

/// All tables in dependency order (parents before children)
pub static ALL_TABLES: &[&TableSchema] = &[
    &WEATHER_CONDITIONS,
    &WEATHER_CONDITIONS_EVENTS,
    &DAY_PERIODS,
    &PERIOD_EVENTS,
    &WEATHER,
    &AIRPORTS,
    &LOCATIONS,
    &ROAD_FEATURES,
    &ACCIDENTS,
];

/// One line per table in load order: its name, then the tables it references
pub fn table_listing() -> Vec<String> {
    ALL_TABLES
        .iter()
        .map(|table| {
            let mut parents: Vec<&str> = table.dependencies().into_iter().collect();
            parents.sort_unstable();
            if parents.is_empty() {
                table.name.to_string()
            } else {
                format!("{} (references {})", table.name, parents.join(", "))
            }
        })
        .collect()
}
