use anyhow::Result;
use tracing::{info, warn};

use super::{convert_or_null, count_present, Link, Pipeline, Step, StepReport};
use crate::parser::{miles_to_meters, read_source, SourceLayout, SqlValue};
use crate::schema::{ColumnType, ACCIDENTS};

pub const LAYOUT: SourceLayout = SourceLayout::header();

const DISTANCE_MILES: &str = "Distance(mi)";

const REQUIRED: &[&str] = &[
    "Severity",
    "Start_Time",
    "End_Time",
    DISTANCE_MILES,
    "Description",
    "Year",
];

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.accidents.filtered), &LAYOUT)?;
    source.require_columns(REQUIRED)?;
    let n = source.len();

    let weather_ids = pipeline.link(Link::WeatherIds, n, "ACCIDENTS.Weather_ID")?;
    let location_ids = pipeline.link(Link::LocationIds, n, "ACCIDENTS.Location_ID")?;
    let feature_ids = pipeline.link(Link::RoadFeatureIds, n, "ACCIDENTS.Feature_ID")?;

    let mut rows = Vec::with_capacity(n);
    for row in 0..n {
        let distance = match convert_or_null(&source, row, DISTANCE_MILES, ColumnType::Real) {
            SqlValue::Real(miles) => SqlValue::Real(miles_to_meters(miles)),
            _ => SqlValue::Null,
        };

        rows.push(vec![
            SqlValue::Integer(row as i64 + 1),
            convert_or_null(&source, row, "Severity", ColumnType::Integer),
            convert_or_null(&source, row, "Start_Time", ColumnType::Timestamp),
            convert_or_null(&source, row, "End_Time", ColumnType::Timestamp),
            distance,
            convert_or_null(&source, row, "Description", ColumnType::Text),
            convert_or_null(&source, row, "Year", ColumnType::Year),
            weather_ids[row].clone(),
            location_ids[row].clone(),
            feature_ids[row].clone(),
        ]);
    }

    let mut report = StepReport::new(Step::Accidents);
    pipeline.write_table(&mut report, &ACCIDENTS, &config.paths.accidents_sql, &rows)?;

    let weather = count_present(&weather_ids);
    let locations = count_present(&location_ids);
    let features = count_present(&feature_ids);
    info!(
        "accidents: {} rows; related ids present: weather {}, locations {}, road features {}",
        n, weather, locations, features
    );
    if n > 0 && (weather < n || locations < n || features < n) {
        warn!("accidents: some related ids are NULL, check the sibling outputs");
    }

    Ok(report)
}
