use anyhow::Result;
use tracing::info;

use super::{convert_or_null, count_present, sequential_ids, Link, Pipeline, Step, StepReport};
use crate::parser::{read_source, SourceLayout, SqlValue};
use crate::schema::WEATHER;

/// The two trailing id columns are placeholders, replaced by the links
pub const LAYOUT: SourceLayout = SourceLayout::named(
    2,
    &[
        "Weather_Timestamp",
        "Temperature",
        "Humidity",
        "Pressure",
        "Visibility",
        "Wind_Direction",
        "Wind_Speed",
        "Precipitation",
        "Weather_Condition_ID",
        "Day_Period_ID",
    ],
);

/// Columns copied from the extract, typed by the WEATHER schema
const MEASUREMENTS: &[&str] = &[
    "Weather_Timestamp",
    "Temperature",
    "Humidity",
    "Pressure",
    "Visibility",
    "Wind_Direction",
    "Wind_Speed",
    "Precipitation",
];

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.weather.filtered), &LAYOUT)?;
    let n = source.len();

    let conditions = pipeline.link(Link::WeatherConditionIds, n, "WEATHER.Weather_Condition_ID")?;
    let periods = pipeline.link(Link::DayPeriodIds, n, "WEATHER.Day_Period_ID")?;

    let mut rows = Vec::with_capacity(n);
    for row in 0..n {
        let mut values = Vec::with_capacity(WEATHER.columns.len());
        values.push(SqlValue::Integer(row as i64 + 1));

        for column in MEASUREMENTS {
            let col_type = WEATHER
                .column(column)
                .map(|c| c.col_type)
                .unwrap_or(crate::schema::ColumnType::Text);
            let value = convert_or_null(&source, row, column, col_type);

            // No reading means no precipitation
            let value = if *column == "Precipitation" && value.is_null() {
                SqlValue::Real(0.0)
            } else {
                value
            };
            values.push(value);
        }

        values.push(conditions[row].clone());
        values.push(periods[row].clone());
        rows.push(values);
    }

    let mut report = StepReport::new(Step::Weather);
    pipeline.write_table(&mut report, &WEATHER, &config.paths.weather_sql, &rows)?;

    info!(
        "weather: {} rows, {} with a condition, {} with a day period",
        n,
        count_present(&conditions),
        count_present(&periods)
    );

    pipeline.provide(Link::WeatherIds, sequential_ids(n));
    Ok(report)
}
