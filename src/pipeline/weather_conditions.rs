use anyhow::Result;
use tracing::info;

use super::{convert_or_null, Dimension, Link, Pipeline, Step, StepReport};
use crate::parser::{read_source, SourceLayout, SqlValue};
use crate::schema::{ColumnType, WEATHER_CONDITIONS, WEATHER_CONDITIONS_EVENTS};
use crate::writer::{render_event_statements, write_sql};

pub const LAYOUT: SourceLayout = SourceLayout::named(2, &["Description"]);

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.weather_conditions.filtered), &LAYOUT)?;

    let mut conditions = Dimension::new();
    let mut event_targets = Vec::with_capacity(source.len());

    for row in 0..source.len() {
        let description = convert_or_null(&source, row, "Description", ColumnType::Text);
        event_targets.push(SqlValue::Integer(conditions.intern(vec![description])));
    }

    let mut report = StepReport::new(Step::WeatherConditions);
    pipeline.write_table(
        &mut report,
        &WEATHER_CONDITIONS,
        &config.paths.weather_conditions_sql,
        &conditions.rows_with_ids(),
    )?;

    let events_path = config.resolve(&config.paths.weather_conditions_events);
    write_sql(
        &events_path,
        &render_event_statements(&WEATHER_CONDITIONS_EVENTS, &event_targets),
    )?;
    report.push(WEATHER_CONDITIONS_EVENTS.name, event_targets.len(), events_path);

    info!(
        "{} weather rows map onto {} distinct conditions",
        source.len(),
        conditions.len()
    );

    pipeline.provide(Link::WeatherConditionIds, event_targets);
    Ok(report)
}
