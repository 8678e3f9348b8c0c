use anyhow::Result;
use tracing::info;

use super::{convert_or_null, Dimension, Link, Pipeline, Step, StepReport};
use crate::parser::{read_source, SourceLayout, SqlValue};
use crate::schema::{DAY_PERIODS, PERIOD_EVENTS};
use crate::writer::{render_event_statements, write_sql};

const PERIOD_COLUMNS: &[&str] = &[
    "Sunrise_Sunset",
    "Civil_Twilight",
    "Nautical_Twilight",
    "Astronomical_Twilight",
];

pub const LAYOUT: SourceLayout = SourceLayout::named(2, PERIOD_COLUMNS);

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.day_periods.filtered), &LAYOUT)?;

    let mut periods = Dimension::new();
    let mut event_targets = Vec::with_capacity(source.len());

    for row in 0..source.len() {
        let attributes = PERIOD_COLUMNS
            .iter()
            .map(|column| {
                let col_type = DAY_PERIODS
                    .column(column)
                    .map(|c| c.col_type)
                    .unwrap_or(crate::schema::ColumnType::Text);
                convert_or_null(&source, row, column, col_type)
            })
            .collect();
        event_targets.push(SqlValue::Integer(periods.intern(attributes)));
    }

    let mut report = StepReport::new(Step::DayPeriods);
    pipeline.write_table(
        &mut report,
        &DAY_PERIODS,
        &config.paths.day_periods_sql,
        &periods.rows_with_ids(),
    )?;

    let events_path = config.resolve(&config.paths.day_periods_events);
    write_sql(
        &events_path,
        &render_event_statements(&PERIOD_EVENTS, &event_targets),
    )?;
    report.push(PERIOD_EVENTS.name, event_targets.len(), events_path);

    info!(
        "{} day period rows map onto {} distinct combinations",
        source.len(),
        periods.len()
    );

    pipeline.provide(Link::DayPeriodIds, event_targets);
    Ok(report)
}
