use anyhow::Result;
use tracing::info;

use super::{Dimension, Link, Pipeline, Step, StepReport};
use crate::parser::{read_source, SourceLayout, SqlValue};
use crate::schema::AIRPORTS;
use crate::writer::write_event_csv;

pub const LAYOUT: SourceLayout = SourceLayout::header();

fn text(value: Option<&str>) -> SqlValue {
    value.map(SqlValue::text).unwrap_or(SqlValue::Null)
}

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.airports_filtered), &LAYOUT)?;
    source.require_columns(&["Airport_Code", "Timezone", "Airport_Name"])?;

    let mut airports = Dimension::new();
    let mut codes = Vec::with_capacity(source.len());

    for row in 0..source.len() {
        let code = text(source.get(row, "Airport_Code"));
        airports.intern(vec![
            code.clone(),
            text(source.get(row, "Airport_Name")),
            text(source.get(row, "Timezone")),
        ]);
        codes.push(code);
    }

    let mut report = StepReport::new(Step::Airports);
    pipeline.write_table(
        &mut report,
        &AIRPORTS,
        &config.paths.airports_sql,
        airports.rows(),
    )?;

    let events_path = config.resolve(&config.paths.airport_events);
    write_event_csv(&events_path, "Event_ID", "Airport_Code", &codes)?;
    report.push("airport events", codes.len(), events_path);

    info!("unique airports: {}, events: {}", airports.len(), codes.len());

    pipeline.provide(Link::AirportCodes, codes);
    Ok(report)
}
