use anyhow::Result;
use tracing::info;

use super::{Dimension, Link, Pipeline, Step, StepReport};
use crate::parser::{parse_flag, read_source, SourceLayout, SqlValue};
use crate::schema::ROAD_FEATURES;
use crate::writer::write_event_csv;

const FLAGS: &[&str] = &[
    "Amenity",
    "Bump",
    "Crossing",
    "Give_Way",
    "Junction",
    "No_Exit",
    "Railway",
    "Roundabout",
    "Station",
    "Stop",
    "Traffic_Calming",
    "Traffic_Signal",
    "Turning_Loop",
];

pub const LAYOUT: SourceLayout = SourceLayout::named(
    2,
    &[
        "Feature_ID",
        "Amenity",
        "Bump",
        "Crossing",
        "Give_Way",
        "Junction",
        "No_Exit",
        "Railway",
        "Roundabout",
        "Station",
        "Stop",
        "Traffic_Calming",
        "Traffic_Signal",
        "Turning_Loop",
    ],
);

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.road_features.filtered), &LAYOUT)?;

    let mut combinations = Dimension::new();
    let mut feature_ids = Vec::with_capacity(source.len());

    for row in 0..source.len() {
        let flags = FLAGS
            .iter()
            .map(|flag| SqlValue::Integer(parse_flag(source.get(row, flag)) as i64))
            .collect();
        feature_ids.push(SqlValue::Integer(combinations.intern(flags)));
    }

    let mut report = StepReport::new(Step::RoadFeatures);
    pipeline.write_table(
        &mut report,
        &ROAD_FEATURES,
        &config.paths.road_features_sql,
        &combinations.rows_with_ids(),
    )?;

    let events_path = config.resolve(&config.paths.road_features_events);
    write_event_csv(
        &events_path,
        "Original_Position",
        "Road_Feature_ID",
        &feature_ids,
    )?;
    report.push("road feature events", feature_ids.len(), events_path);

    info!(
        "{} road feature rows, {} unique combinations",
        source.len(),
        combinations.len()
    );

    pipeline.provide(Link::RoadFeatureIds, feature_ids);
    Ok(report)
}
