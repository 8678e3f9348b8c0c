use anyhow::Result;
use tracing::info;

use super::{convert_or_null, count_present, sequential_ids, Link, Pipeline, Step, StepReport};
use crate::parser::{read_source, strip_zip_extension, SourceLayout, SqlValue};
use crate::schema::{ColumnType, LOCATIONS};

pub const LAYOUT: SourceLayout = SourceLayout::named(
    2,
    &[
        "Original_ID",
        "Street",
        "City",
        "County",
        "State",
        "Zipcode",
        "Country",
        "Airport_Code",
    ],
);

const ADDRESS: &[&str] = &["Street", "City", "County", "State"];

pub fn run(pipeline: &mut Pipeline) -> Result<StepReport> {
    let config = pipeline.config();
    let source = read_source(&config.resolve(&config.paths.locations.filtered), &LAYOUT)?;
    let n = source.len();

    // The extract's own Airport_Code column is superseded by the airport events
    let airport_codes = pipeline.link(Link::AirportCodes, n, "location.Airport_Code")?;

    let mut rows = Vec::with_capacity(n);
    for row in 0..n {
        let mut values = Vec::with_capacity(LOCATIONS.columns.len());
        values.push(SqlValue::Integer(row as i64 + 1));
        for column in ADDRESS {
            values.push(convert_or_null(&source, row, column, ColumnType::Text));
        }
        values.push(
            source
                .get(row, "Zipcode")
                .map(|zip| SqlValue::Text(strip_zip_extension(zip)))
                .unwrap_or(SqlValue::Null),
        );
        values.push(convert_or_null(&source, row, "Country", ColumnType::Text));
        values.push(airport_codes[row].clone());
        rows.push(values);
    }

    let mut report = StepReport::new(Step::Locations);
    pipeline.write_table(&mut report, &LOCATIONS, &config.paths.locations_sql, &rows)?;

    info!(
        "locations: {} rows, {} airport codes attached",
        n,
        count_present(&airport_codes)
    );

    pipeline.provide(Link::LocationIds, sequential_ids(n));
    Ok(report)
}
