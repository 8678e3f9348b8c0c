use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::schema::ColumnType;

/// Miles to meters, as used for accident distances
pub const METERS_PER_MILE: f64 = 1609.34;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static UTC_OFFSET_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]\d{2}:\d{2}$").expect("valid offset regex"));

static ZIP_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d+$").expect("valid zip regex"));

/// A value ready to be rendered into an INSERT tuple
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn text(s: impl Into<String>) -> Self {
        SqlValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Render as a SQL literal: bare numbers, quoted and escaped text
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => format!("'{}'", escape_text(s)),
        }
    }
}

/// Why a raw field could not be converted to its declared type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("not an integer: {0:?}")]
    NotAnInteger(String),

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("not a year: {0:?}")]
    NotAYear(String),

    #[error("bad timestamp: {0:?}")]
    BadTimestamp(String),
}

/// Escape single quotes for a SQL string literal
pub fn escape_text(s: &str) -> String {
    s.replace('\'', "''")
}

/// Convert a normalized raw field into a value of the declared type.
///
/// `None` is the NULL sentinel produced by the CSV reader. Booleans never
/// fail: anything that is not a recognised "true" token becomes 0.
pub fn convert(raw: Option<&str>, col_type: ColumnType) -> Result<SqlValue, ValueError> {
    if col_type == ColumnType::Boolean {
        return Ok(SqlValue::Integer(parse_flag(raw) as i64));
    }

    let Some(raw) = raw else {
        return Ok(SqlValue::Null);
    };

    match col_type {
        ColumnType::Integer => parse_integer(raw)
            .map(SqlValue::Integer)
            .ok_or_else(|| ValueError::NotAnInteger(raw.to_string())),
        ColumnType::Real => parse_real(raw)
            .map(SqlValue::Real)
            .ok_or_else(|| ValueError::NotANumber(raw.to_string())),
        ColumnType::Text => Ok(SqlValue::text(raw)),
        ColumnType::Timestamp => format_timestamp(raw).map(SqlValue::Text),
        ColumnType::Year => {
            if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
                raw.parse()
                    .map(SqlValue::Integer)
                    .map_err(|_| ValueError::NotAYear(raw.to_string()))
            } else {
                Err(ValueError::NotAYear(raw.to_string()))
            }
        }
        ColumnType::Boolean => unreachable!(),
    }
}

/// TRUE/T/1/YES/Y (any case) → true, anything else → false
pub fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_uppercase()).as_deref(),
        Some("TRUE" | "T" | "1" | "YES" | "Y")
    )
}

/// Integers, also accepting integral floats such as `3.0`
fn parse_integer(raw: &str) -> Option<i64> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(i);
    }
    let f = parse_real(raw)?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_real(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Strip a trailing UTC offset and re-emit as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(raw: &str) -> Result<String, ValueError> {
    let stripped = UTC_OFFSET_SUFFIX.replace(raw.trim(), "");
    let stripped = stripped.trim();

    NaiveDateTime::parse_from_str(stripped, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(stripped, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .map_err(|_| ValueError::BadTimestamp(raw.to_string()))
}

/// Miles to meters, rounded to 2 decimals
pub fn miles_to_meters(miles: f64) -> f64 {
    (miles * METERS_PER_MILE * 100.0).round() / 100.0
}

/// `12345-6789` → `12345`
pub fn strip_zip_extension(zip: &str) -> String {
    ZIP_EXTENSION.replace(zip, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_literal_escapes_quotes() {
        assert_eq!(SqlValue::text("O'Hare").to_sql_literal(), "'O''Hare'");
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
        assert_eq!(SqlValue::Integer(42).to_sql_literal(), "42");
        assert_eq!(SqlValue::Real(30.5).to_sql_literal(), "30.5");
    }

    #[test]
    fn test_timestamp_strips_offset() {
        assert_eq!(
            format_timestamp("2019-01-01 00:00:00-05:00").unwrap(),
            "2019-01-01 00:00:00"
        );
        assert_eq!(
            format_timestamp("2016-02-08 05:46:00+01:00").unwrap(),
            "2016-02-08 05:46:00"
        );
        assert_eq!(
            format_timestamp("2016-02-08 05:46:00.000000000").unwrap(),
            "2016-02-08 05:46:00"
        );
        assert!(format_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_timestamp_column_is_quoted() {
        let value = convert(Some("2019-01-01 00:00:00-05:00"), ColumnType::Timestamp).unwrap();
        assert_eq!(value.to_sql_literal(), "'2019-01-01 00:00:00'");
    }

    #[test]
    fn test_miles_to_meters() {
        assert_eq!(miles_to_meters(1.0), 1609.34);
        assert_eq!(miles_to_meters(0.01), 16.09);
        assert_eq!(miles_to_meters(0.0), 0.0);
        assert_eq!(SqlValue::Real(miles_to_meters(1.0)).to_sql_literal(), "1609.34");
    }

    #[test]
    fn test_flags() {
        for token in ["TRUE", "true", "T", "1", "YES", "y"] {
            assert!(parse_flag(Some(token)), "{} should be true", token);
        }
        for token in ["FALSE", "F", "0", "no", "maybe"] {
            assert!(!parse_flag(Some(token)), "{} should be false", token);
        }
        assert!(!parse_flag(None));
        assert_eq!(
            convert(Some("garbage"), ColumnType::Boolean).unwrap(),
            SqlValue::Integer(0)
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(convert(Some("3"), ColumnType::Integer).unwrap(), SqlValue::Integer(3));
        assert_eq!(convert(Some("3.0"), ColumnType::Integer).unwrap(), SqlValue::Integer(3));
        assert!(convert(Some("3.5"), ColumnType::Integer).is_err());
        assert_eq!(convert(Some("29.92"), ColumnType::Real).unwrap(), SqlValue::Real(29.92));
        assert!(convert(Some("inf"), ColumnType::Real).is_err());
        assert!(convert(Some("calm"), ColumnType::Real).is_err());
        assert_eq!(convert(None, ColumnType::Real).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_error_messages() {
        let err = convert(Some("calm"), ColumnType::Real).unwrap_err();
        assert_eq!(err, ValueError::NotANumber("calm".to_string()));
        assert_eq!(err.to_string(), "not a number: \"calm\"");

        let err: anyhow::Error = convert(Some("x"), ColumnType::Year).unwrap_err().into();
        assert_eq!(err.to_string(), "not a year: \"x\"");
    }

    #[test]
    fn test_year() {
        assert_eq!(convert(Some("2019"), ColumnType::Year).unwrap(), SqlValue::Integer(2019));
        assert!(convert(Some("2019.0"), ColumnType::Year).is_err());
        assert!(convert(Some("-1"), ColumnType::Year).is_err());
    }

    #[test]
    fn test_strip_zip_extension() {
        assert_eq!(strip_zip_extension("45424-6789"), "45424");
        assert_eq!(strip_zip_extension("45424"), "45424");
    }
}
