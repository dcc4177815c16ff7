use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::geometry::Coordinate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed-width UTC timestamps so lexical order in SQLite matches time order.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).with_context(|| format!("failed to parse {field}"))
}

/// Rows store latitude and longitude as two nullable columns; a coordinate
/// exists only when both are present.
pub fn coordinate_from_columns(
    latitude: Option<f64>,
    longitude: Option<f64>,
    field: &str,
) -> Result<Option<Coordinate>> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => {
            let coordinate = Coordinate::new(lat, lng);
            if !coordinate.is_valid() {
                return Err(anyhow!("{field} holds out-of-range coordinate ({lat}, {lng})"));
            }
            Ok(Some(coordinate))
        }
        _ => Ok(None),
    }
}
