//! CSV loading for city trip data.
//!
//! Reads every row of a city file, parses its timestamps, derives the calendar
//! fields, and narrows the result to the requested month and day.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::config::DataConfig;
use crate::error::{BikeshareError, Result};
use crate::filters::{City, Filters};
use crate::trip::{OptionalColumns, RawTrip, Trip, TripTable};

pub const START_TIME: &str = "Start Time";
pub const END_TIME: &str = "End Time";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const REQUIRED_COLUMNS: [&str; 5] = [
    START_TIME,
    END_TIME,
    "Start Station",
    "End Station",
    "User Type",
];

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Loads the trips for `filters.city` and keeps those matching the month and day filters.
///
/// # Errors
///
/// Returns a data format error if the file is missing or unreadable, lacks a
/// required column, or holds an unparsable timestamp or birth year.
#[tracing::instrument(
    skip(config),
    fields(city = %filters.city, month = %filters.month, day = %filters.day)
)]
pub fn load(config: &DataConfig, filters: &Filters) -> Result<TripTable> {
    let path = config.path_for(filters.city);
    let file = File::open(&path).map_err(|source| BikeshareError::DataFile {
        path: path.clone(),
        source,
    })?;

    let table = read_trips(file, &path, filters.city)?;
    let total = table.len();
    let table = table.apply_filters(filters);

    debug!(
        path = %path.display(),
        total,
        kept = table.len(),
        rejected = table.rejected(),
        "Trip table loaded"
    );
    Ok(table)
}

/// Parses CSV trip rows from `reader`. `path` is only used in error messages.
pub fn read_trips<R: Read>(reader: R, path: &Path, city: City) -> Result<TripTable> {
    let csv_error = |source| BikeshareError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = rdr.headers().map_err(csv_error)?.clone();
    let has_column = |name: &str| headers.iter().any(|h| h == name);

    if let Some(column) = REQUIRED_COLUMNS.into_iter().find(|c| !has_column(c)) {
        return Err(BikeshareError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    let columns = OptionalColumns {
        gender: has_column(GENDER),
        birth_year: has_column(BIRTH_YEAR),
    };

    let mut trips = Vec::new();
    let mut rejected = 0;

    for (index, result) in rdr.deserialize::<RawTrip>().enumerate() {
        let row = index as u64 + 1;
        let raw = result.map_err(csv_error)?;

        let start = parse_cell(&raw.start_time, path, row, START_TIME)?;
        let end = parse_cell(&raw.end_time, path, row, END_TIME)?;

        if end < start {
            debug!(row, start = %start, end = %end, "Trip ends before it starts, skipping");
            rejected += 1;
            continue;
        }

        let birth_year = match non_empty(raw.birth_year) {
            Some(value) => Some(parse_birth_year(&value).ok_or_else(|| {
                BikeshareError::BirthYear {
                    path: path.to_path_buf(),
                    row,
                    value,
                }
            })?),
            None => None,
        };

        trips.push(
            Trip::new(
                start,
                end,
                raw.start_station,
                raw.end_station,
                non_empty(raw.user_type),
            )
            .with_gender(non_empty(raw.gender))
            .with_birth_year(birth_year),
        );
    }

    if rejected > 0 {
        warn!(rejected, path = %path.display(), "Rejected malformed trips");
    }

    Ok(TripTable::new(city, trips, columns).with_rejected(rejected))
}

/// Parses a timestamp in any of the accepted layouts.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parses a birth year written either as an integer or as a whole float (`1992.0`).
pub fn parse_birth_year(s: &str) -> Option<i32> {
    let value: f64 = s.trim().parse().ok()?;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    Some(value as i32)
}

fn parse_cell(value: &str, path: &Path, row: u64, column: &'static str) -> Result<NaiveDateTime> {
    parse_timestamp(value).ok_or_else(|| BikeshareError::Timestamp {
        path: path.to_path_buf(),
        row,
        column,
        value: value.to_string(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
