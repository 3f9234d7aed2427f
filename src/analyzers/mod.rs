//! Descriptive statistics over a filtered trip table.
//!
//! Each group (time of travel, stations, trip duration, users) is computed by
//! its own read-only function so callers can time and print them separately.

pub mod duration;
pub mod station;
pub mod time;
pub mod types;
pub mod user;
pub mod utility;

use crate::error::Result;
use crate::filters::Filters;
use crate::trip::TripTable;
use types::CityReport;

/// Computes every statistic group for `table`.
pub fn analyze(table: &TripTable, filters: &Filters) -> Result<CityReport> {
    Ok(CityReport {
        city: filters.city.to_string(),
        month: filters.month.to_string(),
        day: filters.day.to_string(),
        trips: table.len(),
        rejected_rows: table.rejected(),
        time: time::time_stats(table),
        stations: station::station_stats(table),
        durations: duration::duration_stats(table),
        users: user::user_stats(table)?,
    })
}
