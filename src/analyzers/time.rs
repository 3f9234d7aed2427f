use chrono::Month;
use tracing::debug;

use crate::analyzers::types::TimeStats;
use crate::analyzers::utility::mode;
use crate::filters::weekday_name;
use crate::trip::TripTable;

/// Most common month, day of week, and start hour. `None` for an empty table.
#[tracing::instrument(skip_all, fields(trips = table.len()))]
pub fn time_stats(table: &TripTable) -> Option<TimeStats> {
    let month = mode(table.iter().map(|t| t.month))?;
    let day = mode(table.iter().map(|t| t.weekday))?;
    let hour = mode(table.iter().map(|t| t.hour))?;

    debug!(month, day = %day, hour, "Time statistics computed");

    Some(TimeStats {
        month: month_name(month),
        day_of_week: weekday_name(day).to_string(),
        start_hour: hour,
    })
}

fn month_name(number: u32) -> String {
    u8::try_from(number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| number.to_string())
}
