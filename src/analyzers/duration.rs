use chrono::TimeDelta;
use tracing::debug;

use crate::analyzers::types::DurationStats;
use crate::trip::TripTable;

/// Total and mean trip duration. `None` for an empty table.
#[tracing::instrument(skip_all, fields(trips = table.len()))]
pub fn duration_stats(table: &TripTable) -> Option<DurationStats> {
    if table.is_empty() {
        return None;
    }

    let total = table
        .iter()
        .fold(TimeDelta::zero(), |acc, t| acc + t.duration());
    let mean = TimeDelta::milliseconds(total.num_milliseconds() / table.len() as i64);

    debug!(total_secs = total.num_seconds(), mean_secs = mean.num_seconds(), "Duration statistics computed");

    Some(DurationStats {
        trips: table.len(),
        total,
        mean,
    })
}
