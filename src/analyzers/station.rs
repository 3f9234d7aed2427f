use tracing::debug;

use crate::analyzers::types::{StationPair, StationStats};
use crate::analyzers::utility::{mode, value_counts};
use crate::trip::TripTable;

/// Most common start station, end station, and start/end combination.
/// `None` for an empty table.
#[tracing::instrument(skip_all, fields(trips = table.len()))]
pub fn station_stats(table: &TripTable) -> Option<StationStats> {
    let start_station = mode(table.iter().map(|t| t.start_station.as_str()))?;
    let end_station = mode(table.iter().map(|t| t.end_station.as_str()))?;
    let (trip, trip_count) = most_frequent_pair(table)?;

    debug!(start_station, end_station, trip_count, "Station statistics computed");

    Some(StationStats {
        start_station: start_station.to_string(),
        end_station: end_station.to_string(),
        trip,
        trip_count,
    })
}

/// Groups trips by (start, end) station and returns the largest group with its size.
pub fn most_frequent_pair(table: &TripTable) -> Option<(StationPair, usize)> {
    let pairs = table
        .iter()
        .map(|t| (t.start_station.as_str(), t.end_station.as_str()));

    value_counts(pairs)
        .into_iter()
        .next()
        .map(|((start, end), count)| {
            (
                StationPair {
                    start: start.to_string(),
                    end: end.to_string(),
                },
                count,
            )
        })
}
