//! Report types produced by the analyzers.

use chrono::TimeDelta;
use serde::{Serialize, Serializer};

use crate::output::format_duration;

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub month: String,
    pub day_of_week: String,
    pub start_hour: u32,
}

/// A start/end station combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StationPair {
    pub start: String,
    pub end: String,
}

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub start_station: String,
    pub end_station: String,
    pub trip: StationPair,
    pub trip_count: usize,
}

/// Total and average trip duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub total: TimeDelta,
    #[serde(serialize_with = "serialize_duration")]
    pub mean: TimeDelta,
}

/// Frequency of one categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

impl From<(String, usize)> for ValueCount {
    fn from((value, count): (String, usize)) -> Self {
        ValueCount { value, count }
    }
}

/// Earliest, most recent, and most common year of birth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

/// A statistic over an optional field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    NotAvailable,
}

/// Rider demographics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: Vec<ValueCount>,
    pub gender: Availability<Vec<ValueCount>>,
    pub birth_year: Availability<BirthYearStats>,
}

/// All four statistic groups for one filtered table, served by `report --json`.
///
/// The optional groups are `None` when no trips matched the filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityReport {
    pub city: String,
    pub month: String,
    pub day: String,
    pub trips: usize,
    pub rejected_rows: usize,
    pub time: Option<TimeStats>,
    pub stations: Option<StationStats>,
    pub durations: Option<DurationStats>,
    pub users: UserStats,
}

fn serialize_duration<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*value))
}
