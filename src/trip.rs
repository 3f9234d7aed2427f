//! Trip records and the in-memory table the analyzers work on.

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike, Weekday};
use serde::Deserialize;

use crate::filters::{City, Filters};

/// A single row deserialized from a city CSV file, before timestamps are parsed.
///
/// Columns not listed here (such as the unnamed index column) are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTrip {
    #[serde(rename = "Start Time")]
    pub(crate) start_time: String,
    #[serde(rename = "End Time")]
    pub(crate) end_time: String,
    #[serde(rename = "Start Station")]
    pub(crate) start_station: String,
    #[serde(rename = "End Station")]
    pub(crate) end_station: String,
    #[serde(rename = "User Type")]
    pub(crate) user_type: Option<String>,
    #[serde(rename = "Gender", default)]
    pub(crate) gender: Option<String>,
    #[serde(rename = "Birth Year", default)]
    pub(crate) birth_year: Option<String>,
}

/// One bicycle-share trip with its derived calendar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub start_station: String,
    pub end_station: String,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,

    // derived from `start`
    pub month: u32,
    pub weekday: Weekday,
    pub hour: u32,
}

impl Trip {
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        start_station: impl Into<String>,
        end_station: impl Into<String>,
        user_type: Option<String>,
    ) -> Self {
        Trip {
            start,
            end,
            start_station: start_station.into(),
            end_station: end_station.into(),
            user_type,
            gender: None,
            birth_year: None,
            month: start.month(),
            weekday: start.weekday(),
            hour: start.hour(),
        }
    }

    /// Set the rider's gender.
    pub fn with_gender(mut self, gender: Option<String>) -> Self {
        self.gender = gender;
        self
    }

    /// Set the rider's birth year.
    pub fn with_birth_year(mut self, birth_year: Option<i32>) -> Self {
        self.birth_year = birth_year;
        self
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Which optional columns were present in the source header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OptionalColumns {
    pub gender: bool,
    pub birth_year: bool,
}

/// An ordered set of trips for one city.
#[derive(Debug, Clone)]
pub struct TripTable {
    city: City,
    trips: Vec<Trip>,
    columns: OptionalColumns,
    rejected: usize,
}

impl TripTable {
    pub fn new(city: City, trips: Vec<Trip>, columns: OptionalColumns) -> Self {
        TripTable {
            city,
            trips,
            columns,
            rejected: 0,
        }
    }

    /// Record how many source rows were dropped while loading.
    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected = rejected;
        self
    }

    pub fn city(&self) -> City {
        self.city
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trip> {
        self.trips.iter()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn has_gender(&self) -> bool {
        self.columns.gender
    }

    pub fn has_birth_year(&self) -> bool {
        self.columns.birth_year
    }

    /// Number of source rows rejected because they ended before they started.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Narrow the table to the trips matching the month and day of `filters`.
    pub fn apply_filters(mut self, filters: &Filters) -> Self {
        self.trips
            .retain(|t| filters.month.matches(t.month) && filters.day.matches(t.weekday));
        self
    }
}

impl<'a> IntoIterator for &'a TripTable {
    type Item = &'a Trip;
    type IntoIter = std::slice::Iter<'a, Trip>;

    fn into_iter(self) -> Self::IntoIter {
        self.trips.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DayFilter, MonthFilter};
    use chrono::Month;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn trip(start: &str, end: &str) -> Trip {
        Trip::new(ts(start), ts(end), "A", "B", Some("Subscriber".into()))
    }

    #[test]
    fn test_derived_fields() {
        // 2017-01-02 was a Monday
        let t = trip("2017-01-02 09:07:57", "2017-01-02 09:20:53");
        assert_eq!(t.month, 1);
        assert_eq!(t.weekday, Weekday::Mon);
        assert_eq!(t.hour, 9);
        assert_eq!(t.duration(), TimeDelta::seconds(12 * 60 + 56));
    }

    #[test]
    fn test_apply_filters_narrows_table() {
        let table = TripTable::new(
            City::Chicago,
            vec![
                trip("2017-01-02 09:00:00", "2017-01-02 09:10:00"), // Jan, Mon
                trip("2017-01-03 09:00:00", "2017-01-03 09:10:00"), // Jan, Tue
                trip("2017-02-06 09:00:00", "2017-02-06 09:10:00"), // Feb, Mon
            ],
            OptionalColumns::default(),
        );

        let jan = table.clone().apply_filters(&Filters::new(
            City::Chicago,
            MonthFilter::Only(Month::January),
            DayFilter::All,
        ));
        assert_eq!(jan.len(), 2);
        assert!(jan.iter().all(|t| t.month == 1));

        let mondays = table.clone().apply_filters(&Filters::new(
            City::Chicago,
            MonthFilter::All,
            DayFilter::Only(Weekday::Mon),
        ));
        assert_eq!(mondays.len(), 2);
        assert!(mondays.iter().all(|t| t.weekday == Weekday::Mon));

        let all = table.apply_filters(&Filters::unfiltered(City::Chicago));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_builders() {
        let t = trip("2017-06-01 00:00:00", "2017-06-01 00:01:00")
            .with_gender(Some("Female".into()))
            .with_birth_year(Some(1990));
        assert_eq!(t.gender.as_deref(), Some("Female"));
        assert_eq!(t.birth_year, Some(1990));

        let table = TripTable::new(City::Washington, vec![t], OptionalColumns::default())
            .with_rejected(2);
        assert_eq!(table.rejected(), 2);
        assert!(!table.has_gender());
        assert!(!table.has_birth_year());
    }
}
