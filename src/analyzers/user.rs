use tracing::debug;

use crate::analyzers::types::{Availability, BirthYearStats, UserStats, ValueCount};
use crate::analyzers::utility::{mode, value_counts};
use crate::error::{BikeshareError, Result};
use crate::loader::{BIRTH_YEAR, GENDER};
use crate::trip::TripTable;

/// Rider counts by user type, gender, and birth year.
///
/// Gender and birth year are reported as not available when the source has no
/// such column. Any other failure is returned to the caller.
#[tracing::instrument(skip_all, fields(trips = table.len()))]
pub fn user_stats(table: &TripTable) -> Result<UserStats> {
    let user_types = user_type_counts(table);

    let gender = match available(gender_counts(table))? {
        Availability::Available(counts) if counts.is_empty() => Availability::NotAvailable,
        other => other,
    };

    let birth_year = match available(birth_year_stats(table))? {
        Availability::Available(Some(stats)) => Availability::Available(stats),
        _ => Availability::NotAvailable,
    };

    Ok(UserStats {
        user_types,
        gender,
        birth_year,
    })
}

pub fn user_type_counts(table: &TripTable) -> Vec<ValueCount> {
    counts(table.iter().filter_map(|t| t.user_type.as_deref()))
}

/// Gender frequencies, or [`BikeshareError::MissingField`] without a Gender column.
pub fn gender_counts(table: &TripTable) -> Result<Vec<ValueCount>> {
    if !table.has_gender() {
        return Err(BikeshareError::MissingField(GENDER));
    }
    Ok(counts(table.iter().filter_map(|t| t.gender.as_deref())))
}

/// Birth year range and mode, or [`BikeshareError::MissingField`] without a
/// Birth Year column. `Ok(None)` when no trip in scope carries a birth year.
pub fn birth_year_stats(table: &TripTable) -> Result<Option<BirthYearStats>> {
    if !table.has_birth_year() {
        return Err(BikeshareError::MissingField(BIRTH_YEAR));
    }

    let years = || table.iter().filter_map(|t| t.birth_year);
    let (Some(earliest), Some(most_recent), Some(most_common)) =
        (years().min(), years().max(), mode(years()))
    else {
        return Ok(None);
    };

    Ok(Some(BirthYearStats {
        earliest,
        most_recent,
        most_common,
    }))
}

fn available<T>(result: Result<T>) -> Result<Availability<T>> {
    match result {
        Ok(value) => Ok(Availability::Available(value)),
        Err(BikeshareError::MissingField(field)) => {
            debug!(field, "Optional field not in data set");
            Ok(Availability::NotAvailable)
        }
        Err(e) => Err(e),
    }
}

fn counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    value_counts(values)
        .into_iter()
        .map(|(value, count)| ValueCount::from((value.to_string(), count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::City;
    use crate::trip::{OptionalColumns, Trip};
    use chrono::NaiveDate;

    fn trip(user_type: &str, gender: Option<&str>, birth_year: Option<i32>) -> Trip {
        let start = NaiveDate::from_ymd_opt(2017, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Trip::new(start, start, "A", "B", Some(user_type.to_string()))
            .with_gender(gender.map(str::to_string))
            .with_birth_year(birth_year)
    }

    fn vc(value: &str, count: usize) -> ValueCount {
        ValueCount {
            value: value.to_string(),
            count,
        }
    }

    #[test]
    fn test_user_stats_without_gender_column() {
        let table = TripTable::new(
            City::Washington,
            vec![
                trip("Subscriber", None, None),
                trip("Customer", None, None),
                trip("Subscriber", None, None),
            ],
            OptionalColumns::default(),
        );

        let stats = user_stats(&table).unwrap();
        assert_eq!(stats.user_types, vec![vc("Subscriber", 2), vc("Customer", 1)]);
        assert_eq!(stats.gender, Availability::NotAvailable);
        assert_eq!(stats.birth_year, Availability::NotAvailable);
    }

    #[test]
    fn test_user_stats_with_all_columns() {
        let table = TripTable::new(
            City::Chicago,
            vec![
                trip("Subscriber", Some("Male"), Some(1989)),
                trip("Subscriber", Some("Female"), Some(1992)),
                trip("Customer", None, None),
                trip("Subscriber", Some("Male"), Some(1992)),
                trip("Subscriber", Some("Female"), Some(1950)),
            ],
            OptionalColumns {
                gender: true,
                birth_year: true,
            },
        );

        let stats = user_stats(&table).unwrap();
        assert_eq!(stats.user_types, vec![vc("Subscriber", 4), vc("Customer", 1)]);
        assert_eq!(
            stats.gender,
            Availability::Available(vec![vc("Male", 2), vc("Female", 2)])
        );
        assert_eq!(
            stats.birth_year,
            Availability::Available(BirthYearStats {
                earliest: 1950,
                most_recent: 1992,
                most_common: 1992,
            })
        );
    }

    #[test]
    fn test_missing_columns_are_missing_field_errors() {
        let table = TripTable::new(City::Washington, vec![], OptionalColumns::default());
        assert!(matches!(
            gender_counts(&table),
            Err(BikeshareError::MissingField("Gender"))
        ));
        assert!(matches!(
            birth_year_stats(&table),
            Err(BikeshareError::MissingField("Birth Year"))
        ));
    }

    #[test]
    fn test_present_column_without_values() {
        let table = TripTable::new(
            City::NewYorkCity,
            vec![trip("Customer", None, None)],
            OptionalColumns {
                gender: true,
                birth_year: true,
            },
        );
        assert_eq!(birth_year_stats(&table).unwrap(), None);

        let stats = user_stats(&table).unwrap();
        assert_eq!(stats.gender, Availability::NotAvailable);
        assert_eq!(stats.birth_year, Availability::NotAvailable);
    }

    #[test]
    fn test_other_errors_propagate() {
        let result: Result<Vec<ValueCount>> = Err(BikeshareError::Config("boom".into()));
        assert!(matches!(
            available(result),
            Err(BikeshareError::Config(_))
        ));
    }
}
