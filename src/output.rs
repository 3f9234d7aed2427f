//! Console rendering of statistics and raw trip pages.
//!
//! Supports the sectioned text report printed by the interactive session and
//! pretty-printed JSON for `report --json`.

use std::io::Write;
use std::time::Instant;

use chrono::TimeDelta;
use tracing::{debug, info};

use crate::analyzers::types::{Availability, CityReport, ValueCount};
use crate::analyzers::{analyze, duration, station, time, user};
use crate::config::DataConfig;
use crate::error::Result;
use crate::filters::{Filters, weekday_name};
use crate::loader;
use crate::trip::{Trip, TripTable};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a duration as `D days HH:MM:SS`.
pub fn format_duration(value: TimeDelta) -> String {
    let sign = if value < TimeDelta::zero() { "-" } else { "" };
    let secs = value.num_seconds().unsigned_abs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{sign}{days} days {hours:02}:{minutes:02}:{seconds:02}")
}

fn separator() -> String {
    "-".repeat(40)
}

/// Writes all four statistic groups for `table`, each followed by its run time.
pub fn write_statistics<W: Write>(w: &mut W, table: &TripTable, filters: &Filters) -> Result<()> {
    writeln!(w, "\nAnalyzing {} trips for {}", table.len(), filters)?;
    if table.rejected() > 0 {
        writeln!(
            w,
            "Skipped {} malformed rows (trip ends before it starts).",
            table.rejected()
        )?;
    }
    writeln!(w, "{}", separator())?;

    if table.is_empty() {
        writeln!(w, "No trips match the selected filters.")?;
        writeln!(w, "{}", separator())?;
        return Ok(());
    }

    section(w, "Calculating The Most Frequent Times of Travel...", |w| {
        if let Some(stats) = time::time_stats(table) {
            writeln!(w, "The most common month is: {}", stats.month)?;
            writeln!(w, "The most common day of week is: {}", stats.day_of_week)?;
            writeln!(w, "The most common start hour is: {}", stats.start_hour)?;
        }
        Ok(())
    })?;

    section(w, "Calculating The Most Popular Stations and Trip...", |w| {
        if let Some(stats) = station::station_stats(table) {
            writeln!(w, "The most common start station is: {}", stats.start_station)?;
            writeln!(w, "The most common end station is: {}", stats.end_station)?;
            writeln!(
                w,
                "The most frequent combination is: {} -> {} ({} trips)",
                stats.trip.start, stats.trip.end, stats.trip_count
            )?;
        }
        Ok(())
    })?;

    section(w, "Calculating Trip Duration...", |w| {
        if let Some(stats) = duration::duration_stats(table) {
            writeln!(w, "Total travel time is: {}", format_duration(stats.total))?;
            writeln!(w, "Average travel time is: {}", format_duration(stats.mean))?;
        }
        Ok(())
    })?;

    section(w, "Calculating User Stats...", |w| {
        let stats = user::user_stats(table)?;

        writeln!(w, "Counts of user types:")?;
        write_counts(w, &stats.user_types)?;

        match &stats.gender {
            Availability::Available(counts) => {
                writeln!(w, "Counts of gender:")?;
                write_counts(w, counts)?;
            }
            Availability::NotAvailable => writeln!(w, "Gender data is not available.")?,
        }

        match &stats.birth_year {
            Availability::Available(years) => {
                writeln!(w, "The earliest year of birth is: {}", years.earliest)?;
                writeln!(w, "The most recent year of birth is: {}", years.most_recent)?;
                writeln!(w, "The most common year of birth is: {}", years.most_common)?;
            }
            Availability::NotAvailable => writeln!(w, "Birth year data is not available.")?,
        }
        Ok(())
    })
}

fn section<W, F>(w: &mut W, heading: &str, body: F) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut W) -> Result<()>,
{
    writeln!(w, "\n{heading}\n")?;
    let started = Instant::now();
    body(w)?;
    let elapsed = started.elapsed();
    info!(section = heading, elapsed_us = elapsed.as_micros() as u64, "Section computed");
    writeln!(w, "\nThis took {:.6} seconds.", elapsed.as_secs_f64())?;
    writeln!(w, "{}", separator())?;
    Ok(())
}

fn write_counts<W: Write>(w: &mut W, counts: &[ValueCount]) -> Result<()> {
    for entry in counts {
        writeln!(w, "  {}: {}", entry.value, entry.count)?;
    }
    Ok(())
}

/// Writes a page of raw trips. `offset` is the table index of the first trip.
pub fn write_trips<W: Write>(w: &mut W, table: &TripTable, trips: &[Trip], offset: usize) -> Result<()> {
    for (i, trip) in trips.iter().enumerate() {
        write!(
            w,
            "[{}] {} -> {} | {} -> {} | {} | {} {:02}h",
            offset + i,
            trip.start.format(TIMESTAMP_FORMAT),
            trip.end.format(TIMESTAMP_FORMAT),
            trip.start_station,
            trip.end_station,
            trip.user_type.as_deref().unwrap_or("-"),
            weekday_name(trip.weekday),
            trip.hour,
        )?;
        if table.has_gender() {
            write!(w, " | {}", trip.gender.as_deref().unwrap_or("-"))?;
        }
        if table.has_birth_year() {
            match trip.birth_year {
                Some(year) => write!(w, " | {year}")?,
                None => write!(w, " | -")?,
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Writes a [`CityReport`] as pretty-printed JSON.
pub fn write_json<W: Write>(w: &mut W, report: &CityReport) -> Result<()> {
    let text = serde_json::to_string_pretty(report)?;
    writeln!(w, "{text}")?;
    Ok(())
}

/// Loads one filtered table and writes its statistics to `out`, as text or JSON.
///
/// Returns `Ok(false)` once a data error has been reported on `err`; any other
/// failure is returned to the caller.
#[tracing::instrument(skip(config, out, err), fields(filters = %filters))]
pub fn run_report<W: Write, E: Write>(
    config: &DataConfig,
    filters: &Filters,
    json: bool,
    out: &mut W,
    err: &mut E,
) -> Result<bool> {
    let result = loader::load(config, filters).and_then(|table| {
        if json {
            write_json(&mut *out, &analyze(&table, filters)?)
        } else {
            write_statistics(&mut *out, &table, filters)
        }
    });

    match result {
        Ok(()) => {
            out.flush()?;
            Ok(true)
        }
        Err(e) if e.is_data_format() => {
            debug!(error = %e, "Report failed");
            writeln!(err, "Could not analyze {}: {e}", filters.city)?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BikeshareError;
    use crate::filters::City;
    use crate::trip::OptionalColumns;
    use chrono::NaiveDate;

    fn table(columns: OptionalColumns) -> TripTable {
        let start = NaiveDate::from_ymd_opt(2017, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let trips = vec![
            Trip::new(start, start + TimeDelta::minutes(10), "A", "B", Some("Subscriber".into()))
                .with_gender(Some("Female".into()))
                .with_birth_year(Some(1990)),
            Trip::new(start, start + TimeDelta::minutes(20), "A", "C", Some("Customer".into())),
        ];
        TripTable::new(City::Chicago, trips, columns)
    }

    fn render(table: &TripTable) -> String {
        let mut out = Vec::new();
        write_statistics(&mut out, table, &Filters::unfiltered(table.city())).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::minutes(30)), "0 days 00:30:00");
        assert_eq!(format_duration(TimeDelta::seconds(90_061)), "1 days 01:01:01");
        assert_eq!(format_duration(TimeDelta::zero()), "0 days 00:00:00");
        assert_eq!(format_duration(TimeDelta::seconds(-5)), "-0 days 00:00:05");
    }

    #[test]
    fn test_write_statistics_sections() {
        let text = render(&table(OptionalColumns {
            gender: true,
            birth_year: true,
        }));
        assert!(text.contains("The most common month is: January"));
        assert!(text.contains("The most common day of week is: Monday"));
        assert!(text.contains("The most common start station is: A"));
        assert!(text.contains("The most frequent combination is: A -> B (1 trips)"));
        assert!(text.contains("Total travel time is: 0 days 00:30:00"));
        assert!(text.contains("Average travel time is: 0 days 00:15:00"));
        assert!(text.contains("  Subscriber: 1"));
        assert!(text.contains("  Female: 1"));
        assert!(text.contains("The earliest year of birth is: 1990"));
        assert_eq!(text.matches("This took").count(), 4);
    }

    #[test]
    fn test_write_statistics_not_available() {
        let text = render(&table(OptionalColumns::default()));
        assert!(text.contains("Gender data is not available."));
        assert!(text.contains("Birth year data is not available."));
        assert!(text.contains("  Customer: 1"));
    }

    #[test]
    fn test_write_statistics_empty_table() {
        let empty = TripTable::new(City::Washington, vec![], OptionalColumns::default());
        let text = render(&empty);
        assert!(text.contains("No trips match the selected filters."));
        assert!(!text.contains("This took"));
    }

    #[test]
    fn test_write_trips() {
        let table = table(OptionalColumns {
            gender: true,
            birth_year: false,
        });
        let mut out = Vec::new();
        write_trips(&mut out, &table, table.trips(), 0).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[0] 2017-01-02 09:00:00 -> 2017-01-02 09:10:00 | A -> B"));
        assert!(lines[0].ends_with("| Female"));
        assert!(lines[1].ends_with("| -"));
    }

    #[test]
    fn test_write_json() {
        let table = table(OptionalColumns::default());
        let filters = Filters::unfiltered(City::Chicago);
        let report = analyze(&table, &filters).unwrap();

        let mut out = Vec::new();
        write_json(&mut out, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["city"], "Chicago");
        assert_eq!(value["trips"], 2);
        assert_eq!(value["durations"]["total"], "0 days 00:30:00");
        assert_eq!(value["users"]["gender"]["status"], "not_available");
        assert_eq!(value["users"]["user_types"][0]["value"], "Subscriber");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_json_reports_io_errors_as_io() {
        let table = table(OptionalColumns::default());
        let report = analyze(&table, &Filters::unfiltered(City::Chicago)).unwrap();

        let err = write_json(&mut ClosedPipe, &report).unwrap_err();
        assert!(matches!(
            err,
            BikeshareError::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe
        ));
    }
}
