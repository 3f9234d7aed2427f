//! Interactive prompt loop: collect filters, analyze, page through raw trips, restart.

use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, error, info};

use crate::config::DataConfig;
use crate::error::{BikeshareError, Result};
use crate::filters::{City, DayFilter, Filters, MonthFilter};
use crate::loader;
use crate::output::{write_statistics, write_trips};
use crate::trip::{Trip, TripTable};

/// Number of raw trips shown per page.
pub const PAGE_SIZE: usize = 5;

const GREETING: &str = "Hello! Let's explore some US bikeshare data!";
const CITY_HINT: &str =
    "Please enter the correct city! Hint: The city should be chicago, new york city or washington";
const MONTH_HINT: &str =
    "Please enter the correct month! Hint: The month should be from January to June or all";
const DAY_HINT: &str =
    "Please enter the correct day of week! Hint: The day should be from Monday to Sunday or all";
const VIEW_RAW: &str = "Would you like to view the raw data? Enter yes or no.";
const VIEW_NEXT: &str = "Would you like to view the next 5 records? Enter yes or no.";
const RESTART: &str = "Would you like to restart? Enter yes or no.";
const ALL_DISPLAYED: &str = "All records have been displayed.";

/// Walks a slice of trips in fixed-size pages.
///
/// Yields `(offset, page)` pairs until the offset reaches the end of the slice.
pub struct Pager<'a> {
    trips: &'a [Trip],
    offset: usize,
    page_size: usize,
}

impl<'a> Pager<'a> {
    pub fn new(trips: &'a [Trip], page_size: usize) -> Self {
        Self {
            trips,
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True once every trip has been handed out.
    pub fn is_done(&self) -> bool {
        self.offset >= self.trips.len()
    }
}

impl<'a> Iterator for Pager<'a> {
    type Item = (usize, &'a [Trip]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done() {
            return None;
        }
        let trips = self.trips;
        let start = self.offset;
        let end = (start + self.page_size).min(trips.len());
        self.offset = end;
        Some((start, &trips[start..end]))
    }
}

/// Outcome of an interactive session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Analysis passes that completed.
    pub analyses: usize,
    /// Analysis passes aborted by an error.
    pub failures: usize,
    /// Whether the final pass before exit was aborted.
    pub last_failed: bool,
}

enum State {
    CollectFilters,
    LoadAndAnalyze(Filters),
    ViewRaw(TripTable),
    RestartOrExit,
    Done,
}

/// Drives the prompt loop over any line-oriented input and output.
///
/// End of input at any prompt ends the session as if the user had declined.
pub struct Session<R, W> {
    config: DataConfig,
    input: R,
    output: W,
    summary: SessionSummary,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(config: DataConfig, input: R, output: W) -> Self {
        Self {
            config,
            input,
            output,
            summary: SessionSummary::default(),
        }
    }

    /// Runs until the user declines to restart or input ends.
    ///
    /// # Errors
    ///
    /// Only console I/O failures are returned; analysis errors are reported to
    /// the user and end the current pass.
    pub fn run(mut self) -> Result<SessionSummary> {
        let mut state = State::CollectFilters;

        loop {
            state = match state {
                State::CollectFilters => match self.collect_filters()? {
                    Some(filters) => State::LoadAndAnalyze(filters),
                    None => State::Done,
                },
                State::LoadAndAnalyze(filters) => match self.load_and_analyze(&filters)? {
                    Some(table) => State::ViewRaw(table),
                    None => State::RestartOrExit,
                },
                State::ViewRaw(table) => {
                    self.view_raw(&table)?;
                    State::RestartOrExit
                }
                State::RestartOrExit => {
                    if self.ask_yes(RESTART)? {
                        State::CollectFilters
                    } else {
                        State::Done
                    }
                }
                State::Done => break,
            };
        }

        info!(
            analyses = self.summary.analyses,
            failures = self.summary.failures,
            "Session finished"
        );
        Ok(self.summary)
    }

    fn collect_filters(&mut self) -> Result<Option<Filters>> {
        writeln!(self.output, "{GREETING}")?;

        let Some(city) = self.prompt_valid::<City>("Enter City: ", CITY_HINT)? else {
            return Ok(None);
        };
        let Some(month) = self.prompt_valid::<MonthFilter>("Enter Month: ", MONTH_HINT)? else {
            return Ok(None);
        };
        let Some(day) = self.prompt_valid::<DayFilter>("Enter Day of Week: ", DAY_HINT)? else {
            return Ok(None);
        };

        writeln!(self.output, "{}", "-".repeat(40))?;
        Ok(Some(Filters::new(city, month, day)))
    }

    fn load_and_analyze(&mut self, filters: &Filters) -> Result<Option<TripTable>> {
        info!(filters = %filters, "Starting analysis");

        let result = loader::load(&self.config, filters)
            .and_then(|table| write_statistics(&mut self.output, &table, filters).map(|()| table));

        match result {
            Ok(table) => {
                self.summary.analyses += 1;
                self.summary.last_failed = false;
                Ok(Some(table))
            }
            Err(BikeshareError::Io(e)) => Err(BikeshareError::Io(e)),
            Err(e) => {
                error!(error = %e, data_error = e.is_data_format(), "Analysis aborted");
                self.summary.failures += 1;
                self.summary.last_failed = true;
                writeln!(self.output, "Could not analyze {}: {e}", filters.city)?;
                Ok(None)
            }
        }
    }

    fn view_raw(&mut self, table: &TripTable) -> Result<()> {
        if table.is_empty() || !self.ask_yes(VIEW_RAW)? {
            return Ok(());
        }

        let mut pager = Pager::new(table.trips(), PAGE_SIZE);
        while let Some((offset, page)) = pager.next() {
            write_trips(&mut self.output, table, page, offset)?;
            if pager.is_done() {
                writeln!(self.output, "{ALL_DISPLAYED}")?;
                break;
            }
            if !self.ask_yes(VIEW_NEXT)? {
                break;
            }
        }
        debug!(shown = pager.offset(), total = table.len(), "Raw view closed");
        Ok(())
    }

    /// Re-prompts until the answer parses, or returns `None` at end of input.
    fn prompt_valid<T>(&mut self, prompt: &str, hint: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = BikeshareError>,
    {
        loop {
            let Some(answer) = self.prompt(prompt)? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => {
                    debug!(error = %e, "Rejected input");
                    writeln!(self.output, "{hint}")?;
                }
            }
        }
    }

    fn ask_yes(&mut self, question: &str) -> Result<bool> {
        let answer = self.prompt(&format!("\n{question}\n"))?;
        Ok(answer.is_some_and(|a| is_yes(&a)))
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}
