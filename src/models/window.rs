use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Date format used by the article store API (day-month-year)
pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid date '{0}', expected dd-mm-yyyy")]
    InvalidDate(String),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("hour {0} is out of range 0-23")]
    InvalidHour(u32),
}

/// Parse a `dd-mm-yyyy` date
pub fn parse_date(s: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| WindowError::InvalidDate(s.to_string()))
}

/// Format a date the way the article store expects it
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Generation-model variant selector ("temperature" class)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Feature(pub u32);

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive calendar-date range with a fixed daily hour span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl DateWindow {
    /// Window covering whole days (00:00 to 23:00)
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        Self::with_hours(start, end, 0, 23)
    }

    pub fn with_hours(
        start: NaiveDate,
        end: NaiveDate,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::EndBeforeStart { start, end });
        }
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(WindowError::InvalidHour(hour));
            }
        }
        Ok(Self {
            start,
            end,
            start_hour,
            end_hour,
        })
    }

    /// Parse both bounds from `dd-mm-yyyy` strings
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Every calendar day in the window, both endpoints included
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Number of days in the window
    pub fn day_count(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }
}
