use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

/// Malformed fade window marker
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerParseError {
    #[error("invalid time of day '{0}', expected 15:04 or 3:04PM")]
    InvalidTime(String),
    #[error("invalid date '{0}', expected MM-DD")]
    InvalidDate(String),
}

const TIME_FORMATS: &[&str] = &["%H:%M", "%I:%M%p", "%I:%M %p"];

/// A clock time with minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    /// `None` unless `hour < 24` and `minute < 60`
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(hour * 60 + minute))
    }

    /// Time of day of `now`, seconds truncated
    pub fn of(now: &NaiveDateTime) -> Self {
        Self(now.hour() * 60 + now.minute())
    }

    /// Minutes since midnight
    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = MarkerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
            .map(|time| Self(time.hour() * 60 + time.minute()))
            .ok_or_else(|| MarkerParseError::InvalidTime(s.to_owned()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// A calendar day, independent of the year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Any day that exists in a leap year is accepted
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// Month, starting at 1
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Day of the month, starting at 1
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Zero-based day of `year` this marker falls on
    ///
    /// Days missing from `year` (February 29th in a common year) roll over
    /// to the following day.
    pub fn ordinal0_in(&self, year: i32) -> u32 {
        NaiveDate::from_ymd_opt(year, self.month, 1)
            .and_then(|first| first.checked_add_days(Days::new(u64::from(self.day - 1))))
            // Only unreachable years fall outside chrono's calendar
            .map_or(0, |date| date.ordinal0())
    }
}

impl FromStr for MonthDay {
    type Err = MarkerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || MarkerParseError::InvalidDate(s.to_owned());

        let (month, day) = s.split_once('-').ok_or_else(invalid)?;
        let month = month.parse().map_err(|_| invalid())?;
        let day = day.parse().map_err(|_| invalid())?;

        Self::new(month, day).ok_or_else(invalid)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Number of days in `year`
pub fn year_length(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}
