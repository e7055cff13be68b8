//! Inclusive calendar-date ranges.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// The end date of a range precedes its start date.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("end date {end} precedes start date {start}")]
pub struct RangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A closed range of calendar days, `start..=end`.
///
/// Both bounds are inclusive: an allocation from Jan 1 to Jan 31 covers
/// Jan 31. A range always satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub const fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Closed-interval overlap test: `self.start <= other.end && self.end >= other.start`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// The days covered by both ranges, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        Self::new(start, end).ok()
    }

    /// Number of days covered (always at least 1).
    pub fn days(&self) -> i64 {
        self.end_ordinal() - self.start_ordinal()
    }

    /// Day number of `start` on a continuous grid.
    pub(crate) fn start_ordinal(&self) -> i64 {
        day_ordinal(self.start)
    }

    /// Day number one past `end`, so the range covers `start_ordinal()..end_ordinal()`.
    pub(crate) fn end_ordinal(&self) -> i64 {
        day_ordinal(self.end) + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

pub(crate) fn day_ordinal(day: NaiveDate) -> i64 {
    i64::from(day.num_days_from_ce())
}

pub(crate) fn date_from_ordinal(ordinal: i64) -> Option<NaiveDate> {
    i32::try_from(ordinal)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}
