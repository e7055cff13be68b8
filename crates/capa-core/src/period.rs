//! Named calendar periods used to pick a summary window.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::range::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Month,
    Quarter,
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month => f.write_str("month"),
            Self::Quarter => f.write_str("quarter"),
        }
    }
}

/// A calendar month or quarter, e.g. `Jan 2026` or `Q1 2026`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub name: String,
    pub kind: PeriodKind,
    pub range: DateRange,
}

impl Period {
    /// The month `month` (1-12) of `year`.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let range = DateRange::new(first, last_day_of_month(first)?).ok()?;
        Some(Self {
            name: first.format("%b %Y").to_string(),
            kind: PeriodKind::Month,
            range,
        })
    }

    /// The quarter `quarter` (1-4) of `year`.
    pub fn quarter(year: i32, quarter: u32) -> Option<Self> {
        if !(1..=4).contains(&quarter) {
            return None;
        }
        let first = NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)?;
        let third_month = NaiveDate::from_ymd_opt(year, quarter * 3, 1)?;
        let range = DateRange::new(first, last_day_of_month(third_month)?).ok()?;
        Some(Self {
            name: format!("Q{quarter} {year}"),
            kind: PeriodKind::Quarter,
            range,
        })
    }

    /// The month containing `day`.
    pub fn month_of(day: NaiveDate) -> Option<Self> {
        Self::month(day.year(), day.month())
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
