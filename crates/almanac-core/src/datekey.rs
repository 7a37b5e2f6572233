//! Calendar-day identity of a date or date-time.
//!
//! Two instants share a [`DateKey`] when they fall on the same calendar
//! year, month and day. The time of day never takes part in the comparison.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey {
    pub year: i32,
    /// 1-based
    pub month: u32,
    pub day: u32,
}

impl DateKey {
    pub fn of<D: Datelike>(value: &D) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
        }
    }

    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(value: NaiveDate) -> Self {
        Self::of(&value)
    }
}

impl From<NaiveDateTime> for DateKey {
    fn from(value: NaiveDateTime) -> Self {
        Self::of(&value)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// True when `a` and `b` fall on the same calendar day.
pub fn same_day<A: Datelike, B: Datelike>(a: &A, b: &B) -> bool {
    DateKey::of(a) == DateKey::of(b)
}

/// True when `value` falls on the calendar day of `now`.
///
/// `now` is sampled once by the caller so that a whole build agrees on
/// what "today" is.
pub fn is_today<D: Datelike>(value: &D, now: NaiveDateTime) -> bool {
    same_day(value, &now)
}
