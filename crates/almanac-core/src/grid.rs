//! Fixed six-week month grid.
//!
//! A [`MonthGrid`] always holds 42 consecutive days starting on a Monday.
//! Days outside the displayed month pad the first and last weeks and are
//! flagged as overflow.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::datekey::DateKey;
use crate::datetime::{add_days, days_in_month, first_day_of_month, shift_months};
use crate::error::CalendarResult;
use crate::model::Event;

pub const DAYS_PER_WEEK: usize = 7;
pub const WEEKS_PER_GRID: usize = 6;
pub const GRID_CELLS: usize = DAYS_PER_WEEK * WEEKS_PER_GRID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub events: Vec<Event>,
}

impl CalendarDay {
    fn empty(date: NaiveDate, is_current_month: bool) -> Self {
        Self {
            date,
            is_current_month,
            events: Vec::new(),
        }
    }

    pub fn key(&self) -> DateKey {
        DateKey::from(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    year: i32,
    month: u32,
    first_weekday_offset: u32,
    days: Vec<CalendarDay>,
}

impl MonthGrid {
    /// Builds the grid for the month containing `reference`.
    pub fn build(reference: NaiveDate) -> CalendarResult<Self> {
        Self::for_month(reference.year(), reference.month())
    }

    #[tracing::instrument]
    pub fn for_month(year: i32, month: u32) -> CalendarResult<Self> {
        let first = first_day_of_month(year, month)?;
        let month_len = days_in_month(year, month)?;
        let offset = first.weekday().num_days_from_monday();

        let mut days = Vec::with_capacity(GRID_CELLS);

        // Tail of the previous month: days_in_prev - offset + 1 ..= days_in_prev.
        if offset > 0 {
            let prev_first = shift_months(first, -1)?;
            let prev_len = days_in_month(prev_first.year(), prev_first.month())?;
            for day in (prev_len - offset + 1)..=prev_len {
                days.push(CalendarDay::empty(day_of(prev_first, day)?, false));
            }
        }

        for day in 1..=month_len {
            days.push(CalendarDay::empty(day_of(first, day)?, true));
        }

        // A month never covers more than 37 cells, so the next month always pads.
        let next_first = shift_months(first, 1)?;
        let mut day = 1;
        while days.len() < GRID_CELLS {
            days.push(CalendarDay::empty(day_of(next_first, day)?, false));
            day += 1;
        }

        debug!(
            year,
            month,
            offset,
            month_len,
            first = %days.first().map(|d| d.date).unwrap_or(first),
            "built month grid"
        );

        Ok(Self {
            year,
            month,
            first_weekday_offset: offset,
            days,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Monday = 0 … Sunday = 6 for day 1 of the displayed month; also the
    /// number of leading overflow cells.
    pub fn first_weekday_offset(&self) -> u32 {
        self.first_weekday_offset
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn into_days(self) -> Vec<CalendarDay> {
        self.days
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(DAYS_PER_WEEK)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.days[GRID_CELLS - 1].date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.position_of(DateKey::from(date)).is_some()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.position_of(DateKey::from(date))
            .map(|idx| &self.days[idx])
    }

    /// Index of the cell whose calendar day equals `key`.
    pub(crate) fn position_of(&self, key: DateKey) -> Option<usize> {
        let date = key.to_date()?;
        let offset = (date - self.first_date()).num_days();
        usize::try_from(offset)
            .ok()
            .filter(|idx| *idx < self.days.len())
    }

    pub(crate) fn days_mut(&mut self) -> &mut [CalendarDay] {
        &mut self.days
    }
}

/// Day 1 of the month `months` away from `reference`; backs the
/// previous/next month navigation.
pub fn shift_month(reference: NaiveDate, months: i32) -> CalendarResult<NaiveDate> {
    let first = first_day_of_month(reference.year(), reference.month())?;
    shift_months(first, months)
}

fn day_of(first: NaiveDate, day: u32) -> CalendarResult<NaiveDate> {
    add_days(first, i64::from(day) - 1)
}
