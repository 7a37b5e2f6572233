use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, trace};

use crate::datekey::{DateKey, same_day};
use crate::grid::{CalendarDay, MonthGrid};
use crate::model::Event;

/// Places each event in the cell matching the calendar day of its start.
///
/// Same-day events keep their input order. Events outside the 42-day window
/// are dropped.
#[tracing::instrument(skip_all, fields(year = grid.year(), month = grid.month(), events = events.len()))]
pub fn bind_events(mut grid: MonthGrid, events: &[Event]) -> MonthGrid {
    let mut bound = 0_usize;

    for event in events {
        let key = DateKey::from(event.start);
        match grid.position_of(key) {
            Some(idx) => {
                grid.days_mut()[idx].events.push(event.clone());
                bound += 1;
            }
            None => {
                trace!(id = %event.id, day = %key, "event outside grid window");
            }
        }
    }

    debug!(
        bound,
        dropped = events.len() - bound,
        "bound events to month grid"
    );
    grid
}

/// Events starting on `date`, in input order.
pub fn events_on(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events
        .iter()
        .filter(|event| same_day(&event.start, &date))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayPreview<'a> {
    pub shown: &'a [Event],
    pub hidden: usize,
}

impl CalendarDay {
    /// First `limit` events of the cell plus how many did not fit.
    pub fn preview(&self, limit: usize) -> DayPreview<'_> {
        let shown = &self.events[..self.events.len().min(limit)];
        DayPreview {
            shown,
            hidden: self.events.len() - shown.len(),
        }
    }
}
