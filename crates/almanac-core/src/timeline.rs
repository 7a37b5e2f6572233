use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::datetime::{DAY_MILLIS, local_datetime_serde};
use crate::model::{Mission, MissionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub id: String,
    pub title: String,
    #[serde(with = "local_datetime_serde")]
    pub start: NaiveDateTime,
    #[serde(with = "local_datetime_serde")]
    pub end: NaiveDateTime,
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_days: i64,
    pub progress: u8,
    pub status: MissionStatus,
    /// Bar opacity by status.
    pub opacity: f32,
    pub color: String,
    pub is_active: bool,
}

/// Axis bounds spanning every mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineDomain {
    #[serde(with = "local_datetime_serde")]
    pub min_start: NaiveDateTime,
    #[serde(with = "local_datetime_serde")]
    pub max_end: NaiveDateTime,
}

impl TimelineDomain {
    pub fn min_start_ms(&self) -> i64 {
        epoch_millis(self.min_start)
    }

    pub fn max_end_ms(&self) -> i64 {
        epoch_millis(self.max_end)
    }

    pub fn span_ms(&self) -> i64 {
        self.max_end_ms() - self.min_start_ms()
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.min_start <= instant && instant <= self.max_end
    }

    /// Position of `instant` along the axis in `[0, 1]`, clamped. A
    /// zero-width domain maps everything to 0.
    pub fn fraction(&self, instant: NaiveDateTime) -> f64 {
        let span = self.span_ms();
        if span <= 0 {
            return 0.0;
        }
        let offset = epoch_millis(instant) - self.min_start_ms();
        (offset as f64 / span as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub rows: Vec<TimelineRow>,
    /// `None` when there are no missions to span.
    pub domain: Option<TimelineDomain>,
    #[serde(with = "local_datetime_serde")]
    pub today: NaiveDateTime,
}

impl Timeline {
    pub fn today_ms(&self) -> i64 {
        epoch_millis(self.today)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whole days covered by `[start, end]`, rounded up. Equal instants give 0.
pub fn duration_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let span = (end - start).num_milliseconds();
    -((-span).div_euclid(DAY_MILLIS))
}

/// Epoch milliseconds of a local date-time, read as if it were UTC.
pub fn epoch_millis(instant: NaiveDateTime) -> i64 {
    instant.and_utc().timestamp_millis()
}

#[tracing::instrument(skip(missions), fields(missions = missions.len()))]
pub fn build_timeline(missions: &[Mission], today: NaiveDateTime) -> Timeline {
    let rows: Vec<TimelineRow> = missions
        .iter()
        .map(|mission| TimelineRow {
            id: mission.id.clone(),
            title: mission.title.clone(),
            start: mission.start,
            end: mission.end,
            start_ms: epoch_millis(mission.start),
            end_ms: epoch_millis(mission.end),
            duration_days: duration_days(mission.start, mission.end),
            progress: mission.progress,
            status: mission.status,
            opacity: mission.status.bar_opacity(),
            color: mission.color.clone(),
            is_active: mission.start <= today && today <= mission.end,
        })
        .collect();

    let domain = missions
        .iter()
        .map(|m| m.start)
        .min()
        .zip(missions.iter().map(|m| m.end).max())
        .map(|(min_start, max_end)| TimelineDomain { min_start, max_end });

    debug!(
        rows = rows.len(),
        active = rows.iter().filter(|r| r.is_active).count(),
        ?domain,
        "built timeline"
    );

    Timeline {
        rows,
        domain,
        today,
    }
}
