//! French display strings and colour hints for calendar output.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::model::{EventCategory, MissionStatus};

pub const WEEKDAY_LABELS: [&str; 7] = ["Lun", "Mar", "Mer", "Jeu", "Ven", "Sam", "Dim"];

const WEEKDAY_NAMES: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTH_NAMES: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

const MONTH_SHORT: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

/// `"juin 2024"`
pub fn month_title(year: i32, month: u32) -> String {
    format!("{} {year}", month_name(month))
}

/// `"10:00"`
pub fn format_time(instant: NaiveDateTime) -> String {
    format!("{:02}:{:02}", instant.hour(), instant.minute())
}

/// `"15 juin"`, used for timeline axis ticks and tooltips.
pub fn format_short_date(date: NaiveDate) -> String {
    let month = MONTH_SHORT
        .get(date.month0() as usize)
        .copied()
        .unwrap_or("?");
    format!("{} {month}", date.day())
}

/// `"samedi 15 juin"`, used as the selected-day header.
pub fn format_long_date(date: NaiveDate) -> String {
    let weekday = WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize];
    format!("{weekday} {} {}", date.day(), month_name(date.month()))
}

impl EventCategory {
    /// ANSI SGR colour code for terminal output.
    pub fn ansi_color(&self) -> &'static str {
        match self {
            Self::Meeting => "34",
            Self::Interview => "33",
            Self::Work => "32",
            Self::Presentation => "35",
            Self::Other(_) => "90",
        }
    }
}

impl MissionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "En cours",
            Self::Completed => "Terminée",
            Self::Draft => "Brouillon",
        }
    }

    /// Bar opacity on the timeline.
    pub fn bar_opacity(self) -> f32 {
        match self {
            Self::Completed => 1.0,
            Self::Active => 0.8,
            Self::Draft => 0.5,
        }
    }

    /// Character used to draw the timeline bar; fainter for lower opacity.
    pub fn bar_glyph(self) -> char {
        match self {
            Self::Completed => '█',
            Self::Active => '▓',
            Self::Draft => '░',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn french_titles_and_dates() {
        assert_eq!(month_title(2024, 6), "juin 2024");
        assert_eq!(month_title(2024, 8), "août 2024");
        assert_eq!(format_short_date(ymd(2024, 7, 15)), "15 juil.");
        assert_eq!(format_long_date(ymd(2024, 6, 15)), "samedi 15 juin");
    }

    #[test]
    fn time_is_zero_padded() {
        let instant = ymd(2024, 6, 15).and_hms_opt(9, 5, 0).expect("valid time");
        assert_eq!(format_time(instant), "09:05");
    }

    #[test]
    fn status_opacity_matches_legend() {
        assert_eq!(MissionStatus::Completed.bar_opacity(), 1.0);
        assert_eq!(MissionStatus::Active.bar_opacity(), 0.8);
        assert_eq!(MissionStatus::Draft.bar_opacity(), 0.5);
        assert_eq!(MissionStatus::Draft.label(), "Brouillon");
    }

    #[test]
    fn unknown_categories_are_gray() {
        assert_eq!(EventCategory::Other("x".to_string()).ansi_color(), "90");
        assert_eq!(EventCategory::Work.ansi_color(), "32");
    }
}
