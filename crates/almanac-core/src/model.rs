use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::datetime::local_datetime_serde;
use crate::error::{CalendarError, CalendarResult};

/// Colour-coding bucket of an event. Unknown categories survive a
/// round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Meeting,
    Interview,
    Work,
    Presentation,
    Other(String),
}

impl EventCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Meeting => "meeting",
            Self::Interview => "interview",
            Self::Work => "work",
            Self::Presentation => "presentation",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "meeting" => Self::Meeting,
            "interview" => Self::Interview,
            "work" => Self::Work,
            "presentation" => Self::Presentation,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Active,
    Completed,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,

    pub title: String,

    #[serde(alias = "date", with = "local_datetime_serde")]
    pub start: NaiveDateTime,

    #[serde(alias = "endTime", with = "local_datetime_serde")]
    pub end: NaiveDateTime,

    #[serde(alias = "type")]
    pub category: EventCategory,

    #[serde(default)]
    pub mission: String,

    #[serde(default)]
    pub participants: u32,
}

impl Event {
    pub fn validate(&self) -> CalendarResult<()> {
        require_id(&self.id)?;
        if self.end < self.start {
            return Err(invalid(&self.id, "event ends before it starts"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mission {
    pub id: String,

    pub title: String,

    pub status: MissionStatus,

    #[serde(alias = "startDate", with = "local_datetime_serde")]
    pub start: NaiveDateTime,

    #[serde(alias = "endDate", with = "local_datetime_serde")]
    pub end: NaiveDateTime,

    #[serde(default)]
    pub progress: u8,

    #[serde(default = "default_mission_color")]
    pub color: String,
}

impl Mission {
    pub fn validate(&self) -> CalendarResult<()> {
        require_id(&self.id)?;
        if self.end < self.start {
            return Err(invalid(&self.id, "mission ends before it starts"));
        }
        if self.progress > 100 {
            return Err(invalid(
                &self.id,
                &format!("progress {} exceeds 100", self.progress),
            ));
        }
        Ok(())
    }
}

fn default_mission_color() -> String {
    "#3b82f6".to_string()
}

fn require_id(id: &str) -> CalendarResult<()> {
    if id.trim().is_empty() {
        return Err(invalid(id, "identifier is empty"));
    }
    Ok(())
}

fn invalid(id: &str, reason: &str) -> CalendarError {
    CalendarError::InvalidRecord {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}
