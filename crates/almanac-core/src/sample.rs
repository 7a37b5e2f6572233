//! Demo data set: four events in June 2024 and five missions spread over
//! May to September 2024.

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{Event, EventCategory, Mission, MissionStatus};

const AUDIT_EDUCATION: &str = "Audit financier du ministère de l'Éducation";
const HEALTH_POLICY: &str = "Évaluation des politiques de santé publique";

fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

fn event(
    id: &str,
    title: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    category: EventCategory,
    mission: &str,
    participants: u32,
) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        start,
        end,
        category,
        mission: mission.to_string(),
        participants,
    }
}

fn mission(
    id: &str,
    title: &str,
    status: MissionStatus,
    start: NaiveDateTime,
    end: NaiveDateTime,
    progress: u8,
    color: &str,
) -> Mission {
    Mission {
        id: id.to_string(),
        title: title.to_string(),
        status,
        start,
        end,
        progress,
        color: color.to_string(),
    }
}

pub fn events() -> Vec<Event> {
    vec![
        event(
            "1",
            "Réunion de lancement - Audit financier",
            at(6, 15, 10, 0),
            at(6, 15, 11, 30),
            EventCategory::Meeting,
            AUDIT_EDUCATION,
            6,
        ),
        event(
            "2",
            "Entretien avec le directeur financier",
            at(6, 16, 14, 0),
            at(6, 16, 15, 0),
            EventCategory::Interview,
            AUDIT_EDUCATION,
            3,
        ),
        event(
            "3",
            "Analyse des documents comptables",
            at(6, 17, 9, 0),
            at(6, 17, 16, 0),
            EventCategory::Work,
            AUDIT_EDUCATION,
            2,
        ),
        event(
            "4",
            "Présentation des résultats préliminaires",
            at(6, 20, 15, 0),
            at(6, 20, 16, 30),
            EventCategory::Presentation,
            HEALTH_POLICY,
            8,
        ),
    ]
}

pub fn missions() -> Vec<Mission> {
    vec![
        mission(
            "1",
            AUDIT_EDUCATION,
            MissionStatus::Active,
            at(6, 10, 0, 0),
            at(7, 15, 0, 0),
            45,
            "#3b82f6",
        ),
        mission(
            "2",
            HEALTH_POLICY,
            MissionStatus::Active,
            at(6, 5, 0, 0),
            at(7, 20, 0, 0),
            30,
            "#0ea5e9",
        ),
        mission(
            "3",
            "Revue des dépenses du projet d'infrastructure",
            MissionStatus::Draft,
            at(7, 1, 0, 0),
            at(8, 15, 0, 0),
            15,
            "#f59e0b",
        ),
        mission(
            "4",
            "Analyse du programme de développement durable",
            MissionStatus::Completed,
            at(5, 15, 0, 0),
            at(6, 10, 0, 0),
            100,
            "#10b981",
        ),
        mission(
            "5",
            "Audit de conformité des marchés publics",
            MissionStatus::Active,
            at(7, 10, 0, 0),
            at(9, 5, 0, 0),
            20,
            "#6366f1",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_records_are_valid() {
        for event in events() {
            event.validate().expect("valid sample event");
        }
        for mission in missions() {
            mission.validate().expect("valid sample mission");
        }
    }
}
