use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::CalendarResult;
use crate::model::{Event, Mission};
use crate::sample;

/// Read-only view over a directory of event and mission files.
///
/// Each collection is read from `<name>.json` (a JSON array) or, failing
/// that, `<name>.data` (one JSON object per line). Nothing is ever written
/// back.
#[derive(Debug, Clone)]
pub struct DataSource {
    pub data_dir: Option<PathBuf>,
    pub events: Vec<Event>,
    pub missions: Vec<Mission>,
}

impl DataSource {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        if !data_dir.is_dir() {
            return Err(anyhow!(
                "data directory does not exist: {}",
                data_dir.display()
            ));
        }

        let events: Vec<Event> = load_collection(data_dir, "events", Event::validate)?;
        let missions: Vec<Mission> = load_collection(data_dir, "missions", Mission::validate)?;

        info!(
            data_dir = %data_dir.display(),
            events = events.len(),
            missions = missions.len(),
            "opened data source"
        );

        Ok(Self {
            data_dir: Some(data_dir.to_path_buf()),
            events,
            missions,
        })
    }

    pub fn sample() -> Self {
        info!("using built-in sample data");
        Self {
            data_dir: None,
            events: sample::events(),
            missions: sample::missions(),
        }
    }
}

fn load_collection<T, F>(dir: &Path, name: &str, validate: F) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> CalendarResult<()>,
{
    let json_path = dir.join(format!("{name}.json"));
    let jsonl_path = dir.join(format!("{name}.data"));

    let records = if json_path.exists() {
        load_json_array(&json_path, &validate)?
    } else if jsonl_path.exists() {
        load_jsonl(&jsonl_path, &validate)?
    } else {
        warn!(dir = %dir.display(), name, "no input file found; using empty list");
        Vec::new()
    };

    Ok(records)
}

#[tracing::instrument(skip(path, validate))]
fn load_json_array<T, F>(path: &Path, validate: &F) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> CalendarResult<()>,
{
    debug!(file = %path.display(), "loading json array");
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let records: Vec<T> = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;

    for (idx, record) in records.iter().enumerate() {
        validate(record)
            .with_context(|| format!("invalid record {} in {}", idx + 1, path.display()))?;
    }

    debug!(count = records.len(), "loaded records from json array");
    Ok(records)
}

#[tracing::instrument(skip(path, validate))]
fn load_jsonl<T, F>(path: &Path, validate: &F) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> CalendarResult<()>,
{
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        validate(&record)
            .with_context(|| format!("invalid record at {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_files_are_empty_lists() {
        let temp = tempdir().expect("tempdir");
        let source = DataSource::open(temp.path()).expect("open source");
        assert!(source.events.is_empty());
        assert!(source.missions.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let gone = temp.path().join("nope");
        assert!(DataSource::open(&gone).is_err());
    }

    #[test]
    fn jsonl_skips_blank_lines_and_reports_bad_line() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("missions.data"),
            concat!(
                r#"{"id":"1","title":"A","status":"draft","start":"2024-06-01","end":"2024-06-02"}"#,
                "\n\n",
                r#"{"id":"2","title":"B","status":"active","start":"2024-06-05","end":"2024-06-01"}"#,
                "\n"
            ),
        )
        .expect("write fixture");

        let err = DataSource::open(temp.path()).expect_err("backwards mission rejected");
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn sample_source_has_demo_records() {
        let source = DataSource::sample();
        assert_eq!(source.events.len(), 4);
        assert_eq!(source.missions.len(), 5);
        assert!(source.data_dir.is_none());
    }
}
