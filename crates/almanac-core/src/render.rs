use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::datekey::is_today;
use crate::format::{
    WEEKDAY_LABELS, format_long_date, format_short_date, format_time, month_title,
};
use crate::grid::MonthGrid;
use crate::model::{Event, MissionStatus};
use crate::timeline::{Timeline, TimelineDomain, TimelineRow};

const CELL_WIDTH: usize = 16;
const TITLE_WIDTH: usize = 36;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, grid, now))]
    pub fn print_month(
        &self,
        grid: &MonthGrid,
        now: NaiveDateTime,
        limit: usize,
    ) -> anyhow::Result<()> {
        self.write_month(io::stdout().lock(), grid, now, limit)
    }

    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        grid: &MonthGrid,
        now: NaiveDateTime,
        limit: usize,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", month_title(grid.year(), grid.month()))?;
        writeln!(out)?;

        let headers = WEEKDAY_LABELS.iter().map(|l| l.to_string()).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for week in grid.weeks() {
            let labels: Vec<String> = week
                .iter()
                .map(|day| {
                    let label = if is_today(&day.date, now) {
                        format!("[{}]", day.date.day())
                    } else {
                        day.date.day().to_string()
                    };
                    if day.is_current_month {
                        label
                    } else {
                        self.paint(&label, "90")
                    }
                })
                .collect();
            rows.push(labels);

            let previews: Vec<_> = week.iter().map(|day| day.preview(limit)).collect();
            let depth = previews.iter().map(|p| p.shown.len()).max().unwrap_or(0);
            for line in 0..depth {
                rows.push(
                    previews
                        .iter()
                        .map(|p| {
                            p.shown
                                .get(line)
                                .map(|event| {
                                    self.paint(
                                        &truncate_to_width(&event.title, CELL_WIDTH),
                                        event.category.ansi_color(),
                                    )
                                })
                                .unwrap_or_default()
                        })
                        .collect(),
                );
            }

            if previews.iter().any(|p| p.hidden > 0) {
                rows.push(
                    previews
                        .iter()
                        .map(|p| {
                            if p.hidden > 0 {
                                format!("+{} plus", p.hidden)
                            } else {
                                String::new()
                            }
                        })
                        .collect(),
                );
            }
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_day(&self, date: NaiveDate, events: &[&Event]) -> anyhow::Result<()> {
        self.write_day(io::stdout().lock(), date, events)
    }

    pub fn write_day<W: Write>(
        &self,
        mut out: W,
        date: NaiveDate,
        events: &[&Event],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", format_long_date(date))?;
        writeln!(out)?;

        if events.is_empty() {
            writeln!(out, "Aucun événement prévu pour cette date")?;
            return Ok(());
        }

        for event in events {
            writeln!(out, "{}", event.title)?;
            writeln!(
                out,
                "  {} - {}",
                format_time(event.start),
                format_time(event.end)
            )?;
            writeln!(out, "  {} participants", event.participants)?;
            writeln!(
                out,
                "  {}",
                self.paint(
                    &format!("{} ({})", event.mission, event.category),
                    event.category.ansi_color()
                )
            )?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, timeline))]
    pub fn print_timeline(&self, timeline: &Timeline, width: usize) -> anyhow::Result<()> {
        self.write_timeline(io::stdout().lock(), timeline, width)
    }

    pub fn write_timeline<W: Write>(
        &self,
        mut out: W,
        timeline: &Timeline,
        width: usize,
    ) -> anyhow::Result<()> {
        writeln!(out, "Chronogramme des missions")?;

        let Some(domain) = timeline.domain else {
            writeln!(out)?;
            writeln!(out, "Aucune mission à afficher")?;
            return Ok(());
        };

        writeln!(
            out,
            "Du {} au {}",
            format_short_date(domain.min_start.date()),
            format_short_date(domain.max_end.date())
        )?;
        writeln!(out)?;

        let headers = vec![
            "Mission".to_string(),
            "Statut".to_string(),
            "Début".to_string(),
            "Fin".to_string(),
            "Durée".to_string(),
            "Progr.".to_string(),
            String::new(),
        ];

        let mut rows = Vec::with_capacity(timeline.rows.len());
        for row in &timeline.rows {
            let marker = if row.is_active { "●" } else { " " };
            rows.push(vec![
                format!("{marker} {}", truncate_to_width(&row.title, TITLE_WIDTH)),
                row.status.label().to_string(),
                format_short_date(row.start.date()),
                format_short_date(row.end.date()),
                format!("{} j", row.duration_days),
                format!("{}%", row.progress),
                self.paint_hex(
                    &timeline_bar(row, &domain, timeline.today, width),
                    &row.color,
                ),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        writeln!(out)?;
        writeln!(
            out,
            "Légende: {} {}  {} {}  {} {}  | Aujourd'hui",
            MissionStatus::Active.bar_glyph(),
            MissionStatus::Active.label(),
            MissionStatus::Completed.bar_glyph(),
            MissionStatus::Completed.label(),
            MissionStatus::Draft.bar_glyph(),
            MissionStatus::Draft.label(),
        )?;
        Ok(())
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn paint_hex(&self, text: &str, hex: &str) -> String {
        match parse_hex_color(hex) {
            Some((r, g, b)) => self.paint(text, &format!("38;2;{r};{g};{b}")),
            None => text.to_string(),
        }
    }
}

/// Text bar for one mission scaled to the timeline domain, with `|` at
/// today's position when it falls inside the domain.
pub fn timeline_bar(
    row: &TimelineRow,
    domain: &TimelineDomain,
    today: NaiveDateTime,
    width: usize,
) -> String {
    let column = |instant: NaiveDateTime| -> usize {
        let scaled = (domain.fraction(instant) * width as f64).round() as usize;
        scaled.min(width.saturating_sub(1))
    };

    let start = column(row.start);
    let end = column(row.end).max(start);
    let glyph = row.status.bar_glyph();

    let mut cells: Vec<char> = (0..width)
        .map(|idx| if idx >= start && idx <= end { glyph } else { ' ' })
        .collect();
    if domain.contains(today) && width > 0 {
        cells[column(today)] = '|';
    }
    cells.into_iter().collect()
}

fn parse_hex_color(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |idx: usize| u8::from_str_radix(hex.get(idx..idx + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn truncate_to_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(headers[idx].as_str()));
        write!(writer, "{}{} ", headers[idx], " ".repeat(padding))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{bind_events, events_on};
    use crate::sample;
    use crate::timeline::build_timeline;

    fn noon(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).expect("render");
        String::from_utf8(buf).expect("utf8 output")
    }

    #[test]
    fn month_view_marks_today_and_overflow_count() {
        let mut events = sample::events();
        for extra in 0..3 {
            let mut copy = events[0].clone();
            copy.id = format!("extra-{extra}");
            events.push(copy);
        }
        let grid = bind_events(MonthGrid::for_month(2024, 6).expect("grid"), &events);

        let text = render(|buf| Renderer::plain().write_month(buf, &grid, noon(6, 20), 3));
        assert!(text.starts_with("juin 2024\n"));
        assert!(text.contains("Lun"));
        assert!(text.contains("[20]"));
        assert!(text.contains("+1 plus"));
    }

    #[test]
    fn day_view_lists_events_or_placeholder() {
        let events = sample::events();
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        let picked = events_on(&events, date);
        let text = render(|buf| Renderer::plain().write_day(buf, date, &picked));
        assert!(text.starts_with("samedi 15 juin"));
        assert!(text.contains("10:00 - 11:30"));
        assert!(text.contains("6 participants"));

        let empty = render(|buf| Renderer::plain().write_day(buf, date.succ_opt().expect("next"), &[]));
        assert!(empty.contains("Aucun événement"));
    }

    #[test]
    fn timeline_view_handles_empty_and_full() {
        let empty = build_timeline(&[], noon(6, 20));
        let text = render(|buf| Renderer::plain().write_timeline(buf, &empty, 20));
        assert!(text.contains("Aucune mission"));

        let timeline = build_timeline(&sample::missions(), noon(6, 20));
        let text = render(|buf| Renderer::plain().write_timeline(buf, &timeline, 30));
        assert!(text.contains("Du 15 mai au 5 sept."));
        assert!(text.contains("35 j"));
        assert!(text.contains("Légende"));
    }

    #[test]
    fn bar_spans_mission_and_marks_today() {
        let timeline = build_timeline(&sample::missions(), noon(6, 20));
        let domain = timeline.domain.expect("domain");
        let bar = timeline_bar(&timeline.rows[3], &domain, noon(12, 1), 20);
        assert_eq!(bar.chars().count(), 20);
        assert!(bar.starts_with('█'));
        assert!(!bar.contains('|'));

        let with_today = timeline_bar(&timeline.rows[0], &domain, timeline.today, 20);
        assert!(with_today.contains('|'));
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("court", 10), "court");
        let cut = truncate_to_width("Réunion de lancement", 8);
        assert_eq!(UnicodeWidthStr::width(cut.as_str()), 8);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#3b82f6"), Some((0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex_color("blue"), None);
    }
}
