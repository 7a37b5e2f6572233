use anyhow::{Context, anyhow};
use chrono::NaiveDateTime;
use tracing::{debug, info, instrument, warn};

use crate::binder::{bind_events, events_on};
use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::parse_reference_expr;
use crate::grid::{MonthGrid, shift_month};
use crate::render::Renderer;
use crate::source::DataSource;
use crate::timeline::build_timeline;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "month", "next", "prev", "day", "timeline", "export", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Runs one command. `now` has already been sampled (or pinned with
/// `--today`) and is shared by every builder the command calls.
#[instrument(skip(source, cfg, renderer, inv))]
pub fn dispatch(
    source: &DataSource,
    cfg: &Config,
    renderer: &Renderer,
    inv: Invocation,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "month" => cmd_month(source, cfg, renderer, &inv.command_args, now, 0),
        "next" => cmd_month(source, cfg, renderer, &inv.command_args, now, 1),
        "prev" => cmd_month(source, cfg, renderer, &inv.command_args, now, -1),
        "day" => cmd_day(source, renderer, &inv.command_args, now),
        "timeline" => cmd_timeline(source, cfg, renderer, now),
        "export" => cmd_export(source, renderer, &inv.command_args, now),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Reference date from the first argument, defaulting to `now`.
fn resolve_reference(args: &[String], now: NaiveDateTime) -> anyhow::Result<NaiveDateTime> {
    if args.len() > 1 {
        warn!(extra = ?&args[1..], "ignoring extra arguments");
    }
    match args.first() {
        Some(expr) => parse_reference_expr(expr, now)
            .with_context(|| format!("invalid reference date '{expr}'")),
        None => Ok(now),
    }
}

fn month_grid(
    source: &DataSource,
    args: &[String],
    now: NaiveDateTime,
    shift: i32,
) -> anyhow::Result<MonthGrid> {
    let reference = resolve_reference(args, now)?;
    let target = shift_month(reference.date(), shift)?;
    let grid = MonthGrid::build(target)?;
    Ok(bind_events(grid, &source.events))
}

#[instrument(skip(source, cfg, renderer, args, now))]
fn cmd_month(
    source: &DataSource,
    cfg: &Config,
    renderer: &Renderer,
    args: &[String],
    now: NaiveDateTime,
    shift: i32,
) -> anyhow::Result<()> {
    info!("command month");
    let grid = month_grid(source, args, now, shift)?;
    renderer.print_month(&grid, now, cfg.display_limit()?)
}

#[instrument(skip(source, renderer, args, now))]
fn cmd_day(
    source: &DataSource,
    renderer: &Renderer,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command day");
    let date = resolve_reference(args, now)?.date();
    let events = events_on(&source.events, date);
    debug!(%date, count = events.len(), "selected day events");
    renderer.print_day(date, &events)
}

#[instrument(skip(source, cfg, renderer, now))]
fn cmd_timeline(
    source: &DataSource,
    cfg: &Config,
    renderer: &Renderer,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command timeline");
    let timeline = build_timeline(&source.missions, now);
    if timeline.domain.is_none() {
        warn!("no missions loaded; timeline has no domain");
    }
    renderer.print_timeline(&timeline, cfg.timeline_width()?)
}

#[instrument(skip(source, renderer, args, now))]
fn cmd_export(
    source: &DataSource,
    renderer: &Renderer,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command export");
    let Some((subject, rest)) = args.split_first() else {
        return Err(anyhow!("export requires a subject: month or timeline"));
    };

    match expand_command_abbrev(subject.as_str(), &["month", "timeline"]) {
        Some("month") => renderer.print_json(&month_grid(source, rest, now, 0)?),
        Some("timeline") => renderer.print_json(&build_timeline(&source.missions, now)),
        _ => Err(anyhow!(
            "unknown export subject: {subject} (expected month or timeline)"
        )),
    }
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "\
usage: almanac [OPTIONS] [COMMAND] [ARGS]

commands:
  month [REF]          month grid containing REF (default: today)
  next [REF]           month after REF
  prev [REF]           month before REF
  day [DATE]           events on DATE
  timeline             mission timeline with today's position
  export month [REF]   month grid as JSON
  export timeline      timeline rows and domain as JSON
  help                 this text
  version              print version

REF/DATE: today, tomorrow, yesterday, YYYY, YYYY-MM, YYYY-MM-DD,
          month names (june, juin), +Nd, -Nw, +Nm

options: -v/-q, --rc KEY=VALUE, --almanacrc PATH, --data DIR,
         --today REF, --sample"
    );
    Ok(())
}
