pub mod binder;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datekey;
pub mod datetime;
pub mod error;
pub mod format;
pub mod grid;
pub mod model;
pub mod render;
pub mod sample;
pub mod source;
pub mod timeline;

use std::ffi::OsString;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tracing::{debug, info};

pub use binder::{DayPreview, bind_events, events_on};
pub use datekey::{DateKey, is_today, same_day};
pub use error::{CalendarError, CalendarResult};
pub use grid::{CalendarDay, MonthGrid, shift_month};
pub use model::{Event, EventCategory, Mission, MissionStatus};
pub use timeline::{Timeline, TimelineDomain, TimelineRow, build_timeline, duration_days};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac CLI"
  );
  debug!(
    overrides = ?pre.rc_overrides,
    "preprocessed rc overrides"
  );

  let mut cfg = config::Config::load(
    cli.almanacrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let now = sample_now(
    cli.today.as_deref()
  )?;

  let source = if cli.sample
    || cfg
      .get_bool("data.sample")
      .unwrap_or(false)
  {
    source::DataSource::sample()
  } else {
    let data_dir =
      config::resolve_data_dir(
        &cfg,
        cli.data.as_deref()
      )
      .context(
        "failed to resolve data \
         directory"
      )?;
    source::DataSource::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open data at {}",
          data_dir.display()
        )
      })?
  };

  let renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &source, &cfg, &renderer, inv, now
  )?;

  info!("done");
  Ok(())
}

/// Reads the wall clock once; `--today` pins it instead.
fn sample_now(
  pinned: Option<&str>
) -> anyhow::Result<NaiveDateTime> {
  let wall = Local::now().naive_local();
  match pinned {
    | Some(expr) => {
      let now = datetime::parse_reference_expr(expr, wall)
        .with_context(|| {
          format!(
            "invalid --today value \
             '{expr}'"
          )
        })?;
      debug!(%now, "using pinned today");
      Ok(now)
    }
    | None => Ok(wall)
  }
}
