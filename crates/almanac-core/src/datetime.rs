use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  NaiveTime
};
use regex::Regex;

use crate::error::{
  CalendarError,
  CalendarResult
};

pub const DAY_MILLIS: i64 = 86_400_000;

const DATETIME_FORMATS: [&str; 4] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M"
];

pub fn is_leap_year(year: i32) -> bool {
  (year.rem_euclid(4) == 0
    && year.rem_euclid(100) != 0)
    || year.rem_euclid(400) == 0
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> CalendarResult<u32> {
  match month {
    | 1 | 3 | 5 | 7 | 8 | 10 | 12 => {
      Ok(31)
    }
    | 4 | 6 | 9 | 11 => Ok(30),
    | 2 => {
      Ok(
        if is_leap_year(year) {
          29
        } else {
          28
        }
      )
    }
    | _ => {
      Err(CalendarError::InvalidMonth {
        year,
        month
      })
    }
  }
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> CalendarResult<NaiveDate> {
  if !(1..=12).contains(&month) {
    return Err(
      CalendarError::InvalidMonth {
        year,
        month
      }
    );
  }
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .ok_or_else(|| {
    CalendarError::OutOfRange(format!(
      "{year:04}-{month:02}-01"
    ))
  })
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> CalendarResult<NaiveDate> {
  Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .ok_or_else(|| {
      CalendarError::OutOfRange(format!(
        "{date} {days:+} days"
      ))
    })
}

/// Moves `date` by whole months, clamping the day to the target month's
/// length (Jan 31 + 1 month is Feb 28 or 29).
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> CalendarResult<NaiveDate> {
  let total = i64::from(date.year())
    * 12
    + i64::from(date.month0())
    + i64::from(months);
  let year =
    i32::try_from(total.div_euclid(12))
      .map_err(|_| {
        CalendarError::OutOfRange(
          format!(
            "{date} {months:+} months"
          )
        )
      })?;
  let month =
    total.rem_euclid(12) as u32 + 1;
  let day = date
    .day()
    .min(days_in_month(year, month)?);
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .ok_or_else(|| {
    CalendarError::OutOfRange(format!(
      "{date} {months:+} months"
    ))
  })
}

/// Parses a local date-time in one of the accepted wire forms. A bare
/// `YYYY-MM-DD` means midnight.
pub fn parse_local_datetime(
  raw: &str
) -> CalendarResult<NaiveDateTime> {
  let token = raw.trim();
  for format in DATETIME_FORMATS {
    if let Ok(parsed) =
      NaiveDateTime::parse_from_str(
        token, format
      )
    {
      return Ok(parsed);
    }
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .map(|date| {
    date.and_time(NaiveTime::MIN)
  })
  .map_err(|_| {
    CalendarError::InvalidDate(
      token.to_string()
    )
  })
}

/// Resolves a user-supplied reference date against `now`.
#[tracing::instrument(skip(now))]
pub fn parse_reference_expr(
  input: &str,
  now: NaiveDateTime
) -> anyhow::Result<NaiveDateTime> {
  let token = input.trim();
  let lower =
    token.to_lowercase();
  let today =
    now.date().and_time(NaiveTime::MIN);

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" | "aujourd'hui" => {
      return Ok(today)
    }
    | "tomorrow" | "demain" => {
      return Ok(
        add_days(today.date(), 1)?
          .and_time(NaiveTime::MIN)
      );
    }
    | "yesterday" | "hier" => {
      return Ok(
        add_days(today.date(), -1)?
          .and_time(NaiveTime::MIN)
      );
    }
    | _ => {}
  }

  if token.len() == 4
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let year: i32 =
      token.parse().context(
        "invalid 4-digit year"
      )?;
    let date =
      first_day_of_month(year, 1)?;
    return Ok(
      date.and_time(NaiveTime::MIN)
    );
  }

  if let Some(target_month) =
    parse_month_name(&lower)
  {
    let date = first_day_of_month(
      now.year(),
      target_month
    )?;
    return Ok(
      date.and_time(NaiveTime::MIN)
    );
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;
    let signed =
      if sign == "-" { -num } else { num };

    let date = match unit {
      | "d" => {
        add_days(today.date(), signed)?
      }
      | "w" => {
        add_days(
          today.date(),
          signed.saturating_mul(7)
        )?
      }
      | "m" => {
        let months =
          i32::try_from(signed)
            .context(
              "relative month offset \
               too large"
            )?;
        shift_months(
          today.date(),
          months
        )?
      }
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    };
    return Ok(
      date.and_time(NaiveTime::MIN)
    );
  }

  let month_re =
    Regex::new(r"^(?P<year>\d{4})-(?P<month>\d{1,2})$")
      .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
  if let Some(caps) =
    month_re.captures(token)
  {
    let year: i32 = caps["year"]
      .parse()
      .context("invalid year")?;
    let month: u32 = caps["month"]
      .parse()
      .context("invalid month")?;
    let date =
      first_day_of_month(year, month)?;
    return Ok(
      date.and_time(NaiveTime::MIN)
    );
  }

  if let Ok(parsed) =
    parse_local_datetime(token)
  {
    return Ok(parsed);
  }

  Err(anyhow!(
    "unrecognized date expression \
     '{token}'. Supported: now, \
     today, tomorrow, yesterday, \
     YYYY, month names (e.g. june \
     or juin), +Nd/+Nw/+Nm, \
     YYYY-MM, YYYY-MM-DD, \
     YYYY-MM-DDTHH:MM[:SS]"
  ))
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" | "janvier"
    | "janv" => Some(1),
    | "february" | "feb"
    | "février" | "fevrier"
    | "févr" => Some(2),
    | "march" | "mar" | "mars" => {
      Some(3)
    }
    | "april" | "apr" | "avril"
    | "avr" => Some(4),
    | "may" | "mai" => Some(5),
    | "june" | "jun" | "juin" => {
      Some(6)
    }
    | "july" | "jul" | "juillet"
    | "juil" => Some(7),
    | "august" | "aug" | "août"
    | "aout" => Some(8),
    | "september" | "sep" | "sept"
    | "septembre" => Some(9),
    | "october" | "oct"
    | "octobre" => Some(10),
    | "november" | "nov"
    | "novembre" => Some(11),
    | "december" | "dec"
    | "décembre" | "decembre"
    | "déc" => Some(12),
    | _ => None
  }
}

pub mod local_datetime_serde {
  use chrono::NaiveDateTime;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    dt: &NaiveDateTime,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &dt
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDateTime, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_local_datetime(&raw)
      .map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(
      2024, 6, 20
    )
    .expect("valid date")
    .and_hms_opt(14, 30, 0)
    .expect("valid time")
  }

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn month_lengths_follow_leap_rules() {
    assert_eq!(
      days_in_month(2024, 2),
      Ok(29)
    );
    assert_eq!(
      days_in_month(2023, 2),
      Ok(28)
    );
    assert_eq!(
      days_in_month(1900, 2),
      Ok(28)
    );
    assert_eq!(
      days_in_month(2000, 2),
      Ok(29)
    );
    assert_eq!(
      days_in_month(2024, 4),
      Ok(30)
    );
    assert_eq!(
      days_in_month(2024, 13),
      Err(CalendarError::InvalidMonth {
        year:  2024,
        month: 13
      })
    );
  }

  #[test]
  fn shift_months_clamps_day_and_crosses_years() {
    assert_eq!(
      shift_months(ymd(2024, 1, 31), 1)
        .expect("shift"),
      ymd(2024, 2, 29)
    );
    assert_eq!(
      shift_months(ymd(2024, 1, 15), -1)
        .expect("shift"),
      ymd(2023, 12, 15)
    );
    assert_eq!(
      shift_months(ymd(2024, 11, 30), 14)
        .expect("shift"),
      ymd(2026, 1, 30)
    );
  }

  #[test]
  fn shift_months_reports_out_of_range() {
    assert!(matches!(
      shift_months(NaiveDate::MAX, 1),
      Err(CalendarError::OutOfRange(_))
    ));
  }

  #[test]
  fn parses_bare_date_as_midnight() {
    let parsed =
      parse_local_datetime("2024-06-10")
        .expect("parse date");
    assert_eq!(
      parsed,
      ymd(2024, 6, 10)
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
    );
  }

  #[test]
  fn parses_datetime_with_and_without_seconds() {
    let a = parse_local_datetime(
      "2024-06-15T10:00"
    )
    .expect("parse minutes");
    let b = parse_local_datetime(
      "2024-06-15 10:00:00"
    )
    .expect("parse seconds");
    assert_eq!(a, b);
  }

  #[test]
  fn rejects_garbage_dates() {
    assert_eq!(
      parse_local_datetime(
        "2024-02-30"
      ),
      Err(CalendarError::InvalidDate(
        "2024-02-30".to_string()
      ))
    );
  }

  #[test]
  fn reference_today_is_midnight() {
    let parsed =
      parse_reference_expr("today", now())
        .expect("parse today");
    assert_eq!(
      parsed,
      ymd(2024, 6, 20)
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
    );
  }

  #[test]
  fn reference_year_month_is_first_of_month() {
    let parsed =
      parse_reference_expr("2025-02", now())
        .expect("parse year-month");
    assert_eq!(
      parsed.date(),
      ymd(2025, 2, 1)
    );
  }

  #[test]
  fn reference_month_name_uses_current_year() {
    let parsed =
      parse_reference_expr("juillet", now())
        .expect("parse french month");
    assert_eq!(
      parsed.date(),
      ymd(2024, 7, 1)
    );
  }

  #[test]
  fn reference_relative_months() {
    let parsed =
      parse_reference_expr("-7m", now())
        .expect("parse relative months");
    assert_eq!(
      parsed.date(),
      ymd(2023, 11, 20)
    );
    let parsed =
      parse_reference_expr("+2w", now())
        .expect("parse relative weeks");
    assert_eq!(
      parsed.date(),
      ymd(2024, 7, 4)
    );
  }

  #[test]
  fn reference_rejects_unknown_tokens() {
    assert!(
      parse_reference_expr("soon", now())
        .is_err()
    );
  }
}
