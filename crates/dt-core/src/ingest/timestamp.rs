//! Timestamp parsing and placeholder-epoch normalisation.
//!
//! The source logs were anonymised by rewriting dates into year `0001`.
//! Months `0001-01 .. 0001-08` stand for `2019-10 .. 2020-05`; other year-1
//! dates are left as they are.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Last placeholder month that maps onto the real observation window.
const PLACEHOLDER_LAST_MONTH: u32 = 8;

/// Parse an `error_time` value.
pub fn parse_timestamp(raw: &str, remap_placeholder_epoch: bool) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    let parsed = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });

    match parsed {
        Some(ts) if remap_placeholder_epoch => remap_placeholder(ts),
        Some(ts) => Ok(ts),
        None => parse_placeholder_text(raw, remap_placeholder_epoch),
    }
}

/// Shift a year-1 placeholder date onto the observation window.
pub fn remap_placeholder(ts: NaiveDateTime) -> Result<NaiveDateTime, String> {
    if ts.year() != 1 || ts.month() > PLACEHOLDER_LAST_MONTH {
        return Ok(ts);
    }
    let (year, month) = shifted_month(ts.month());
    ts.with_day(1)
        .and_then(|t| t.with_year(year))
        .and_then(|t| t.with_month(month))
        .and_then(|t| t.with_day(ts.day()))
        .ok_or_else(|| {
            format!(
                "placeholder date 0001-{:02}-{:02} has no counterpart in {}-{:02}",
                ts.month(),
                ts.day(),
                year,
                month
            )
        })
}

fn shifted_month(month: u32) -> (i32, u32) {
    let total = (month - 1) + 9;
    (2019 + (total / 12) as i32, total % 12 + 1)
}

/// Year-1 text that only becomes a real date after the shift, such as
/// `0001-02-29` (year 1 is not a leap year; the result is `2019-11-29`).
fn parse_placeholder_text(raw: &str, remap: bool) -> Result<NaiveDateTime, String> {
    let invalid = || format!("error_time '{}' is not a recognised timestamp", raw);
    if !remap {
        return Err(invalid());
    }
    let rest = raw.strip_prefix("0001-").ok_or_else(invalid)?;
    let month: u32 = rest.get(..2).and_then(|m| m.parse().ok()).ok_or_else(invalid)?;
    if !(1..=PLACEHOLDER_LAST_MONTH).contains(&month) {
        return Err(invalid());
    }
    let (year, new_month) = shifted_month(month);
    let rewritten = format!("{}-{:02}{}", year, new_month, &rest[2..]);
    parse_timestamp(&rewritten, false).map_err(|_| invalid())
}
