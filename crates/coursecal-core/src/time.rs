//! Time helpers for the calendar wire format.
//!
//! Every instant in this crate is a `DateTime<Utc>`. This module provides:
//! - [`format_timestamp`] / [`parse_timestamp`] for the `YYYYMMDDTHHMMSSZ` token
//! - [`dst_window`] / [`is_within_dst`] for the fixed-rule daylight saving window
//!   (second Sunday of March 02:00 to first Sunday of November 02:00)
//! - [`shift_zone_base`] for re-basing wall-clock instants between fixed offsets

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use regex::Regex;

use crate::error::{CalendarError, CalendarResult};

/// Number of milliseconds in one week.
pub const MILLIS_PER_WEEK: i64 = 7 * 24 * 60 * 60 * 1000;

/// The strftime pattern of an exported timestamp token.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date, optional `THHMMSS`, optional `Z`.
static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{8})(?:T(\d{6})(Z)?)?$").expect("Invalid timestamp regex")
});

/// Formats an instant as a UTC wire timestamp (`YYYYMMDDTHHMMSSZ`).
pub fn format_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a wire timestamp, reading naive values as UTC.
///
/// Accepts `YYYYMMDD`, `YYYYMMDDTHHMMSS` and `YYYYMMDDTHHMMSSZ`. A missing
/// time of day means midnight.
pub fn parse_timestamp(token: &str) -> CalendarResult<DateTime<Utc>> {
    parse_timestamp_in(token, &Utc)
}

/// Parses a wire timestamp, reading naive values as wall-clock time in `zone`.
///
/// Tokens carrying the `Z` suffix are always UTC, whatever `zone` is.
pub fn parse_timestamp_in<Tz: TimeZone>(token: &str, zone: &Tz) -> CalendarResult<DateTime<Utc>> {
    let caps = TIMESTAMP_REGEX.captures(token).ok_or_else(|| {
        CalendarError::timestamp(token, "expected YYYYMMDD with optional THHMMSS[Z]")
    })?;

    let date = NaiveDate::parse_from_str(&caps[1], "%Y%m%d")
        .map_err(|_| CalendarError::timestamp(token, "invalid calendar date"))?;
    let naive = match caps.get(2) {
        Some(m) => NaiveTime::parse_from_str(m.as_str(), "%H%M%S")
            .map(|time| date.and_time(time))
            .map_err(|_| CalendarError::timestamp(token, "invalid time of day"))?,
        None => date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| CalendarError::timestamp(token, "invalid calendar date"))?,
    };

    if caps.get(3).is_some() {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| CalendarError::timestamp(token, "local time does not exist in zone"))
}

/// Returns the daylight saving window of `year` as wall-clock bounds.
///
/// The window opens on the second Sunday of March at 02:00 and closes on
/// the first Sunday of November at 02:00.
pub fn dst_window(year: i32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let two_am = NaiveTime::from_hms_opt(2, 0, 0)?;
    let start = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)?;
    let end = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)?;
    Some((start.and_time(two_am), end.and_time(two_am)))
}

/// Checks whether an instant falls within the daylight saving window of its year.
///
/// The instant's own wall-clock time is compared against `[start, end)`.
pub fn is_within_dst<Tz: TimeZone>(instant: &DateTime<Tz>) -> bool {
    let local = instant.naive_local();
    match dst_window(local.year()) {
        Some((start, end)) => start <= local && local < end,
        None => false,
    }
}

/// Moves an instant forward one hour if it lies within the DST window.
///
/// Converts DST-observing wall clock to a zone without DST.
pub fn fix_dst(instant: DateTime<Utc>) -> DateTime<Utc> {
    if is_within_dst(&instant) {
        instant + Duration::hours(1)
    } else {
        instant
    }
}

/// Moves an instant back one hour if it lies within the DST window.
pub fn set_dst(instant: DateTime<Utc>) -> DateTime<Utc> {
    if is_within_dst(&instant) {
        instant - Duration::hours(1)
    } else {
        instant
    }
}

/// Re-bases a wall-clock instant from one fixed offset onto another.
///
/// Adds `source_offset_millis - dest_offset_millis` milliseconds.
pub fn shift_zone_base(
    instant: DateTime<Utc>,
    source_offset_millis: i64,
    dest_offset_millis: i64,
) -> DateTime<Utc> {
    instant + Duration::milliseconds(source_offset_millis - dest_offset_millis)
}

/// Returns the position of an instant within its epoch-aligned week, in milliseconds.
pub fn week_residue(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp_millis().rem_euclid(MILLIS_PER_WEEK)
}
