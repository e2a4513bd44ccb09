//! Timestamp parsing and microsecond conversions.
//!
//! Every instant in the store is an `i64` count of microseconds since the
//! Unix epoch (the `*_us` columns). Inputs arrive as ISO-8601 dates
//! (`2024-03-01`, read as midnight UTC) or RFC 3339 timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{ErrorCode, LeafError, Result};

/// Microseconds in one hour.
pub const HOUR_US: i64 = 3_600_000_000;

/// Microseconds in one day.
pub const DAY_US: i64 = 24 * HOUR_US;

/// Length of the trailing "this week" dashboard window: 168 hours.
pub const WEEK_US: i64 = 7 * DAY_US;

/// Lower bound for history queries when the caller gives none.
pub const DEFAULT_HISTORY_FROM: &str = "2024-01-01";

/// Parse an ISO-8601 date or RFC 3339 timestamp into a UTC instant.
///
/// Accepted forms:
/// - `2024-03-01` (midnight UTC)
/// - `2024-03-01T08:30:00` / `2024-03-01 08:30:00` (naive, read as UTC)
/// - `2024-03-01T08:30:00Z`, `2024-03-01T08:30:00+02:00`
///
/// # Errors
///
/// Returns [`LeafError::Validation`] with [`ErrorCode::InvalidTimestamp`]
/// when the input matches none of the forms.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }

    Err(LeafError::validation(
        ErrorCode::InvalidTimestamp,
        format!("cannot parse '{raw}' as an ISO-8601 date or timestamp"),
    ))
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns [`ErrorCode::InvalidTimestamp`] when the input is not a date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        LeafError::validation(
            ErrorCode::InvalidTimestamp,
            format!("cannot parse '{}' as a YYYY-MM-DD date: {e}", raw.trim()),
        )
    })
}

/// Midnight UTC on `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// The fixed default lower bound for history queries.
#[must_use]
pub fn default_history_from() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 1, 1).map_or(DateTime::<Utc>::MIN_UTC, start_of_day)
}

/// Convert a UTC instant to store microseconds.
#[must_use]
pub fn to_us(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Convert store microseconds back into a UTC instant.
///
/// Out-of-range values clamp to the representable extremes rather than
/// failing; they can only appear through hand-edited rows.
#[must_use]
pub fn from_us(us: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(us).unwrap_or(if us < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Start of a trailing window of `days` days ending at `now_us`.
///
/// Saturates instead of overflowing for absurd day counts.
#[must_use]
pub const fn window_start_us(now_us: i64, days: i64) -> i64 {
    now_us.saturating_sub(days.saturating_mul(DAY_US))
}
