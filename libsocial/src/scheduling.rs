//! Time parsing for plan building and ingestion windows
//!
//! Dates accept ISO `YYYY-MM-DD` or natural language ("tomorrow",
//! "next monday"). Intervals accept a bare day count or a duration such as
//! `2d` / `48h`, which must come out to whole days.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SocialError};

const SECONDS_PER_DAY: u64 = 24 * 3600;

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim().parse::<Tz>().map_err(|_| {
        SocialError::InvalidInput(format!("Unknown timezone '{}'", name))
    })
}

/// Parse a wall-clock time, `HH:MM` or `HH:MM:SS`
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| {
            SocialError::InvalidInput(format!(
                "Invalid time '{}'. Expected HH:MM (24-hour)",
                input
            ))
        })
}

/// Parse a start date relative to `now` in `tz`
pub fn parse_start_date(input: &str, tz: Tz, now: DateTime<Utc>) -> Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SocialError::InvalidInput(
            "Start date cannot be empty".to_string(),
        ));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    chrono_english::parse_date_string(input, now.with_timezone(&tz), chrono_english::Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| SocialError::InvalidInput(format!("Could not parse date '{}': {}", input, e)))
}

/// The calendar day after `now`, in `tz`
pub fn tomorrow(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    let today = now.with_timezone(&tz).date_naive();
    today.succ_opt().unwrap_or(today)
}

/// Parse a whole number of days: `3`, `3d`, `72h`
pub fn parse_days(input: &str) -> Result<u32> {
    let input = input.trim();
    if let Ok(days) = input.parse::<u32>() {
        return Ok(days);
    }

    let duration = humantime::parse_duration(input).map_err(|e| {
        SocialError::InvalidInput(format!("Could not parse interval '{}': {}", input, e))
    })?;

    let secs = duration.as_secs();
    if secs % SECONDS_PER_DAY != 0 || duration.subsec_nanos() != 0 {
        return Err(SocialError::InvalidInput(format!(
            "Interval '{}' is not a whole number of days",
            input
        )));
    }

    u32::try_from(secs / SECONDS_PER_DAY)
        .map_err(|_| SocialError::InvalidInput(format!("Interval '{}' is too large", input)))
}

/// Pin a local date and time in `tz` to an absolute instant
///
/// Times inside a DST gap do not exist and are rejected. Times inside a DST
/// overlap resolve to the earlier instant.
pub fn localize(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<FixedOffset>> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => Err(SocialError::InvalidInput(format!(
            "{} does not exist in {} (daylight saving gap)",
            naive, tz
        ))),
    }
}

/// Parse an absolute send time: RFC 3339, or natural language read in `tz`
pub fn parse_datetime(input: &str, tz: Tz, now: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }

    chrono_english::parse_date_string(input, now.with_timezone(&tz), chrono_english::Dialect::Us)
        .map(|dt| dt.fixed_offset())
        .map_err(|e| {
            SocialError::InvalidInput(format!("Could not parse time '{}': {}", input, e))
        })
}

/// Advance a calendar date by whole days
pub fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    i64::try_from(days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|offset| date.checked_add_signed(offset))
        .ok_or_else(|| SocialError::InvalidInput("Schedule date out of range".to_string()))
}
