//! Parsing of calendar dates and clock times received from clients and from
//! the model.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use dayplan_db::models::hhmm;

/// Canonical wire format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A date string that is neither `YYYY-MM-DD` nor a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date format. Use YYYY-MM-DD")]
pub struct DateParseError {
    pub input: String,
}

/// A time string that is not `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid time {input:?}. Use HH:MM")]
pub struct TimeParseError {
    pub input: String,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM[:SS]` timestamps. Any time-of-day is discarded, so the
/// result is the day the timestamp was written in.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|ts| ts.date())
        .ok_or_else(|| DateParseError {
            input: input.to_owned(),
        })
}

/// Parse a wall-clock time given as `HH:MM` (seconds tolerated).
pub fn parse_time(input: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeParseError {
            input: input.to_owned(),
        })
}

/// Like [`parse_time`], but also takes the time-of-day out of a full
/// timestamp. Models asked for `HH:MM` sometimes answer with ISO 8601.
///
/// Shares its rules with the `hhmm` serde format used by stored plans.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime, TimeParseError> {
    hhmm::parse(input).ok_or_else(|| TimeParseError {
        input: input.to_owned(),
    })
}
