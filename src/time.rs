//! Epoch-millisecond helpers and human date parsing.

use crate::error::RoboError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M%p",
    "%d %B %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%d %B %Y", "%Y/%m/%d"];

/// Current UTC time in milliseconds since the UNIX epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse a human-readable date into UTC epoch milliseconds.
///
/// Naive inputs (no offset) are taken as UTC. Up to four bare digits are a
/// year ("2020" is 2020-01-01); a longer integer is milliseconds already.
pub fn date_to_ms(date: &str) -> Result<i64, RoboError> {
    let input = date.trim();
    if input.is_empty() {
        return Err(RoboError::config("empty date string"));
    }

    if input.len() <= 4 && input.bytes().all(|b| b.is_ascii_digit()) {
        return year_to_ms(input);
    }
    if let Ok(ms) = input.parse::<i64>() {
        return Ok(ms);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp_millis());
    }

    let normalized = expand_bare_hour(input);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(input, fmt) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    Err(RoboError::config(format!("unrecognized date '{}'", input)))
}

fn year_to_ms(input: &str) -> Result<i64, RoboError> {
    input
        .parse::<i32>()
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| RoboError::config(format!("invalid year '{}'", input)))
}

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC) for log output.
pub fn format_ms(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

// "May 10, 2020 7pm" -> "May 10, 2020 7:00pm"
fn expand_bare_hour(input: &str) -> String {
    let Some((head, last)) = input.rsplit_once(' ') else {
        return input.to_string();
    };
    let lower = last.to_ascii_lowercase();
    let is_meridiem = lower.ends_with("am") || lower.ends_with("pm");
    if !is_meridiem || last.contains(':') || last.len() <= 2 {
        return input.to_string();
    }
    let (hour, suffix) = last.split_at(last.len() - 2);
    format!("{} {}:00{}", head, hour, suffix)
}
