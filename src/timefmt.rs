use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::errors::CoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` string into epoch
/// seconds (UTC). Date-only strings resolve to midnight.
pub fn parse_timestamp(input: &str) -> Result<i64, CoreError> {
    let input = input.trim();
    let parsed = if input.contains(' ') {
        NaiveDateTime::parse_from_str(input, DATETIME_FORMAT)
    } else {
        NaiveDate::parse_from_str(input, DATE_FORMAT).map(|d| d.and_time(NaiveTime::MIN))
    };
    let dt = parsed.map_err(|_| {
        CoreError::InvalidInput(format!(
            "'{}' is not a valid date; expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
            input
        ))
    })?;
    Ok(dt.and_utc().timestamp())
}

/// Formats epoch seconds back into the wire format. Timestamps outside
/// chrono's representable range render as an empty string.
pub fn format_timestamp(epoch_secs: i64, include_time: bool) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_secs, 0) {
        Some(dt) if include_time => dt.format(DATETIME_FORMAT).to_string(),
        Some(dt) => dt.format(DATE_FORMAT).to_string(),
        None => String::new(),
    }
}

pub fn format_date(epoch_secs: i64) -> String {
    format_timestamp(epoch_secs, false)
}

pub fn format_datetime(epoch_secs: i64) -> String {
    format_timestamp(epoch_secs, true)
}
