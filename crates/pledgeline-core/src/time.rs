use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

pub const DAY_SECONDS: i64 = 86_400;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("timestamp cannot be empty")]
    Empty,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid datetime format: expected YYYY-MM-DD, YYYY-MM-DD HH:MM or MM/DD/YYYY")]
    InvalidDateTime,
    #[error("ambiguous local time: {0}")]
    AmbiguousLocalTime(String),
}

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

pub fn add_days(timestamp: i64, days: i32) -> i64 {
    timestamp.saturating_add(i64::from(days).saturating_mul(DAY_SECONDS))
}

pub fn parse_local_timestamp(input: &str) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return local_date_to_timestamp(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return local_to_utc_timestamp(dt);
        }
    }

    Err(TimeParseError::InvalidDateTime)
}

/// Local midnight of `date` as a UTC timestamp.
pub fn local_date_to_timestamp(date: NaiveDate) -> Result<i64, TimeParseError> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).ok_or(TimeParseError::InvalidDate)?;
    local_to_utc_timestamp(date.and_time(midnight))
}

pub fn format_timestamp_date(ts: i64) -> String {
    to_local(ts).format("%Y-%m-%d").to_string()
}

pub fn format_timestamp_datetime(ts: i64) -> String {
    to_local(ts).format("%Y-%m-%d %H:%M").to_string()
}

fn to_local(ts: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .with_timezone(&Local)
}

fn local_to_utc_timestamp(naive: NaiveDateTime) -> Result<i64, TimeParseError> {
    let local = Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TimeParseError::AmbiguousLocalTime(naive.to_string()))?;
    Ok(local.with_timezone(&Utc).timestamp())
}

#[cfg(test)]
mod tests {
    use super::{
        add_days, format_timestamp_date, format_timestamp_datetime, parse_local_timestamp,
        TimeParseError, DAY_SECONDS,
    };
    use chrono::{Local, TimeZone, Utc};

    #[test]
    fn parse_accepts_iso_and_us_dates() {
        let iso = parse_local_timestamp("2030-01-15").unwrap();
        let us = parse_local_timestamp("01/15/2030").unwrap();
        assert_eq!(iso, us);
        let local = Utc.timestamp_opt(iso, 0).unwrap().with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d").to_string(), "2030-01-15");
    }

    #[test]
    fn parse_accepts_datetime() {
        let ts = parse_local_timestamp("2030-01-15 13:45").unwrap();
        assert_eq!(format_timestamp_datetime(ts), "2030-01-15 13:45");
    }

    #[test]
    fn parse_rejects_empty_and_garbage() {
        assert!(matches!(
            parse_local_timestamp(" ").unwrap_err(),
            TimeParseError::Empty
        ));
        assert!(matches!(
            parse_local_timestamp("soon").unwrap_err(),
            TimeParseError::InvalidDateTime
        ));
    }

    #[test]
    fn add_days_counts_whole_days() {
        assert_eq!(add_days(1_000, 30), 1_000 + 30 * DAY_SECONDS);
    }

    #[test]
    fn format_date_matches_local_time() {
        let local = Local.with_ymd_and_hms(2030, 1, 15, 13, 45, 0).unwrap();
        let ts = local.with_timezone(&Utc).timestamp();
        assert_eq!(format_timestamp_date(ts), "2030-01-15");
    }
}
