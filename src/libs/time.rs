use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::{Error, Result};

pub struct TimeFormat;

impl TimeFormat {
    pub const YYYYMMDD: &'static str = "%Y-%m-%d";
    pub const YYYYMMDD_HHMMSS: &'static str = "%Y-%m-%d %H:%M:%S";
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn now_millis() -> u64 {
    Local::now().timestamp_millis().max(0) as u64
}

pub fn format_datetime(time: &NaiveDateTime) -> String {
    time.format(TimeFormat::YYYYMMDD_HHMMSS).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(TimeFormat::YYYYMMDD).to_string()
}

pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TimeFormat::YYYYMMDD_HHMMSS)
        .map_err(|e| Error::Row(format!("bad datetime `{value}`: {e}")))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, TimeFormat::YYYYMMDD)
        .map_err(|e| Error::Row(format!("bad date `{value}`: {e}")))
}

/// Accepts the stored format, ISO-8601 from browsers (`2024-01-15T14:30`,
/// optional seconds, fraction and `Z`) or a bare date at midnight.
pub fn parse_loose(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    for fmt in [
        TimeFormat::YYYYMMDD_HHMMSS,
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(time) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(time);
        }
    }
    parse_date(value)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| Error::InvalidValue(format!("รูปแบบวันที่ไม่ถูกต้อง: {value}")))
}

/// Whole days left until `due`, rounded up. Negative once overdue.
pub fn days_until(due: &NaiveDate, now: &NaiveDateTime) -> i64 {
    let start = due.and_time(NaiveTime::MIN);
    let millis = (start - *now).num_milliseconds() as f64;
    (millis / 86_400_000.0).ceil() as i64
}

/// dd/mm/yyyy in the Buddhist era (+543).
pub fn thai_date(date: &NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year() + 543)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thai_date_uses_buddhist_era() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(thai_date(&date), "01/12/2567");
    }

    #[test]
    fn days_until_rounds_up() {
        let due = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let now = parse_datetime("2024-11-28 09:00:00").unwrap();
        assert_eq!(days_until(&due, &now), 3);
        let now = parse_datetime("2024-12-01 00:00:00").unwrap();
        assert_eq!(days_until(&due, &now), 0);
        let now = parse_datetime("2024-12-03 12:00:00").unwrap();
        assert_eq!(days_until(&due, &now), -2);
    }

    #[test]
    fn stored_datetime_reads_back() {
        let time = parse_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(format_datetime(&time), "2024-01-15 14:30:00");
        assert!(parse_date("15/01/2024").is_err());
    }

    #[test]
    fn loose_parsing_takes_browser_values() {
        let expected = parse_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(parse_loose("2024-01-15T14:30").unwrap(), expected);
        assert_eq!(parse_loose("2024-01-15T14:30:00.000Z").unwrap(), expected);
        assert_eq!(
            parse_loose("2024-01-15").unwrap(),
            parse_datetime("2024-01-15 00:00:00").unwrap()
        );
        assert!(parse_loose("yesterday").is_err());
    }
}
