//! Parsing of caller-supplied date bounds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Which end of a range a date-only bound should snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parse a date bound.
///
/// Accepts RFC 3339 (`2025-01-31T12:00:00Z`), a naive date-time taken as UTC
/// (`2025-01-31T12:00:00`), or a plain date (`2025-01-31`). A plain date covers
/// the whole day: it becomes midnight for [`DateBound::Start`] and the last
/// microsecond of the day for [`DateBound::End`].
pub fn parse_date_bound(input: &str, bound: DateBound) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
    let time = match bound {
        DateBound::Start => NaiveTime::from_hms_opt(0, 0, 0)?,
        DateBound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?,
    };
    Some(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse_date_bound("2025-01-31T12:00:00+02:00", DateBound::Start);
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2025, 1, 31, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_naive_datetime_is_utc() {
        let parsed = parse_date_bound("2025-01-31T12:00:00", DateBound::End);
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_plain_date_covers_the_day() {
        let start = parse_date_bound("2025-01-31", DateBound::Start).unwrap();
        let end = parse_date_bound(" 2025-01-31 ", DateBound::End).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(parse_date_bound("last tuesday", DateBound::Start), None);
        assert_eq!(parse_date_bound("", DateBound::End), None);
    }
}
