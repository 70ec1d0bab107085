//! Local calendar-date keys.
//!
//! Every entry is keyed by the calendar date as the user perceives it, not
//! by the UTC date — a journal written at 23:30 in New York must land on
//! that New York day even though UTC has already rolled over. Keys are
//! zero-padded `YYYY-MM-DD`, so lexicographic order on the key string
//! equals chronological order.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Resolve an IANA timezone name, falling back to UTC when the stored
/// string does not parse.
pub fn resolve_tz(timezone: &str) -> Tz {
    timezone.parse::<Tz>().unwrap_or(chrono_tz::UTC)
}

/// The local calendar date of `instant` in `timezone`.
pub fn local_date(instant: DateTime<Utc>, timezone: &str) -> NaiveDate {
    instant.with_timezone(&resolve_tz(timezone)).date_naive()
}

/// Today's date key in the user's timezone.
pub fn local_today(timezone: &str) -> NaiveDate {
    local_date(Utc::now(), timezone)
}

/// Canonical `YYYY-MM-DD` key for a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Canonical `YYYY-MM` prefix for a (year, month) pair.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_is_zero_padded() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(date_key(d), "2024-03-01");
        assert_eq!(month_key(2024, 3), "2024-03");
    }

    #[test]
    fn test_key_order_matches_date_order() {
        let a = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        assert!(date_key(a) < date_key(b));
    }

    #[test]
    fn test_local_date_behind_utc() {
        // 02:00 UTC on Mar 1 is still Feb 29 in Los Angeles (2024 is a leap year).
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(
            local_date(instant, "America/Los_Angeles"),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            local_date(instant, "UTC"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_local_date_ahead_of_utc() {
        // 13:00 UTC is already the next day in Auckland (UTC+13 in January).
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap();
        assert_eq!(
            local_date(instant, "Pacific/Auckland"),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }

    #[test]
    fn test_local_date_across_dst_spring_forward() {
        // US DST starts 2024-03-10 at 02:00 local; 06:30 UTC is 02:30 EDT.
        // The date must not shift across the transition.
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap();
        assert_eq!(
            local_date(instant, "America/New_York"),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn test_local_date_across_dst_fall_back() {
        // US DST ends 2024-11-03; 05:30 UTC falls in the repeated hour.
        let instant = Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap();
        assert_eq!(
            local_date(instant, "America/New_York"),
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap()
        );
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();
        assert_eq!(
            local_date(instant, "Not/AZone"),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }
}
