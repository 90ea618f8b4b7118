//! Time utilities: the user's calendar date in their own timezone.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

/// The calendar date it is for the user at `now`. Planning works on this
/// date only, never on a timestamp.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_differs_across_midnight() {
        // 03:30 UTC on Mar 2 is still the evening of Mar 1 in Chicago (CST, UTC-6)
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 3, 30, 0).unwrap();
        let chicago = parse_timezone("America/Chicago").unwrap();
        assert_eq!(today_in(chicago, now), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(today_in(Tz::UTC, now), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
