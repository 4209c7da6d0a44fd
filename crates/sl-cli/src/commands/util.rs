//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(hour|day|week)s?\s+ago$").unwrap());

/// Upper bound for relative times (~100 years in hours).
const MAX_RELATIVE_HOURS: i64 = 100 * 365 * 24;

/// Parse a point in time given as ISO 8601, a plain date, or a relative time.
///
/// Supports:
/// - ISO 8601: "2025-01-15T10:30:00Z"
/// - Date: "2025-01-15" (midnight UTC)
/// - Relative: "12 hours ago", "30 days ago", "2 weeks ago", counted back
///   from `now`
pub fn parse_datetime_at(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use ISO 8601 (e.g., 2025-01-15T10:30:00Z), a date (2025-01-15) or relative (e.g., '30 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let hours_per_unit = match &caps[2] {
        "hour" => 1,
        "day" => 24,
        "week" => 24 * 7,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > MAX_RELATIVE_HOURS / hours_per_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::hours(n * hours_per_unit))
}

/// Formats fractional hours as `7h 05m`.
#[allow(clippy::cast_possible_truncation)]
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_datetime_at("2025-01-15T10:30:00+02:00", now()).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_datetime_at("2025-01-15", now()).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_relative() {
        assert_eq!(
            parse_datetime_at("30 days ago", now()).unwrap(),
            now() - Duration::days(30)
        );
        assert_eq!(
            parse_datetime_at("1 week ago", now()).unwrap(),
            now() - Duration::weeks(1)
        );
        assert_eq!(
            parse_datetime_at("6 hours ago", now()).unwrap(),
            now() - Duration::hours(6)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime_at("yesterday", now()).is_err());
        assert!(parse_datetime_at("5 fortnights ago", now()).is_err());
        assert!(parse_datetime_at("99999999 weeks ago", now()).is_err());
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(8.0), "8h 00m");
        assert_eq!(format_hours(7.5), "7h 30m");
        assert_eq!(format_hours(4.0 + 5.0 / 60.0), "4h 05m");
        assert_eq!(format_hours(0.0), "0h 00m");
    }
}
