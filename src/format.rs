//! Display formatting for durations and timestamps.

use chrono::{DateTime, Local, Utc};

/// Format a duration in seconds as a compact human-readable string.
///
/// `45 -> "45s"`, `125 -> "2m 5s"`, `120 -> "2m"`, `3661 -> "1h 1m"`,
/// `3600 -> "1h"`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    if seconds < 3600 {
        let mins = seconds / 60;
        let secs = seconds % 60;
        return if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        };
    }
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    if mins > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}h", hours)
    }
}

/// Format an accumulated total as hours and minutes, both always shown.
pub fn format_total_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    format!("{}h {}m", hours, mins)
}

/// Format a timestamp relative to `now`.
///
/// Under a minute reads "Just now"; under an hour/day/week it shortens to
/// `Nm ago` / `Nh ago` / `Nd ago`; anything older falls back to the local
/// calendar date.
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - timestamp).num_seconds();

    if diff < 60 {
        return "Just now".to_string();
    }
    if diff < 3600 {
        return format!("{}m ago", diff / 60);
    }
    if diff < 86_400 {
        return format!("{}h ago", diff / 3600);
    }
    if diff < 604_800 {
        return format!("{}d ago", diff / 86_400);
    }
    format_local_date(timestamp)
}

/// Local calendar date, unpadded `M/D/YYYY`.
pub fn format_local_date(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%-m/%-d/%Y")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(120), "2m");
        assert_eq!(format_duration(125), "2m 5s");
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(3661), "1h 1m");
    }

    #[test]
    fn test_format_total_time_always_shows_minutes() {
        assert_eq!(format_total_time(3600), "1h 0m");
        assert_eq!(format_total_time(5400), "1h 30m");
        assert_eq!(format_total_time(59), "0h 0m");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(format_relative_time(now - Duration::seconds(30), now), "Just now");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
    }

    #[test]
    fn test_relative_time_old_falls_back_to_date() {
        let now = Utc::now();
        let old = now - Duration::days(30);
        let formatted = format_relative_time(old, now);
        assert!(formatted.contains('/'), "expected a calendar date, got {formatted}");
    }
}
