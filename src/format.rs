//! Display helpers for job status and activity data.

use chrono::{DateTime, Utc};

use crate::types::JobState;

/// "3 hours ago", "1 day ago", or "Just now" for under a minute.
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const UNITS: [(&str, i64); 6] = [
        ("year", 31_536_000),
        ("month", 2_592_000),
        ("week", 604_800),
        ("day", 86_400),
        ("hour", 3_600),
        ("minute", 60),
    ];
    let seconds = (now - at).num_seconds();
    for (unit, size) in UNITS {
        let n = seconds / size;
        if n >= 1 {
            return format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" });
        }
    }
    "Just now".to_string()
}

/// 999 → "999", 1_500 → "1.5K", 2_300_000 → "2.3M".
pub fn compact_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Short upper-case label for a job state.
pub fn status_label(state: JobState) -> String {
    state.as_str().to_ascii_uppercase()
}

/// Whole seconds a job has been running.
pub fn running_for_secs(ms: u64) -> u64 {
    (ms + 500) / 1000
}

/// `https://www.linkedin.com/in/ada-lovelace/` → `ada-lovelace`.
/// Anything that is not a profile URL is returned unchanged.
pub fn linkedin_username(url: &str) -> &str {
    url.split_once("linkedin.com/in/")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or(rest))
        .filter(|name| !name.is_empty())
        .unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(30), now), "Just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(8), now), "1 week ago");
        assert_eq!(time_ago(now + Duration::hours(1), now), "Just now");
    }

    #[test]
    fn test_compact_number() {
        assert_eq!(compact_number(0), "0");
        assert_eq!(compact_number(999), "999");
        assert_eq!(compact_number(1_500), "1.5K");
        assert_eq!(compact_number(2_300_000), "2.3M");
    }

    #[test]
    fn test_percentage_and_labels() {
        assert_eq!(percentage(42.345, 1), "42.3%");
        assert_eq!(percentage(7.0, 0), "7%");
        assert_eq!(status_label(JobState::Running), "RUNNING");
        assert_eq!(running_for_secs(12_600), 13);
    }

    #[test]
    fn test_linkedin_username() {
        assert_eq!(
            linkedin_username("https://www.linkedin.com/in/ada-lovelace/"),
            "ada-lovelace"
        );
        assert_eq!(
            linkedin_username("https://linkedin.com/in/grace?trk=feed"),
            "grace"
        );
        assert_eq!(linkedin_username("https://example.com/u/x"), "https://example.com/u/x");
        assert_eq!(linkedin_username("https://linkedin.com/in/"), "https://linkedin.com/in/");
    }
}
