//! Formatting helpers for presentation boundaries.

use chrono::{DateTime, Utc};

use crate::analytics::GrowthData;
use crate::types::date_key;

/// Format a number with a fixed number of decimals (e.g. `"4.25"`).
///
/// Non-finite input is rendered as zero.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}", decimals, value)
}

/// Format a counter compactly for display (e.g., "14.2M").
pub fn format_count(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

/// Format growth for display (e.g., "+23.5%" or "-15.0%").
pub fn format_growth(growth: &GrowthData) -> String {
    let sign = if growth.is_positive { '+' } else { '-' };
    format!("{}{:.1}%", sign, growth.value)
}

/// Format a timestamp as relative time (e.g., "2m ago").
///
/// Anything older than a week is shown as its `DD-MM-YYYY` day.
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    match Utc::now().signed_duration_since(ts).num_seconds() {
        s if s < 0 => "just now".to_string(),
        s if s < MINUTE => format!("{}s ago", s),
        s if s < HOUR => format!("{}m ago", s / MINUTE),
        s if s < DAY => format!("{}h ago", s / HOUR),
        s if s < 7 * DAY => format!("{}d ago", s / DAY),
        _ => date_key::format(ts.date_naive()),
    }
}

/// Format an optional timestamp as relative time, or "never" if missing.
pub fn format_relative_time_opt(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => format_relative_time(ts),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(4.256, 2), "4.26");
        assert_eq!(format_fixed(0.0, 2), "0.00");
        assert_eq!(format_fixed(f64::NAN, 2), "0.00");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(14_200_000), "14.2M");
    }

    #[test]
    fn test_format_growth() {
        let up = GrowthData {
            value: 23.5,
            is_positive: true,
        };
        let down = GrowthData {
            value: 15.0,
            is_positive: false,
        };
        assert_eq!(format_growth(&up), "+23.5%");
        assert_eq!(format_growth(&down), "-15.0%");
    }

    #[test]
    fn test_relative_time() {
        assert_eq!(
            format_relative_time(Utc::now() - Duration::minutes(5)),
            "5m ago"
        );
        assert_eq!(format_relative_time_opt(None), "never");

        let old = Utc::now() - Duration::days(30);
        assert_eq!(
            format_relative_time(old),
            date_key::format(old.date_naive())
        );
    }
}
