use std::fmt::Write;

use crate::config::GRACE_PERIOD_DAYS;

const SECS_PER_DAY: i64 = 86_400;
const NOT_AVAILABLE: &str = "N/A";

/// Backend timestamps are unix seconds; zero means unset.
fn valid_secs(timestamp: Option<f64>) -> Option<f64> {
    timestamp.filter(|t| t.is_finite() && *t != 0.0)
}

/// Render a unix-seconds timestamp as `dd/mm/YYYY HH:MM:SS` (UTC).
pub fn format_timestamp(timestamp: Option<f64>) -> String {
    valid_secs(timestamp)
        .and_then(|secs| chrono::DateTime::from_timestamp(secs.floor() as i64, 0))
        .map(|dt| dt.format("%d/%m/%Y %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Time left until `next_fee_date` as `{d}d {h}h {m}m`; overdue fees show zero.
pub fn format_countdown(next_fee_date: Option<f64>, now_secs: f64) -> String {
    let Some(next) = valid_secs(next_fee_date) else {
        return NOT_AVAILABLE.to_string();
    };
    let remaining = ((next - now_secs).floor() as i64).max(0);
    let mut out = String::with_capacity(12);
    let _ = write!(
        out,
        "{}d {}h {}m",
        remaining / SECS_PER_DAY,
        (remaining % SECS_PER_DAY) / 3600,
        (remaining % 3600) / 60
    );
    out
}

/// The fee falls due within the grace window but has not passed yet.
pub fn in_grace_period(next_fee_date: Option<f64>, now_secs: f64) -> bool {
    let Some(next) = valid_secs(next_fee_date) else {
        return false;
    };
    let remaining = next - now_secs;
    remaining > 0.0 && remaining <= (GRACE_PERIOD_DAYS * SECS_PER_DAY) as f64
}

pub fn now_secs() -> f64 {
    js_sys::Date::now() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_700_000_000.0;

    #[test]
    fn formats_unix_seconds_in_utc() {
        assert_eq!(format_timestamp(Some(0.0)), "N/A");
        assert_eq!(format_timestamp(None), "N/A");
        assert_eq!(
            format_timestamp(Some(1_700_000_000.0)),
            "14/11/2023 22:13:20 UTC"
        );
    }

    #[test]
    fn countdown_splits_days_hours_minutes() {
        let next = NOW + 2.0 * 86_400.0 + 3.0 * 3600.0 + 4.0 * 60.0 + 59.0;
        assert_eq!(format_countdown(Some(next), NOW), "2d 3h 4m");
    }

    #[test]
    fn overdue_countdown_clamps_to_zero() {
        assert_eq!(format_countdown(Some(NOW - 5_000.0), NOW), "0d 0h 0m");
        assert_eq!(format_countdown(None, NOW), "N/A");
    }

    #[test]
    fn grace_period_is_the_last_week_before_the_fee() {
        assert!(in_grace_period(Some(NOW + 3_600.0), NOW));
        assert!(in_grace_period(Some(NOW + 7.0 * 86_400.0), NOW));
        assert!(!in_grace_period(Some(NOW + 8.0 * 86_400.0), NOW));
        assert!(!in_grace_period(Some(NOW - 1.0), NOW));
        assert!(!in_grace_period(None, NOW));
    }
}
