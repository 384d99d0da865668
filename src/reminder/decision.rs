//! Pure reminder timing decision.
//!
//! A reminder fires only on the 15-minute grid (:00, :15, :30, :45) and
//! outside quiet hours (23:00–06:00). Both rules are evaluated against the
//! clock of the executing environment — the server's local time for the
//! dispatch channel, the device's for client channels. There is deliberately
//! no per-user timezone normalization.

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// First quiet hour of the night (inclusive).
pub const QUIET_START_HOUR: u32 = 23;
/// First hour of the morning at which reminders resume.
pub const QUIET_END_HOUR: u32 = 6;

/// Minutes between reminder boundaries.
pub const GRID_MINUTES: u32 = 15;

/// Why a reminder was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuppressReason {
    /// Current minute is not a multiple of 15.
    NotGridAligned,
    /// Current hour falls inside the 23:00–06:00 quiet window.
    QuietHours,
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuppressReason::NotGridAligned => write!(f, "not-grid-aligned"),
            SuppressReason::QuietHours => write!(f, "quiet-hours"),
        }
    }
}

/// Outcome of evaluating the reminder rule at a wall-clock moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Fire,
    Suppress(SuppressReason),
}

impl Decision {
    pub fn should_fire(&self) -> bool {
        matches!(self, Decision::Fire)
    }
}

/// Whether the given hour falls inside the quiet window.
pub fn in_quiet_hours(hour: u32) -> bool {
    hour >= QUIET_START_HOUR || hour < QUIET_END_HOUR
}

/// Evaluate the reminder rule for a wall-clock (hour, minute).
///
/// Idempotent and side-effect free; callers may re-evaluate at any
/// frequency. Fires iff the minute sits on the 15-minute grid and the hour is
/// outside quiet hours.
pub fn decide(hour: u32, minute: u32) -> Decision {
    if minute % GRID_MINUTES != 0 {
        return Decision::Suppress(SuppressReason::NotGridAligned);
    }
    if in_quiet_hours(hour) {
        return Decision::Suppress(SuppressReason::QuietHours);
    }
    Decision::Fire
}

/// Evaluate the reminder rule at a timestamp.
pub fn decide_at<Tz: TimeZone>(at: &DateTime<Tz>) -> Decision {
    decide(at.hour(), at.minute())
}

/// Timestamp of the next 15-minute boundary strictly after `now`.
///
/// Seconds and sub-seconds are zeroed, so the result always lands exactly on
/// :00, :15, :30 or :45. Calling this at a boundary yields the following one.
pub fn next_boundary<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    // Truncation cannot fail for sub-hour spans.
    let truncated = now
        .clone()
        .duration_trunc(ChronoDuration::minutes(GRID_MINUTES as i64))
        .unwrap_or_else(|_| now.clone());
    truncated + ChronoDuration::minutes(GRID_MINUTES as i64)
}

/// Delay from `now` until the next 15-minute boundary. Always positive.
///
/// Each firing recomputes this from the current moment rather than using a
/// fixed periodic tick, so schedules stay grid-aligned even after delays.
pub fn delay_until_next_boundary<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let next = next_boundary(now);
    (next - now.clone()).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_fires_on_grid_outside_quiet_hours() {
        assert_eq!(decide(9, 15), Decision::Fire);
        assert_eq!(decide(6, 0), Decision::Fire);
        assert_eq!(decide(22, 45), Decision::Fire);
        assert_eq!(decide(12, 0), Decision::Fire);
    }

    #[test]
    fn test_suppresses_off_grid_minutes() {
        assert_eq!(
            decide(9, 16),
            Decision::Suppress(SuppressReason::NotGridAligned)
        );
        assert_eq!(
            decide(9, 14),
            Decision::Suppress(SuppressReason::NotGridAligned)
        );
        assert_eq!(
            decide(9, 59),
            Decision::Suppress(SuppressReason::NotGridAligned)
        );
    }

    #[test]
    fn test_suppresses_quiet_hours() {
        assert_eq!(decide(23, 0), Decision::Suppress(SuppressReason::QuietHours));
        assert_eq!(decide(0, 30), Decision::Suppress(SuppressReason::QuietHours));
        assert_eq!(decide(5, 45), Decision::Suppress(SuppressReason::QuietHours));
    }

    #[test]
    fn test_off_grid_reported_before_quiet_hours() {
        // Both rules violated: alignment is checked first, matching the
        // dispatch entry order.
        assert_eq!(
            decide(23, 7),
            Decision::Suppress(SuppressReason::NotGridAligned)
        );
    }

    #[test]
    fn test_full_predicate_over_a_day() {
        for hour in 0..24 {
            for minute in 0..60 {
                let expected = minute % 15 == 0 && !(hour >= 23 || hour < 6);
                assert_eq!(
                    decide(hour, minute).should_fire(),
                    expected,
                    "at {:02}:{:02}",
                    hour,
                    minute
                );
            }
        }
    }

    #[test]
    fn test_next_boundary_rounds_up() {
        let now = Utc.with_ymd_and_hms(2025, 9, 3, 9, 7, 30).unwrap();
        let next = next_boundary(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 9, 3, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_next_boundary_at_boundary_advances_a_full_interval() {
        let now = Utc.with_ymd_and_hms(2025, 9, 3, 9, 45, 0).unwrap();
        let next = next_boundary(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 9, 3, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_next_boundary_crosses_the_hour() {
        let now = Utc.with_ymd_and_hms(2025, 9, 3, 9, 52, 11).unwrap();
        let next = next_boundary(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 9, 3, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_delay_is_positive_and_grid_bounded() {
        let now = Utc.with_ymd_and_hms(2025, 9, 3, 9, 59, 59).unwrap();
        let delay = delay_until_next_boundary(&now);
        assert!(delay > Duration::ZERO);
        assert!(delay <= Duration::from_secs(15 * 60));
    }
}
