//! Quiet-hours window math.
//!
//! All evaluation happens in the window's local time, derived from its
//! fixed UTC offset. A window with `start_hour > end_hour` wraps midnight.

use chrono::{DateTime, Duration, FixedOffset, Offset, Timelike, Utc};

use opsflow_core::types::QuietHoursWindow;

/// Whether the given local hour-of-day falls inside the quiet window.
pub fn in_quiet_hours(window: &QuietHoursWindow, hour: u32) -> bool {
    if window.start_hour > window.end_hour {
        // Window spans midnight.
        hour >= window.start_hour || hour < window.end_hour
    } else {
        hour >= window.start_hour && hour < window.end_hour
    }
}

/// Convert a UTC instant into the window's local time.
pub fn to_local(window: &QuietHoursWindow, now: DateTime<Utc>) -> DateTime<FixedOffset> {
    // Hours come from validated config; an out-of-range offset falls back to UTC.
    let offset = FixedOffset::east_opt(window.utc_offset_hours * 3600)
        .unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset)
}

/// The next instant at which the channel exits quiet hours.
///
/// Past the window's start hour the exit is the *next* day's end hour;
/// before it (in the early-morning leg of a wrapping window, or inside a
/// same-day window) the exit is today's end hour. Outside quiet hours the
/// answer is `now` itself.
pub fn next_exit(window: &QuietHoursWindow, now: DateTime<Utc>) -> DateTime<Utc> {
    let local = to_local(window, now);
    let hour = local.hour();

    if !in_quiet_hours(window, hour) {
        return now;
    }

    let mut exit = local
        .with_hour(window.end_hour)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);

    // In the evening leg (wrapping) or past a same-day end hour the exit
    // lands on the next calendar day.
    if hour >= window.start_hour && window.start_hour > window.end_hour {
        exit += Duration::days(1);
    } else if window.end_hour <= hour {
        exit += Duration::days(1);
    }

    exit.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use opsflow_core::types::Channel;

    fn window(start: u32, end: u32) -> QuietHoursWindow {
        QuietHoursWindow {
            channel: Channel::Email,
            start_hour: start,
            end_hour: end,
            timezone: "UTC".into(),
            utc_offset_hours: 0,
        }
    }

    #[test]
    fn test_same_day_window() {
        let w = window(9, 18);
        assert!(in_quiet_hours(&w, 9));
        assert!(in_quiet_hours(&w, 10));
        assert!(in_quiet_hours(&w, 17));
        assert!(!in_quiet_hours(&w, 18));
        assert!(!in_quiet_hours(&w, 20));
        assert!(!in_quiet_hours(&w, 8));
    }

    #[test]
    fn test_wrapping_window() {
        let w = window(20, 8);
        assert!(in_quiet_hours(&w, 22));
        assert!(in_quiet_hours(&w, 3));
        assert!(in_quiet_hours(&w, 20));
        assert!(!in_quiet_hours(&w, 12));
        assert!(!in_quiet_hours(&w, 8));
        assert!(!in_quiet_hours(&w, 19));
    }

    #[test]
    fn test_next_exit_wrapping_evening() {
        // 21:00 inside the evening leg of {20, 8}: exit is 08:00 next day.
        let w = window(20, 8);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 21, 0, 0).unwrap();
        let exit = next_exit(&w, now);
        assert_eq!(exit, Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_next_exit_wrapping_morning() {
        // 03:30 inside the morning leg of {20, 8}: exit is 08:00 same day.
        let w = window(20, 8);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 3, 30, 0).unwrap();
        let exit = next_exit(&w, now);
        assert_eq!(exit, Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_next_exit_outside_window_is_now() {
        let w = window(20, 8);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(next_exit(&w, now), now);
    }

    #[test]
    fn test_next_exit_same_day_window() {
        // 10:00 inside {9, 18}: exit is 18:00 same day.
        let w = window(9, 18);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        let exit = next_exit(&w, now);
        assert_eq!(exit, Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_offset_applies_to_hour() {
        // 23:00 UTC is 08:00 at +9 — outside the {20, 8} window there.
        let mut w = window(20, 8);
        w.utc_offset_hours = 9;
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap();
        assert!(!in_quiet_hours(&w, to_local(&w, now).hour()));
        // 13:00 UTC is 22:00 at +9 — inside.
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 13, 0, 0).unwrap();
        assert!(in_quiet_hours(&w, to_local(&w, now).hour()));
    }
}
