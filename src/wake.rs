//! Wake scheduling for the battery-powered display.
//!
//! The device checks in, asks how long to deep-sleep, and disconnects. The
//! answer is the next time-of-day aligned to the polling interval, pushed out
//! of the configured quiet window and never closer than ten minutes away.
//!
//! The computation is pure: same `now`, same answer. Concurrent check-ins are
//! safe by construction.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Minimum sleep the scheduler will ever hand out.
///
/// A shorter duration would have the device redraw almost immediately after
/// going to sleep, draining the battery on back-to-back wakeups.
pub const MIN_SLEEP_MS: i64 = 600_000;

/// Result of one wake computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakePlan {
    /// Absolute local time of the next wakeup
    pub next_wakeup: NaiveDateTime,
    /// Sleep duration in milliseconds (never negative)
    pub sleep_duration_ms: u64,
}

/// Compute the next wakeup for a device checking in at `now`.
///
/// `interval_minutes` aligns wakeups to multiples of the interval within the
/// day (e.g. 60 wakes on the hour). The quiet window `[sleep_start,
/// sleep_end)` suppresses wakeups; pass the same time for both boundaries to
/// disable it. A window with `sleep_end < sleep_start` crosses midnight.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use frameboard::wake::next_wakeup;
///
/// let now = NaiveDate::from_ymd_opt(2024, 5, 1)
///     .unwrap()
///     .and_hms_opt(14, 10, 0)
///     .unwrap();
/// let quiet = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
/// let plan = next_wakeup(now, 60, quiet, quiet);
/// assert_eq!(plan.next_wakeup, now.date().and_hms_opt(15, 0, 0).unwrap());
/// ```
pub fn next_wakeup(
    now: NaiveDateTime,
    interval_minutes: u32,
    sleep_start: NaiveTime,
    sleep_end: NaiveTime,
) -> WakePlan {
    let interval = i64::from(interval_minutes.max(1));

    let mut candidate = aligned_candidate(now, interval, 1);

    let mut window_start = now.date().and_time(sleep_start);
    let mut window_end = now.date().and_time(sleep_end);
    if window_end < window_start {
        // Midnight-crossing window: shift whichever boundary keeps `now`
        // outside an inverted range.
        if now >= window_start {
            window_end += Duration::days(1);
        } else if now < window_end {
            window_start -= Duration::days(1);
        }
    }

    if window_start <= candidate && candidate < window_end {
        candidate = window_end;
    }

    let mut sleep_ms = (candidate - now).num_milliseconds();
    if sleep_ms < MIN_SLEEP_MS {
        // Imminent wakeup: skip one interval step ahead and re-apply the
        // quiet-window snap.
        candidate = aligned_candidate(now, interval, 2);
        if window_start <= candidate && candidate < window_end {
            candidate = window_end;
        }
        sleep_ms = (candidate - now).num_milliseconds();
    }

    WakePlan {
        next_wakeup: candidate,
        sleep_duration_ms: sleep_ms.max(0) as u64,
    }
}

/// Next time-of-day aligned to a multiple of `interval` minutes, `steps`
/// interval steps after `now`. Wraps past midnight by moving to tomorrow.
fn aligned_candidate(now: NaiveDateTime, interval: i64, steps: i64) -> NaiveDateTime {
    let minute_of_day = i64::from(now.hour()) * 60 + i64::from(now.minute());
    let next_minutes = (interval * (minute_of_day / interval + steps)).rem_euclid(24 * 60);
    let time = NaiveTime::from_hms_opt(
        (next_minutes / 60) as u32,
        (next_minutes % 60) as u32,
        0,
    )
    .unwrap_or_default();
    let mut candidate = now.date().and_time(time);
    if candidate < now {
        candidate += Duration::days(1);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_simple_interval_alignment() {
        let plan = next_wakeup(at(14, 10), 60, t(0, 0), t(0, 0));
        assert_eq!(plan.next_wakeup, at(15, 0));
        assert_eq!(plan.sleep_duration_ms, 50 * 60 * 1000);
    }

    #[test]
    fn test_quiet_window_snap_across_midnight() {
        // 23:30 with a 23:00-06:00 quiet window snaps to 06:00 tomorrow.
        let plan = next_wakeup(at(23, 30), 60, t(23, 0), t(6, 0));
        let expected = NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert_eq!(plan.next_wakeup, expected);
        assert_eq!(plan.sleep_duration_ms, 6 * 3600 * 1000 + 30 * 60 * 1000);
    }

    #[test]
    fn test_quiet_window_early_morning_side() {
        // 02:00 is inside the 23:00-06:00 window approached from the other
        // side; the start boundary moves to yesterday.
        let plan = next_wakeup(at(2, 0), 60, t(23, 0), t(6, 0));
        assert_eq!(plan.next_wakeup, at(6, 0));
        assert_eq!(plan.sleep_duration_ms, 4 * 3600 * 1000);
    }

    #[test]
    fn test_minimum_sleep_floor() {
        // The 06:00 candidate is only 5 minutes away and must be rejected.
        let plan = next_wakeup(at(5, 55), 60, t(0, 0), t(0, 0));
        assert_eq!(plan.next_wakeup, at(7, 0));
        assert_eq!(plan.sleep_duration_ms, 65 * 60 * 1000);
    }

    #[test]
    fn test_minimum_sleep_floor_then_quiet_snap() {
        // First candidate (06:50) is under the floor; the recomputed one
        // (07:00) lands inside the quiet window and snaps forward.
        let plan = next_wakeup(at(6, 42), 10, t(7, 0), t(9, 0));
        assert_eq!(plan.next_wakeup, at(9, 0));
    }

    #[test]
    fn test_wrap_past_midnight() {
        let plan = next_wakeup(at(23, 40), 30, t(0, 0), t(0, 0));
        let expected = NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(plan.next_wakeup, expected);
        assert_eq!(plan.sleep_duration_ms, 20 * 60 * 1000);
    }

    #[test]
    fn test_same_day_quiet_window() {
        // Non-inverted window 12:00-14:00.
        let plan = next_wakeup(at(12, 30), 60, t(12, 0), t(14, 0));
        assert_eq!(plan.next_wakeup, at(14, 0));
    }

    #[test]
    fn test_odd_interval() {
        let plan = next_wakeup(at(10, 16), 45, t(0, 0), t(0, 0));
        // Multiples of 45 min: 10:30 next.
        assert_eq!(plan.next_wakeup, at(10, 30));
    }

    #[test]
    fn test_never_negative() {
        let plan = next_wakeup(at(23, 59), 60, t(0, 0), t(0, 0));
        assert!(plan.sleep_duration_ms > 0);
    }
}
