//! Time utilities for the frame simulation and tournament schedules

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Frame rate configuration
pub const FRAME_RATE: u32 = 60; // 60 visual frames per second
pub const FRAME_DURATION_MICROS: u64 = 1_000_000 / FRAME_RATE as u64;

/// Format the time remaining until `end` in the compact form used by
/// tournament cards: "3d 4h", "2h 15m", "42m", or "Ended".
pub fn time_left_short(end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = end - now;
    if remaining <= chrono::Duration::zero() {
        return "Ended".to_string();
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Whether `end` falls within the next hour
pub fn is_ending_soon(end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let remaining = end - now;
    remaining > chrono::Duration::zero() && remaining <= chrono::Duration::hours(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn time_left_formats_by_magnitude() {
        let now = at(0);
        assert_eq!(time_left_short(at(3 * 86_400 + 4 * 3_600), now), "3d 4h");
        assert_eq!(time_left_short(at(2 * 3_600 + 15 * 60), now), "2h 15m");
        assert_eq!(time_left_short(at(42 * 60), now), "42m");
    }

    #[test]
    fn time_left_in_the_past_is_ended() {
        let now = at(1_000);
        assert_eq!(time_left_short(at(999), now), "Ended");
        assert_eq!(time_left_short(at(1_000), now), "Ended");
    }

    #[test]
    fn ending_soon_window_is_one_hour() {
        let now = at(0);
        assert!(is_ending_soon(at(59 * 60), now));
        assert!(is_ending_soon(at(3_600), now));
        assert!(!is_ending_soon(at(3_601), now));
        assert!(!is_ending_soon(at(-1), now));
    }
}
