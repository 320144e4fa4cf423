//! Default scalar values.

use crate::types::ClockTime;

pub const CHROME_PROFILE: &str = "Default";
pub const ZEN_PROFILE: &str = "default";

pub fn interval_hours() -> u32 {
    24
}

pub fn specific_time() -> ClockTime {
    ClockTime::new(2, 0).unwrap_or_default()
}

pub fn idle_time_minutes() -> u32 {
    10
}

pub fn delay_seconds() -> u32 {
    5
}

pub fn retention_days() -> u32 {
    1
}

pub fn max_backups() -> u32 {
    3
}

pub fn max_size_mb() -> u32 {
    10
}

pub fn rotation_count() -> u32 {
    5
}

pub fn notification_timeout_sec() -> u32 {
    5
}
