use serde::Serialize;

use crate::types::ClockTime;

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SyncConfig {
    pub data_types: DataTypesConfig,
    pub schedule: ScheduleConfig,
    pub auto_sync: AutoSyncConfig,
}

impl SyncConfig {
    pub const FIELDS: &'static [&'static str] = &["data_types", "schedule", "auto_sync"];
}

/// Which kinds of browser data are copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataTypesConfig {
    pub passwords: bool,
    pub bookmarks: bool,
    pub history: bool,
}

impl DataTypesConfig {
    pub const FIELDS: &'static [&'static str] = &["passwords", "bookmarks", "history"];
}

impl Default for DataTypesConfig {
    fn default() -> Self {
        Self {
            passwords: true,
            bookmarks: true,
            history: true,
        }
    }
}

/// Periodic synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleConfig {
    pub enabled: bool,
    /// Hours between runs (1..=168)
    pub interval_hours: u32,
    /// Preferred time of day for the run
    pub specific_time: ClockTime,
    /// Only run once the user has been idle for `idle_time_minutes`
    pub sync_when_idle: bool,
    pub idle_time_minutes: u32,
}

impl ScheduleConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "enabled",
        "interval_hours",
        "specific_time",
        "sync_when_idle",
        "idle_time_minutes",
    ];
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: crate::defaults::interval_hours(),
            specific_time: crate::defaults::specific_time(),
            sync_when_idle: true,
            idle_time_minutes: crate::defaults::idle_time_minutes(),
        }
    }
}

/// Synchronization triggered by the source browser starting or exiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoSyncConfig {
    pub enabled: bool,
    pub trigger_on_chrome_launch: bool,
    pub trigger_on_chrome_close: bool,
    /// Wait this long after the trigger before starting
    pub delay_seconds: u32,
}

impl AutoSyncConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "enabled",
        "trigger_on_chrome_launch",
        "trigger_on_chrome_close",
        "delay_seconds",
    ];
}

impl Default for AutoSyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_on_chrome_launch: true,
            trigger_on_chrome_close: false,
            delay_seconds: crate::defaults::delay_seconds(),
        }
    }
}
