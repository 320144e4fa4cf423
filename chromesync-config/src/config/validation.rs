//! Numeric bounds and validation of already-typed configs.
//!
//! The loader checks the same bounds while reading a document; this module
//! covers `Config` values built or edited in code before they are saved.

use std::ops::RangeInclusive;

use super::config_struct::Config;
use crate::error::{ConfigError, FieldError, FieldErrorKind, FieldPath};

pub const INTERVAL_HOURS: RangeInclusive<u32> = 1..=168;
pub const IDLE_TIME_MINUTES: RangeInclusive<u32> = 0..=60;
pub const DELAY_SECONDS: RangeInclusive<u32> = 0..=300;
pub const RETENTION_DAYS: RangeInclusive<u32> = 0..=30;
pub const MAX_BACKUPS: RangeInclusive<u32> = 1..=10;
pub const MAX_SIZE_MB: RangeInclusive<u32> = 1..=100;
pub const ROTATION_COUNT: RangeInclusive<u32> = 0..=20;
pub const NOTIFICATION_TIMEOUT_SEC: RangeInclusive<u32> = 0..=30;

/// Range error for `value` against `bounds`, if it falls outside.
pub(crate) fn check_range(value: i64, bounds: &RangeInclusive<u32>) -> Result<(), FieldErrorKind> {
    if value < i64::from(*bounds.start()) || value > i64::from(*bounds.end()) {
        return Err(FieldErrorKind::OutOfRange {
            value: i128::from(value),
            min: *bounds.start(),
            max: *bounds.end(),
        });
    }
    Ok(())
}

impl Config {
    /// Check every bounded field.
    ///
    /// Enumerations, clock times and locale tags are enforced by their types
    /// and need no check here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, u32, &RangeInclusive<u32>); 8] = [
            (
                "sync.schedule.interval_hours",
                self.sync.schedule.interval_hours,
                &INTERVAL_HOURS,
            ),
            (
                "sync.schedule.idle_time_minutes",
                self.sync.schedule.idle_time_minutes,
                &IDLE_TIME_MINUTES,
            ),
            (
                "sync.auto_sync.delay_seconds",
                self.sync.auto_sync.delay_seconds,
                &DELAY_SECONDS,
            ),
            (
                "storage.retention_days",
                self.storage.retention_days,
                &RETENTION_DAYS,
            ),
            ("storage.max_backups", self.storage.max_backups, &MAX_BACKUPS),
            ("logs.max_size_mb", self.logs.max_size_mb, &MAX_SIZE_MB),
            ("logs.rotation_count", self.logs.rotation_count, &ROTATION_COUNT),
            (
                "gui.notification_timeout_sec",
                self.gui.notification_timeout_sec,
                &NOTIFICATION_TIMEOUT_SEC,
            ),
        ];

        let errors: Vec<FieldError> = checks
            .iter()
            .filter_map(|(path, value, bounds)| {
                check_range(i64::from(*value), bounds)
                    .err()
                    .map(|kind| FieldError::new(FieldPath::from(*path), kind))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.sync.schedule.interval_hours = 0;
        let err = config.validate().unwrap_err();
        let fields = err.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path.as_str(), "sync.schedule.interval_hours");
        assert_eq!(
            fields[0].kind,
            FieldErrorKind::OutOfRange {
                value: 0,
                min: 1,
                max: 168
            }
        );
    }

    #[test]
    fn test_all_violations_reported() {
        let mut config = Config::default();
        config.storage.max_backups = 0;
        config.logs.max_size_mb = 0;
        config.gui.notification_timeout_sec = 31;
        let err = config.validate().unwrap_err();
        let paths: Vec<&str> = err.field_errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["storage.max_backups", "logs.max_size_mb", "gui.notification_timeout_sec"]
        );
    }

    #[test]
    fn test_check_range_bounds_inclusive() {
        assert!(check_range(1, &INTERVAL_HOURS).is_ok());
        assert!(check_range(168, &INTERVAL_HOURS).is_ok());
        assert!(check_range(169, &INTERVAL_HOURS).is_err());
        assert!(check_range(-1, &RETENTION_DAYS).is_err());
    }
}
