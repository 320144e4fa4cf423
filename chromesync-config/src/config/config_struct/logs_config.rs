use std::path::PathBuf;

use serde::Serialize;

use crate::config::{Environment, ProcessEnvironment};
use crate::types::LogLevel;

/// Application log file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogsConfig {
    pub dir: PathBuf,
    pub level: LogLevel,
    /// Size at which the log file is rotated
    pub max_size_mb: u32,
    /// Rotated files kept (0 = truncate in place)
    pub rotation_count: u32,
    pub include_timestamps: bool,
}

impl LogsConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "dir",
        "level",
        "max_size_mb",
        "rotation_count",
        "include_timestamps",
    ];

    /// `max_size_mb` in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        u64::from(self.max_size_mb) * 1024 * 1024
    }

    pub fn for_environment(env: &dyn Environment) -> Self {
        Self {
            dir: crate::defaults::logs_dir(env),
            level: LogLevel::default(),
            max_size_mb: crate::defaults::max_size_mb(),
            rotation_count: crate::defaults::rotation_count(),
            include_timestamps: true,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self::for_environment(&ProcessEnvironment)
    }
}
