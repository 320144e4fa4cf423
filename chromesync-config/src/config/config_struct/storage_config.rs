use std::path::PathBuf;

use serde::Serialize;

use crate::config::{Environment, ProcessEnvironment};

/// Scratch storage and backup retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageConfig {
    pub temp_dir: PathBuf,
    /// Days to keep exported data (0 = delete after each run)
    pub retention_days: u32,
    /// Backups kept before the oldest is pruned
    pub max_backups: u32,
}

impl StorageConfig {
    pub const FIELDS: &'static [&'static str] = &["temp_dir", "retention_days", "max_backups"];

    pub fn for_environment(env: &dyn Environment) -> Self {
        Self {
            temp_dir: crate::defaults::temp_dir(env),
            retention_days: crate::defaults::retention_days(),
            max_backups: crate::defaults::max_backups(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::for_environment(&ProcessEnvironment)
    }
}
