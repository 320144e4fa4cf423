//! Core `Config` struct definition.
//!
//! One sub-struct per top-level document section:
//!
//! - [`GeneralConfig`]: startup behaviour and UI language
//! - [`BrowserConfig`]: one entry of the `browsers` map
//! - [`SyncConfig`]: data types, schedule and auto-sync triggers
//! - [`SecurityConfig`]: handling of sensitive data
//! - [`StorageConfig`]: temp directory and retention
//! - [`LogsConfig`]: log file location, level and rotation
//! - [`GuiConfig`]: theme and notification preferences
//!
//! `Config` only implements `Serialize`. Values come from
//! [`ConfigLoader`](crate::ConfigLoader), which validates every field, or
//! from `Default`.

mod browser_config;
mod general_config;
mod gui_config;
mod logs_config;
mod security_config;
mod storage_config;
mod sync_config;

pub use browser_config::BrowserConfig;
pub use general_config::GeneralConfig;
pub use gui_config::GuiConfig;
pub use logs_config::LogsConfig;
pub use security_config::SecurityConfig;
pub use storage_config::StorageConfig;
pub use sync_config::{AutoSyncConfig, DataTypesConfig, ScheduleConfig, SyncConfig};

use std::collections::BTreeMap;

use serde::Serialize;

use super::placeholders::{Environment, ProcessEnvironment};

/// Fully resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub general: GeneralConfig,
    /// Browser name (`chrome`, `zen`, ...) to install locations.
    pub browsers: BTreeMap<String, BrowserConfig>,
    pub sync: SyncConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub logs: LogsConfig,
    pub gui: GuiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_environment(&ProcessEnvironment)
    }
}

impl Config {
    /// Top-level section names, in document order.
    pub const SECTIONS: &'static [&'static str] = &[
        "general", "browsers", "sync", "security", "storage", "logs", "gui",
    ];

    /// Built-in defaults with host locations read from `env`.
    pub fn for_environment(env: &dyn Environment) -> Self {
        let mut browsers = BTreeMap::new();
        browsers.insert("chrome".to_string(), BrowserConfig::chrome(env));
        browsers.insert("zen".to_string(), BrowserConfig::zen(env));

        Self {
            general: GeneralConfig::default(),
            browsers,
            sync: SyncConfig::default(),
            security: SecurityConfig::default(),
            storage: StorageConfig::for_environment(env),
            logs: LogsConfig::for_environment(env),
            gui: GuiConfig::default(),
        }
    }

    pub fn browser(&self, name: &str) -> Option<&BrowserConfig> {
        self.browsers.get(name)
    }

    /// Copy suitable for sharing: password synchronization is switched off.
    pub fn without_sensitive_data(&self) -> Self {
        let mut copy = self.clone();
        copy.sync.data_types.passwords = false;
        copy
    }
}
