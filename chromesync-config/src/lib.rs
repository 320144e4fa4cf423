//! Configuration for the ChromeSync browser data synchronizer.
//!
//! This crate loads the ChromeSync config document, validates it and keeps it
//! on disk. It includes:
//!
//! - The built-in template with `%NAME%` placeholders and typed defaults
//! - A loader that merges JSON, YAML or TOML overrides over the template
//! - Field-level validation errors with dotted paths
//! - A store for atomic saves, backups, import and export
//! - Configuration file watching

pub mod config;
pub mod defaults;
pub mod error;
pub mod types;
#[cfg(feature = "watcher")]
pub mod watcher;

pub use config::{
    AutoSyncConfig, BrowserConfig, Config, ConfigLoader, ConfigStore, DataTypesConfig,
    DocumentFormat, Environment, GeneralConfig, GuiConfig, InvalidFieldPolicy, LoadOptions,
    Loaded, LogsConfig, Opened, PathCheck, PathProblem, PlaceholderScope, ProcessEnvironment,
    ScheduleConfig, SecurityConfig, StorageConfig, SyncConfig,
};
pub use error::{ConfigError, FieldError, FieldErrorKind, FieldPath, ValidationErrors};
pub use types::{ClockTime, Locale, LogLevel, Theme};
#[cfg(feature = "watcher")]
pub use watcher::{ConfigWatcher, ReloadEvent};
