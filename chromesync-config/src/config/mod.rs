//! Configuration loading, validation and persistence.
//!
//! # Sub-modules
//!
//! - [`config_struct`]: the typed `Config` and its section structs
//! - [`document`]: JSON/YAML/TOML parsing, rendering and the override merge
//! - [`placeholders`]: `%NAME%` expansion and the variable allowlist
//! - [`loader`]: `ConfigLoader`, which turns documents into a `Config`
//! - [`validation`]: numeric bounds and `Config::validate`
//! - [`path_validation`]: filesystem checks for browser locations
//! - [`persistence`]: `ConfigStore`, the on-disk config file

pub mod config_struct;
pub mod document;
pub mod loader;
pub mod path_validation;
pub mod persistence;
pub mod placeholders;
pub mod validation;

pub use config_struct::{
    AutoSyncConfig, BrowserConfig, Config, DataTypesConfig, GeneralConfig, GuiConfig, LogsConfig,
    ScheduleConfig, SecurityConfig, StorageConfig, SyncConfig,
};
pub use document::{DocumentFormat, merge_documents};
pub use loader::{ConfigLoader, InvalidFieldPolicy, LoadOptions, Loaded};
pub use path_validation::{PathCheck, PathProblem};
pub use persistence::{ConfigStore, Opened, list_backups};
pub use placeholders::{
    ALLOWED_PLACEHOLDERS, Environment, PlaceholderScope, ProcessEnvironment, expand_placeholders,
    is_placeholder_allowed,
};
