//! Built-in default values.
//!
//! The shipped template document ([`TEMPLATE`]) is the primary source of
//! defaults: the loader merges user overrides on top of it, and
//! [`InvalidFieldPolicy::UseDefault`](crate::InvalidFieldPolicy::UseDefault)
//! falls back to the template's own value for a failing field. The free
//! functions here produce the same values as typed Rust data for
//! [`Config::for_environment`](crate::Config::for_environment), which stands
//! in where the template itself cannot be read.

mod paths;
mod values;

/// The default configuration document, with `%NAME%` placeholders intact.
pub const TEMPLATE: &str = include_str!("../../assets/default_config.json");

/// Application directory name used under the platform data/config roots.
pub const APP_DIR_NAME: &str = "ChromeSync";

pub const CONFIG_FILE_NAME: &str = "config.json";

// ── Paths ──────────────────────────────────────────────────────────────────
pub use paths::{
    chrome_path, chrome_user_data_dir, config_dir, config_file, logs_dir, temp_dir, zen_path,
    zen_user_data_dir,
};

// ── Scalar values ──────────────────────────────────────────────────────────
pub use values::{
    CHROME_PROFILE, ZEN_PROFILE, delay_seconds, idle_time_minutes, interval_hours,
    max_backups, max_size_mb, notification_timeout_sec, retention_days, rotation_count,
    specific_time,
};
