//! ChromeSync configuration tooling.
//!
//! The configuration model lives in the `chromesync-config` crate and is
//! re-exported here as [`config`]. This crate adds the `chromesync` command
//! line and the application log file.

pub mod cli;
pub mod logging;

pub use chromesync_config as config;
