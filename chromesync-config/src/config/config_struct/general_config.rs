use serde::Serialize;

use crate::types::Locale;

/// Startup behaviour and UI language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneralConfig {
    /// Launch with the operating system session
    pub auto_start: bool,
    /// Closing the main window hides it to the system tray
    pub minimize_to_tray: bool,
    pub check_for_updates: bool,
    /// Run a full synchronization right after startup
    pub sync_on_startup: bool,
    pub language: Locale,
}

impl GeneralConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "auto_start",
        "minimize_to_tray",
        "check_for_updates",
        "sync_on_startup",
        "language",
    ];
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            minimize_to_tray: true,
            check_for_updates: true,
            sync_on_startup: false,
            language: Locale::default(),
        }
    }
}
