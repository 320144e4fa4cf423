use serde::Serialize;

use crate::types::Theme;

/// Desktop UI preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuiConfig {
    pub theme: Theme,
    pub start_minimized: bool,
    pub show_notifications: bool,
    pub notification_timeout_sec: u32,
    /// Ask before destructive actions
    pub confirm_actions: bool,
}

impl GuiConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "theme",
        "start_minimized",
        "show_notifications",
        "notification_timeout_sec",
        "confirm_actions",
    ];
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            start_minimized: false,
            show_notifications: true,
            notification_timeout_sec: crate::defaults::notification_timeout_sec(),
            confirm_actions: true,
        }
    }
}
