use std::path::PathBuf;

use serde::Serialize;

use crate::config::Environment;

/// Install locations of one browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserConfig {
    /// Browser executable
    pub path: PathBuf,
    /// Root of the browser's profile storage
    pub user_data_dir: PathBuf,
    /// Profile directory name inside `user_data_dir`
    pub profile: String,
    /// Drive the browser UI instead of reading its files directly.
    /// Only meaningful for browsers that support it; omitted otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_gui_automation: Option<bool>,
}

impl BrowserConfig {
    pub const FIELDS: &'static [&'static str] =
        &["path", "user_data_dir", "profile", "use_gui_automation"];

    pub fn chrome(env: &dyn Environment) -> Self {
        Self {
            path: crate::defaults::chrome_path(env),
            user_data_dir: crate::defaults::chrome_user_data_dir(env),
            profile: crate::defaults::CHROME_PROFILE.to_string(),
            use_gui_automation: Some(true),
        }
    }

    pub fn zen(env: &dyn Environment) -> Self {
        Self {
            path: crate::defaults::zen_path(env),
            user_data_dir: crate::defaults::zen_user_data_dir(env),
            profile: crate::defaults::ZEN_PROFILE.to_string(),
            use_gui_automation: None,
        }
    }

    /// Full path of the configured profile directory.
    pub fn profile_dir(&self) -> PathBuf {
        self.user_data_dir.join(&self.profile)
    }
}

/// Fallback for browsers that have no built-in entry.
impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            user_data_dir: PathBuf::new(),
            profile: crate::defaults::CHROME_PROFILE.to_string(),
            use_gui_automation: None,
        }
    }
}
