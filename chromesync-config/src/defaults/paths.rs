//! Host-resolved default paths.
//!
//! Mirrors the placeholders in the template: `%PROGRAMFILES%`,
//! `%LOCALAPPDATA%`, `%APPDATA%` and `%TEMP%`. Variables are read from the
//! given [`Environment`]. When one is unset the platform directory from
//! `dirs` stands in, and program locations are left empty.

use std::path::PathBuf;

use super::{APP_DIR_NAME, CONFIG_FILE_NAME};
use crate::config::Environment;

/// `%NAME%\rest` spelled the way the template spells it, or `base/rest` when
/// the variable is unset.
fn under(env: &dyn Environment, name: &str, rest: &[&str], base: Option<PathBuf>) -> PathBuf {
    if let Some(mut dir) = env.var(name).filter(|v| !v.is_empty()) {
        for part in rest {
            dir.push('\\');
            dir.push_str(part);
        }
        return PathBuf::from(dir);
    }
    match base {
        Some(base) => rest.iter().fold(base, |path, part| path.join(part)),
        None => PathBuf::new(),
    }
}

pub fn chrome_path(env: &dyn Environment) -> PathBuf {
    under(
        env,
        "PROGRAMFILES",
        &["Google", "Chrome", "Application", "chrome.exe"],
        None,
    )
}

pub fn chrome_user_data_dir(env: &dyn Environment) -> PathBuf {
    under(
        env,
        "LOCALAPPDATA",
        &["Google", "Chrome", "User Data"],
        dirs::data_local_dir(),
    )
}

pub fn zen_path(env: &dyn Environment) -> PathBuf {
    under(env, "PROGRAMFILES", &["Zen Browser", "zen.exe"], None)
}

pub fn zen_user_data_dir(env: &dyn Environment) -> PathBuf {
    under(env, "APPDATA", &["zen"], dirs::config_dir())
}

/// Scratch directory for exported browser data.
pub fn temp_dir(env: &dyn Environment) -> PathBuf {
    under(env, "TEMP", &[APP_DIR_NAME], Some(std::env::temp_dir()))
}

pub fn logs_dir(env: &dyn Environment) -> PathBuf {
    under(
        env,
        "LOCALAPPDATA",
        &[APP_DIR_NAME, "logs"],
        Some(dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))),
    )
}

/// Directory holding the user's config file (`%APPDATA%\ChromeSync` on
/// Windows, `~/.config/ChromeSync` on Linux).
pub fn config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR_NAME),
        None => PathBuf::from("."),
    }
}

/// Default location of the user's config file.
///
/// `CHROMESYNC_CONFIG` in `env` overrides the platform location.
pub fn config_file(env: &dyn Environment) -> PathBuf {
    if let Some(path) = env.var("CHROMESYNC_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    config_dir().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_file_override() {
        let mut env: HashMap<String, String> = HashMap::new();
        assert!(config_file(&env).ends_with("ChromeSync/config.json"));

        env.insert("CHROMESYNC_CONFIG".to_string(), "/srv/sync.yaml".to_string());
        assert_eq!(config_file(&env), PathBuf::from("/srv/sync.yaml"));

        env.insert("CHROMESYNC_CONFIG".to_string(), String::new());
        assert!(config_file(&env).ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_paths_follow_environment() {
        let env: HashMap<String, String> = [
            ("PROGRAMFILES", r"D:\Apps"),
            ("LOCALAPPDATA", r"D:\Local"),
            ("TEMP", r"D:\Tmp"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(
            chrome_path(&env),
            PathBuf::from(r"D:\Apps\Google\Chrome\Application\chrome.exe")
        );
        assert_eq!(zen_path(&env), PathBuf::from(r"D:\Apps\Zen Browser\zen.exe"));
        assert_eq!(logs_dir(&env), PathBuf::from(r"D:\Local\ChromeSync\logs"));
        assert_eq!(temp_dir(&env), PathBuf::from(r"D:\Tmp\ChromeSync"));
    }

    #[test]
    fn test_unset_program_files_leaves_program_paths_empty() {
        let env: HashMap<String, String> = HashMap::new();
        assert_eq!(chrome_path(&env), PathBuf::new());
        assert_eq!(zen_path(&env), PathBuf::new());
        assert!(temp_dir(&env).ends_with(APP_DIR_NAME));
    }
}
