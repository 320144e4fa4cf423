//! Shared integration test helpers for chromesync.
//!
//! Include with `mod common;` at the top of a test file. Unused helpers are
//! allowed since each test binary only uses a subset.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use chromesync::config::ConfigLoader;

/// Environment of a typical Windows user, enough to resolve every
/// placeholder in the shipped template.
pub fn windows_env() -> HashMap<String, String> {
    env(&[
        ("PROGRAMFILES", r"C:\Program Files"),
        ("LOCALAPPDATA", r"C:\Users\ada\AppData\Local"),
        ("APPDATA", r"C:\Users\ada\AppData\Roaming"),
        ("TEMP", r"C:\Users\ada\AppData\Local\Temp"),
    ])
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn loader() -> ConfigLoader<HashMap<String, String>> {
    ConfigLoader::with_environment(windows_env())
}

/// Environment whose placeholders all point inside `root`, so that browser
/// and log paths can exist on disk during a test.
pub fn env_rooted_at(root: &Path) -> HashMap<String, String> {
    let root = root.display().to_string();
    env(&[
        ("PROGRAMFILES", &root),
        ("LOCALAPPDATA", &root),
        ("APPDATA", &root),
        ("TEMP", &root),
    ])
}
