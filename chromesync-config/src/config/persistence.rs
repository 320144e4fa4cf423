//! On-disk config file management.
//!
//! [`ConfigStore`] owns the config file and the current [`Config`] snapshot.
//! Readers take cheap `Arc` snapshots through [`ConfigStore::current`] while
//! `reload`, `save` and friends swap in new values atomically.
//!
//! Each snapshot keeps the document it was loaded from. Saving writes
//! string fields back in that unexpanded form when they are unchanged, so
//! `%TEMP%` stays `%TEMP%`; any other `%` is written as `%%`.
//!
//! Writes go to a sibling temp file that is then renamed over the target, so
//! a crash never leaves a half-written config behind. A file that fails to
//! load is copied to `<file>.<YYYYmmdd_HHMMSS>.bak` before it is replaced,
//! and backups beyond `storage.max_backups` are pruned oldest first.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use super::config_struct::Config;
use super::document::DocumentFormat;
use super::loader::{ConfigLoader, Loaded};
use super::placeholders::{Environment, ProcessEnvironment};
use crate::error::{ConfigError, FieldError};

/// How [`ConfigStore::open`] obtained its initial config.
#[derive(Debug)]
pub enum Opened {
    /// The existing file loaded cleanly (possibly with defaulted fields).
    Loaded { warnings: Vec<FieldError> },
    /// No file existed; the template was written.
    Created,
    /// The existing file was unusable. It was backed up and replaced with
    /// the template.
    Recovered { backup: PathBuf, error: ConfigError },
}

/// A config together with the unexpanded document it came from.
struct Snapshot {
    config: Arc<Config>,
    document: Value,
}

impl Snapshot {
    fn new(config: Config, document: Value) -> Self {
        Self {
            config: Arc::new(config),
            document,
        }
    }
}

impl From<Loaded> for Snapshot {
    fn from(loaded: Loaded) -> Self {
        Self::new(loaded.config, loaded.document)
    }
}

pub struct ConfigStore<E = ProcessEnvironment> {
    path: PathBuf,
    format: DocumentFormat,
    loader: ConfigLoader<E>,
    current: ArcSwap<Snapshot>,
    opened: Opened,
}

impl<E> std::fmt::Debug for ConfigStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl<E: Environment> ConfigStore<E> {
    /// Open the config file at `path`, creating or recovering it as needed.
    ///
    /// The document format follows the file extension.
    ///
    /// # Errors
    ///
    /// I/O failures, and load failures of the template itself (for example a
    /// placeholder the environment cannot resolve).
    pub fn open(path: impl Into<PathBuf>, loader: ConfigLoader<E>) -> Result<Self, ConfigError> {
        let path = path.into();
        let format = DocumentFormat::for_path(&path);
        log::info!("Config path: {:?}", path);

        let (snapshot, opened) = if path.exists() {
            match loader.load_file(&path) {
                Ok(mut loaded) => {
                    let warnings = std::mem::take(&mut loaded.warnings);
                    (Snapshot::from(loaded), Opened::Loaded { warnings })
                }
                Err(error) if error.is_document_error() => {
                    log::error!("Config file {:?} is unusable: {error}", path);
                    let backup = create_backup(&path)?;
                    write_template(&path, &loader, format)?;
                    let defaults = Snapshot::from(loader.load_defaults()?);
                    prune_backups(&path, defaults.config.storage.max_backups as usize)?;
                    log::warn!("Restored default config; previous file kept at {:?}", backup);
                    (defaults, Opened::Recovered { backup, error })
                }
                Err(error) => return Err(error),
            }
        } else {
            log::info!("Config file not found, creating default at {:?}", path);
            write_template(&path, &loader, format)?;
            (Snapshot::from(loader.load_defaults()?), Opened::Created)
        };

        Ok(Self {
            path,
            format,
            loader,
            current: ArcSwap::from_pointee(snapshot),
            opened,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn loader(&self) -> &ConfigLoader<E> {
        &self.loader
    }

    /// Outcome of [`Self::open`].
    pub fn opened(&self) -> &Opened {
        &self.opened
    }

    /// Current config snapshot.
    pub fn current(&self) -> Arc<Config> {
        Arc::clone(&self.current.load().config)
    }

    /// Re-read the file. On failure the previous snapshot stays current.
    ///
    /// Returns the fields that were replaced by defaults, if any.
    pub fn reload(&self) -> Result<Vec<FieldError>, ConfigError> {
        match self.loader.load_file(&self.path) {
            Ok(mut loaded) => {
                let warnings = std::mem::take(&mut loaded.warnings);
                self.current.store(Arc::new(Snapshot::from(loaded)));
                log::info!("Config reloaded from {:?}", self.path);
                Ok(warnings)
            }
            Err(e) => {
                log::error!("Config reload failed, keeping previous config: {e}");
                Err(e)
            }
        }
    }

    /// Validate `config`, write it to the file and make it current.
    pub fn save(&self, config: Config) -> Result<Arc<Config>, ConfigError> {
        let source = self.current.load_full();
        self.save_from(config, &source.document)
    }

    /// Save `config`, taking unexpanded string values from `source`.
    fn save_from(&self, config: Config, source: &Value) -> Result<Arc<Config>, ConfigError> {
        config.validate()?;
        let document = self.to_document(&config, source, self.format)?;
        write_atomic(&self.path, &self.format.render(&document)?)?;

        let snapshot = Snapshot::new(config, document);
        let config = Arc::clone(&snapshot.config);
        self.current.store(Arc::new(snapshot));
        log::debug!("Config saved to {:?}", self.path);
        Ok(config)
    }

    /// Apply `edit` to a copy of the current config and save it.
    ///
    /// If the edited config is invalid nothing is written and the current
    /// config is unchanged. Concurrent updates are last-writer-wins.
    pub fn update<F>(&self, edit: F) -> Result<Arc<Config>, ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = Config::clone(&self.current());
        edit(&mut config);
        self.save(config)
    }

    /// Replace the file with the template and load it.
    pub fn reset(&self) -> Result<Arc<Config>, ConfigError> {
        write_template(&self.path, &self.loader, self.format)?;
        let snapshot = Snapshot::from(self.loader.load_defaults()?);
        let config = Arc::clone(&snapshot.config);
        self.current.store(Arc::new(snapshot));
        log::info!("Config reset to defaults");
        Ok(config)
    }

    /// Write the current config to `path` in the format its extension implies.
    ///
    /// Unless `include_sensitive` is set, password sync is written as off.
    pub fn export(&self, path: &Path, include_sensitive: bool) -> Result<(), ConfigError> {
        let current = self.current.load_full();
        let config = if include_sensitive {
            Config::clone(&current.config)
        } else {
            current.config.without_sensitive_data()
        };

        let format = DocumentFormat::for_path(path);
        let document = self.to_document(&config, &current.document, format)?;
        write_atomic(path, &format.render(&document)?)?;
        log::info!("Config exported to {:?}", path);
        Ok(())
    }

    /// Load and validate the file at `path`, back up the current file, then
    /// save the imported config in its place.
    pub fn import(&self, path: &Path) -> Result<Arc<Config>, ConfigError> {
        let loaded = self.loader.load_file(path)?;
        if self.path.exists() {
            let backup = create_backup(&self.path)?;
            log::info!("Previous config backed up to {:?}", backup);
        }
        let config = self.save_from(loaded.config, &loaded.document)?;
        prune_backups(&self.path, config.storage.max_backups as usize)?;
        log::info!("Config imported from {:?}", path);
        Ok(config)
    }

    /// Build a document that loads back to `config`.
    ///
    /// String fields whose `source` text still expands to the current value
    /// keep that text; other strings have `%` escaped. Browsers present in
    /// the template but removed from `config` are written as `null` so the
    /// merge does not bring them back. TOML has no `null`, so in TOML such a
    /// removal is lost.
    fn to_document(
        &self,
        config: &Config,
        source: &Value,
        format: DocumentFormat,
    ) -> Result<Value, ConfigError> {
        let mut document = serde_json::to_value(config).map_err(|e| ConfigError::Serialize {
            format,
            message: e.to_string(),
        })?;
        self.restore_unexpanded(&mut document, Some(source));

        let (template, template_format) = self.loader.template();
        let template = template_format.parse(template)?;
        if let (Some(Value::Object(defaults)), Some(Value::Object(browsers))) =
            (template.get("browsers"), document.get_mut("browsers"))
        {
            for name in defaults.keys() {
                if browsers.contains_key(name) {
                    continue;
                }
                if format == DocumentFormat::Toml {
                    log::warn!("TOML cannot record the removal of browser '{name}'");
                } else {
                    browsers.insert(name.clone(), Value::Null);
                }
            }
        }

        Ok(document)
    }

    fn restore_unexpanded(&self, value: &mut Value, source: Option<&Value>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let source = source.and_then(|s| s.get(key.as_str()));
                    self.restore_unexpanded(child, source);
                }
            }
            Value::String(text) => {
                if let Some(Value::String(raw)) = source
                    && self.loader.expands_to(raw, text)
                {
                    *text = raw.clone();
                } else if text.contains('%') {
                    *text = text.replace('%', "%%");
                }
            }
            _ => {}
        }
    }
}

/// Write the template to `path`, converted to `format`. Placeholders are
/// kept as tokens.
fn write_template<E: Environment>(
    path: &Path,
    loader: &ConfigLoader<E>,
    format: DocumentFormat,
) -> Result<(), ConfigError> {
    let (template, template_format) = loader.template();
    let text = if template_format == format {
        template.to_string()
    } else {
        format.render(&template_format.parse(template)?)?
    };
    write_atomic(path, &text)
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let temp_path = sibling_with_suffix(path, ".tmp");
    fs::write(&temp_path, contents).map_err(|e| ConfigError::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::io(path, e))
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Copy `path` to `<path>.<YYYYmmdd_HHMMSS>.bak` and return the backup path.
pub(crate) fn create_backup(path: &Path) -> Result<PathBuf, ConfigError> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut backup = sibling_with_suffix(path, &format!(".{stamp}.bak"));
    let mut n = 1;
    while backup.exists() {
        backup = sibling_with_suffix(path, &format!(".{stamp}_{n}.bak"));
        n += 1;
    }

    fs::copy(path, &backup).map_err(|e| ConfigError::io(&backup, e))?;
    log::info!("Backed up {:?} to {:?}", path, backup);
    Ok(backup)
}

/// Backups of `path`, oldest first.
pub fn list_backups(path: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{file_name}.");
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ConfigError::io(dir, e)),
    };

    let mut backups: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".bak"))
        })
        .collect();
    // Timestamps sort lexically.
    backups.sort();
    Ok(backups)
}

/// Delete the oldest backups of `path` so that at most `keep` remain.
pub(crate) fn prune_backups(path: &Path, keep: usize) -> Result<(), ConfigError> {
    let backups = list_backups(path)?;
    let excess = backups.len().saturating_sub(keep);
    for old in &backups[..excess] {
        fs::remove_file(old).map_err(|e| ConfigError::io(old, e))?;
        log::debug!("Removed old config backup {:?}", old);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env() -> HashMap<String, String> {
        [
            ("PROGRAMFILES", "/opt"),
            ("LOCALAPPDATA", "/home/ada/.local/share"),
            ("APPDATA", "/home/ada/.config"),
            ("TEMP", "/tmp"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn open(path: &Path) -> ConfigStore<HashMap<String, String>> {
        ConfigStore::open(path, ConfigLoader::with_environment(env())).expect("Failed to open store")
    }

    #[test]
    fn test_open_creates_template() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("nested").join("config.json");

        let store = open(&path);
        assert!(matches!(store.opened(), Opened::Created));
        let written = fs::read_to_string(&path).expect("Failed to read config");
        assert!(written.contains("%TEMP%"));
        assert_eq!(store.current().storage.temp_dir, PathBuf::from("/tmp\\ChromeSync"));
    }

    #[test]
    fn test_open_recovers_malformed_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(&path, "{ broken").expect("Failed to write config");

        let store = open(&path);
        let Opened::Recovered { backup, error } = store.opened() else {
            panic!("expected recovery, got {:?}", store.opened());
        };
        assert!(matches!(error, ConfigError::Malformed { .. }));
        assert_eq!(fs::read_to_string(backup).expect("Failed to read backup"), "{ broken");
        assert_eq!(*store.current(), ConfigLoader::with_environment(env()).load_defaults().unwrap().config);
    }

    #[test]
    fn test_open_propagates_io_errors() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        // A directory where the file should be.
        let path = temp.path().join("config.json");
        fs::create_dir(&path).expect("Failed to create dir");

        let err = ConfigStore::open(&path, ConfigLoader::with_environment(env())).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);

        let saved = store
            .update(|c| {
                c.gui.start_minimized = true;
                c.browsers.remove("zen");
            })
            .expect("Failed to update");
        assert!(store.reload().expect("Failed to reload").is_empty());
        assert_eq!(*store.current(), *saved);
        assert!(!store.current().browsers.contains_key("zen"));
    }

    #[test]
    fn test_update_keeps_escaped_percent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"browsers": {"chrome": {"profile": "Work%%PATH%%"}}}"#)
            .expect("Failed to write config");
        let store = open(&path);
        assert_eq!(store.current().browsers["chrome"].profile, "Work%PATH%");

        store
            .update(|c| c.gui.start_minimized = true)
            .expect("Failed to update");
        let text = fs::read_to_string(&path).expect("Failed to read config");
        assert!(text.contains("Work%%PATH%%"));

        store.reload().expect("Failed to reload");
        assert!(store.current().gui.start_minimized);
        let reopened = open(&path);
        assert!(matches!(reopened.opened(), Opened::Loaded { .. }));
        assert_eq!(reopened.current().browsers["chrome"].profile, "Work%PATH%");
        assert!(reopened.current().gui.start_minimized);
    }

    #[test]
    fn test_update_keeps_placeholder_tokens() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);

        store
            .update(|c| c.storage.retention_days = 7)
            .expect("Failed to update");
        let text = fs::read_to_string(&path).expect("Failed to read config");
        assert!(text.contains(r#""%TEMP%\\ChromeSync""#));
        assert!(text.contains("%PROGRAMFILES%"));
        assert!(!text.contains("/home/ada"));
    }

    #[test]
    fn test_edited_value_with_percent_is_escaped() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);

        store
            .update(|c| c.storage.temp_dir = PathBuf::from("/srv/100%/%TEMP%"))
            .expect("Failed to update");
        store.reload().expect("Failed to reload");
        assert_eq!(
            store.current().storage.temp_dir,
            PathBuf::from("/srv/100%/%TEMP%")
        );
    }

    #[test]
    fn test_invalid_update_is_not_applied() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);
        let before = fs::read_to_string(&path).expect("Failed to read config");

        let err = store
            .update(|c| c.sync.schedule.interval_hours = 0)
            .unwrap_err();
        assert_eq!(err.field_errors()[0].path.as_str(), "sync.schedule.interval_hours");
        assert_eq!(store.current().sync.schedule.interval_hours, 24);
        assert_eq!(fs::read_to_string(&path).expect("Failed to read config"), before);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);

        fs::write(&path, r#"{"gui": {"theme": "purple"}}"#).expect("Failed to write config");
        assert!(store.reload().is_err());
        assert_eq!(store.current().gui.theme, crate::types::Theme::System);
    }

    #[test]
    fn test_yaml_store_writes_yaml() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.yaml");
        let store = open(&path);
        store
            .update(|c| c.logs.level = crate::types::LogLevel::Debug)
            .expect("Failed to update");

        let text = fs::read_to_string(&path).expect("Failed to read config");
        assert!(text.contains("level: DEBUG"));
        store.reload().expect("Failed to reload");
        assert_eq!(store.current().logs.level, crate::types::LogLevel::Debug);
    }

    #[test]
    fn test_export_masks_passwords() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let store = open(&temp.path().join("config.json"));
        assert!(store.current().sync.data_types.passwords);

        let shared = temp.path().join("shared.json");
        store.export(&shared, false).expect("Failed to export");
        let loaded = store.loader().load_file(&shared).expect("Failed to load export");
        assert!(!loaded.config.sync.data_types.passwords);

        let full = temp.path().join("full.toml");
        store.export(&full, true).expect("Failed to export");
        let loaded = store.loader().load_file(&full).expect("Failed to load export");
        assert_eq!(loaded.config, *store.current());
    }

    #[test]
    fn test_import_backs_up_and_prunes() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);

        let incoming = temp.path().join("incoming.json");
        fs::write(&incoming, r#"{"storage": {"max_backups": 1}, "gui": {"theme": "dark"}}"#)
            .expect("Failed to write import");

        store.import(&incoming).expect("Failed to import");
        store.import(&incoming).expect("Failed to import");
        assert_eq!(store.current().gui.theme, crate::types::Theme::Dark);
        assert_eq!(list_backups(&path).expect("Failed to list backups").len(), 1);
    }

    #[test]
    fn test_invalid_import_leaves_file_alone() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);

        let incoming = temp.path().join("incoming.json");
        fs::write(&incoming, r#"{"logs": {"max_size_mb": 0}}"#).expect("Failed to write import");
        assert!(store.import(&incoming).is_err());
        assert!(list_backups(&path).expect("Failed to list backups").is_empty());
    }

    #[test]
    fn test_reset_restores_template() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        let store = open(&path);
        store.update(|c| c.general.auto_start = false).expect("Failed to update");

        store.reset().expect("Failed to reset");
        assert!(store.current().general.auto_start);
        assert!(fs::read_to_string(&path).expect("Failed to read").contains("%PROGRAMFILES%"));
    }
}
