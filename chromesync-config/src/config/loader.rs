//! Parse, merge, expand and validate a configuration document.
//!
//! Loading is a pure function of the template, the optional override
//! document and the environment:
//!
//! 1. Parse the template and the override into document trees.
//! 2. Deep-merge the override over the template
//!    (see [`merge_documents`](super::document::merge_documents)).
//! 3. Walk the merged tree section by section, reading each field with its
//!    type, range, enum or format check and expanding `%NAME%` placeholders
//!    in path and profile strings.
//! 4. Either return the typed [`Config`] or every field error found.
//!
//! Nothing is written and nothing is started.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use super::config_struct::{
    AutoSyncConfig, BrowserConfig, Config, DataTypesConfig, GeneralConfig, GuiConfig, LogsConfig,
    ScheduleConfig, SecurityConfig, StorageConfig, SyncConfig,
};
use super::document::{DocumentFormat, json_type_name, merge_documents};
use super::placeholders::{Environment, PlaceholderScope, ProcessEnvironment, expand_placeholders};
use super::validation::{
    DELAY_SECONDS, IDLE_TIME_MINUTES, INTERVAL_HOURS, MAX_BACKUPS, MAX_SIZE_MB,
    NOTIFICATION_TIMEOUT_SEC, RETENTION_DAYS, ROTATION_COUNT, check_range,
};
use crate::defaults;
use crate::error::{ConfigError, FieldError, FieldErrorKind, FieldPath};

/// What to do with a field that fails its check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidFieldPolicy {
    /// Fail the load, reporting every invalid field.
    #[default]
    Reject,
    /// Log a warning, use the built-in default for that field only and carry
    /// on. Malformed documents and strict-mode unknown fields still fail.
    UseDefault,
}

/// Loader switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Reject fields that are not part of the schema instead of ignoring them.
    pub strict: bool,
    pub invalid_fields: InvalidFieldPolicy,
    pub placeholders: PlaceholderScope,
}

/// A successfully loaded configuration.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: Config,
    /// Fields replaced by their defaults under [`InvalidFieldPolicy::UseDefault`].
    pub warnings: Vec<FieldError>,
    /// The merged document before placeholder expansion.
    pub document: Value,
}

/// Builds [`Config`] values from the template plus an optional override.
#[derive(Debug, Clone)]
pub struct ConfigLoader<E = ProcessEnvironment> {
    env: E,
    options: LoadOptions,
    template: Cow<'static, str>,
    template_format: DocumentFormat,
}

impl ConfigLoader<ProcessEnvironment> {
    /// Loader backed by the process environment and the built-in template.
    pub fn new() -> Self {
        Self::with_environment(ProcessEnvironment)
    }
}

impl Default for ConfigLoader<ProcessEnvironment> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> ConfigLoader<E> {
    pub fn with_environment(env: E) -> Self {
        Self {
            env,
            options: LoadOptions::default(),
            template: Cow::Borrowed(defaults::TEMPLATE),
            template_format: DocumentFormat::Json,
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Replace the built-in template.
    pub fn with_template(mut self, text: impl Into<Cow<'static, str>>, format: DocumentFormat) -> Self {
        self.template = text.into();
        self.template_format = format;
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Template text and its format.
    pub fn template(&self) -> (&str, DocumentFormat) {
        (&self.template, self.template_format)
    }

    /// Load the template on its own.
    pub fn load_defaults(&self) -> Result<Loaded, ConfigError> {
        self.load_merged(None)
    }

    /// Load the template with `text` merged over it.
    pub fn load_str(&self, text: &str, format: DocumentFormat) -> Result<Loaded, ConfigError> {
        let overlay = format.parse(text)?;
        self.load_merged(Some(overlay))
    }

    pub fn load_bytes(&self, bytes: &[u8], format: DocumentFormat) -> Result<Loaded, ConfigError> {
        let overlay = format.parse_bytes(bytes)?;
        self.load_merged(Some(overlay))
    }

    /// Load the template with the file at `path` merged over it. The format
    /// follows the file extension (JSON when unrecognised).
    pub fn load_file(&self, path: &Path) -> Result<Loaded, ConfigError> {
        log::info!("Loading config from {:?}", path);
        let bytes = std::fs::read(path).map_err(|e| ConfigError::io(path, e))?;
        self.load_bytes(&bytes, DocumentFormat::for_path(path))
    }

    /// Whether `raw` loads as `value` when read into a string or path field.
    pub(crate) fn expands_to(&self, raw: &str, value: &str) -> bool {
        match expand_placeholders(raw, &self.env, self.options.placeholders) {
            Ok(expanded) => expanded == value || expand_home_dir(&expanded) == Path::new(value),
            Err(_) => false,
        }
    }

    /// Values used for fields that fail under [`InvalidFieldPolicy::UseDefault`]:
    /// the template read against this loader's environment, with the
    /// built-in defaults standing in for template fields that cannot be read.
    fn fallback(&self, template: &Value) -> Config {
        let base = Config::for_environment(&self.env);
        let Value::Object(root) = template else {
            return base;
        };

        let mut reader = Reader {
            options: LoadOptions {
                strict: false,
                invalid_fields: InvalidFieldPolicy::Reject,
                placeholders: self.options.placeholders,
            },
            env: &self.env,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        let config = reader.config(root, &base);
        if !reader.errors.is_empty() {
            log::debug!(
                "Template has {} unusable field(s); built-in defaults stand in",
                reader.errors.len()
            );
        }
        config
    }

    fn load_merged(&self, overlay: Option<Value>) -> Result<Loaded, ConfigError> {
        let template = self.template_format.parse(&self.template)?;
        let mut document = template.clone();
        if let Some(overlay) = overlay {
            merge_documents(&mut document, overlay);
        }

        let Value::Object(root) = &document else {
            return Err(ConfigError::Malformed {
                format: self.template_format,
                message: "top level must be a mapping of sections".to_string(),
            });
        };

        let defaults = match self.options.invalid_fields {
            InvalidFieldPolicy::UseDefault => self.fallback(&template),
            InvalidFieldPolicy::Reject => Config::for_environment(&self.env),
        };
        let mut reader = Reader {
            options: self.options,
            env: &self.env,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        let config = reader.config(root, &defaults);

        if !reader.errors.is_empty() {
            log::debug!("Config rejected with {} field error(s)", reader.errors.len());
            return Err(reader.errors.into());
        }

        log::debug!(
            "Config loaded: {} browser(s), {} field(s) defaulted",
            config.browsers.len(),
            reader.warnings.len()
        );
        Ok(Loaded {
            config,
            warnings: reader.warnings,
            document,
        })
    }
}

/// A mapping in the document, or `None` when it is absent or unusable (the
/// problem has already been reported and its fields fall back silently).
struct Node<'v> {
    path: FieldPath,
    map: Option<&'v Map<String, Value>>,
}

struct Reader<'a> {
    options: LoadOptions,
    env: &'a dyn Environment,
    errors: Vec<FieldError>,
    warnings: Vec<FieldError>,
}

impl Reader<'_> {
    fn report(&mut self, error: FieldError) {
        match self.options.invalid_fields {
            InvalidFieldPolicy::Reject => self.errors.push(error),
            InvalidFieldPolicy::UseDefault => {
                log::warn!("{error}; using the built-in default");
                self.warnings.push(error);
            }
        }
    }

    fn wrong_type(&mut self, path: FieldPath, expected: &'static str, found: &Value) {
        self.report(FieldError::new(
            path,
            FieldErrorKind::WrongType {
                expected,
                found: json_type_name(found),
            },
        ));
    }

    fn config(&mut self, root: &Map<String, Value>, defaults: &Config) -> Config {
        let root = Node {
            path: FieldPath::root(),
            map: Some(root),
        };

        let config = Config {
            general: self.general(&root, &defaults.general),
            browsers: self.browsers(&root, &defaults.browsers),
            sync: self.sync(&root, &defaults.sync),
            security: self.security(&root, &defaults.security),
            storage: self.storage(&root, &defaults.storage),
            logs: self.logs(&root, &defaults.logs),
            gui: self.gui(&root, &defaults.gui),
        };
        self.finish(&root, Config::SECTIONS);
        config
    }

    // ── Sections ───────────────────────────────────────────────────────────

    fn general(&mut self, root: &Node<'_>, d: &GeneralConfig) -> GeneralConfig {
        let node = self.section(root, "general");
        let general = GeneralConfig {
            auto_start: self.bool(&node, "auto_start", d.auto_start),
            minimize_to_tray: self.bool(&node, "minimize_to_tray", d.minimize_to_tray),
            check_for_updates: self.bool(&node, "check_for_updates", d.check_for_updates),
            sync_on_startup: self.bool(&node, "sync_on_startup", d.sync_on_startup),
            language: self.parsed(&node, "language", d.language.clone()),
        };
        self.finish(&node, GeneralConfig::FIELDS);
        general
    }

    fn browsers(
        &mut self,
        root: &Node<'_>,
        defaults: &BTreeMap<String, BrowserConfig>,
    ) -> BTreeMap<String, BrowserConfig> {
        let node = self.section(root, "browsers");
        let Some(map) = node.map else {
            return defaults.clone();
        };

        let mut browsers = BTreeMap::new();
        for (name, value) in map {
            let path = node.path.child(name);
            let d = defaults.get(name).cloned().unwrap_or_default();

            let Value::Object(fields) = value else {
                self.wrong_type(path, "mapping", value);
                browsers.insert(name.clone(), d);
                continue;
            };
            let entry = Node {
                path,
                map: Some(fields),
            };

            let browser = BrowserConfig {
                path: self.path(&entry, "path", d.path),
                user_data_dir: self.path(&entry, "user_data_dir", d.user_data_dir),
                profile: self.text(&entry, "profile", d.profile),
                use_gui_automation: self.optional_bool(
                    &entry,
                    "use_gui_automation",
                    d.use_gui_automation,
                ),
            };
            self.finish(&entry, BrowserConfig::FIELDS);
            browsers.insert(name.clone(), browser);
        }

        if browsers.is_empty() {
            log::warn!("No browsers configured; there is nothing to synchronize");
        }
        browsers
    }

    fn sync(&mut self, root: &Node<'_>, d: &SyncConfig) -> SyncConfig {
        let node = self.section(root, "sync");

        let types = self.section(&node, "data_types");
        let data_types = DataTypesConfig {
            passwords: self.bool(&types, "passwords", d.data_types.passwords),
            bookmarks: self.bool(&types, "bookmarks", d.data_types.bookmarks),
            history: self.bool(&types, "history", d.data_types.history),
        };
        self.finish(&types, DataTypesConfig::FIELDS);

        let sched = self.section(&node, "schedule");
        let ds = &d.schedule;
        let schedule = ScheduleConfig {
            enabled: self.bool(&sched, "enabled", ds.enabled),
            interval_hours: self.bounded(&sched, "interval_hours", &INTERVAL_HOURS, ds.interval_hours),
            specific_time: self.parsed(&sched, "specific_time", ds.specific_time),
            sync_when_idle: self.bool(&sched, "sync_when_idle", ds.sync_when_idle),
            idle_time_minutes: self.bounded(
                &sched,
                "idle_time_minutes",
                &IDLE_TIME_MINUTES,
                ds.idle_time_minutes,
            ),
        };
        self.finish(&sched, ScheduleConfig::FIELDS);

        let auto = self.section(&node, "auto_sync");
        let da = &d.auto_sync;
        let auto_sync = AutoSyncConfig {
            enabled: self.bool(&auto, "enabled", da.enabled),
            trigger_on_chrome_launch: self.bool(
                &auto,
                "trigger_on_chrome_launch",
                da.trigger_on_chrome_launch,
            ),
            trigger_on_chrome_close: self.bool(
                &auto,
                "trigger_on_chrome_close",
                da.trigger_on_chrome_close,
            ),
            delay_seconds: self.bounded(&auto, "delay_seconds", &DELAY_SECONDS, da.delay_seconds),
        };
        self.finish(&auto, AutoSyncConfig::FIELDS);

        self.finish(&node, SyncConfig::FIELDS);
        SyncConfig {
            data_types,
            schedule,
            auto_sync,
        }
    }

    fn security(&mut self, root: &Node<'_>, d: &SecurityConfig) -> SecurityConfig {
        let node = self.section(root, "security");
        let security = SecurityConfig {
            encrypt_temp_files: self.bool(&node, "encrypt_temp_files", d.encrypt_temp_files),
            require_auth_for_sensitive_ops: self.bool(
                &node,
                "require_auth_for_sensitive_ops",
                d.require_auth_for_sensitive_ops,
            ),
            secure_delete_temp_files: self.bool(
                &node,
                "secure_delete_temp_files",
                d.secure_delete_temp_files,
            ),
            log_sensitive_operations: self.bool(
                &node,
                "log_sensitive_operations",
                d.log_sensitive_operations,
            ),
        };
        self.finish(&node, SecurityConfig::FIELDS);
        security
    }

    fn storage(&mut self, root: &Node<'_>, d: &StorageConfig) -> StorageConfig {
        let node = self.section(root, "storage");
        let storage = StorageConfig {
            temp_dir: self.path(&node, "temp_dir", d.temp_dir.clone()),
            retention_days: self.bounded(&node, "retention_days", &RETENTION_DAYS, d.retention_days),
            max_backups: self.bounded(&node, "max_backups", &MAX_BACKUPS, d.max_backups),
        };
        self.finish(&node, StorageConfig::FIELDS);
        storage
    }

    fn logs(&mut self, root: &Node<'_>, d: &LogsConfig) -> LogsConfig {
        let node = self.section(root, "logs");
        let logs = LogsConfig {
            dir: self.path(&node, "dir", d.dir.clone()),
            level: self.parsed(&node, "level", d.level),
            max_size_mb: self.bounded(&node, "max_size_mb", &MAX_SIZE_MB, d.max_size_mb),
            rotation_count: self.bounded(&node, "rotation_count", &ROTATION_COUNT, d.rotation_count),
            include_timestamps: self.bool(&node, "include_timestamps", d.include_timestamps),
        };
        self.finish(&node, LogsConfig::FIELDS);
        logs
    }

    fn gui(&mut self, root: &Node<'_>, d: &GuiConfig) -> GuiConfig {
        let node = self.section(root, "gui");
        let gui = GuiConfig {
            theme: self.parsed(&node, "theme", d.theme),
            start_minimized: self.bool(&node, "start_minimized", d.start_minimized),
            show_notifications: self.bool(&node, "show_notifications", d.show_notifications),
            notification_timeout_sec: self.bounded(
                &node,
                "notification_timeout_sec",
                &NOTIFICATION_TIMEOUT_SEC,
                d.notification_timeout_sec,
            ),
            confirm_actions: self.bool(&node, "confirm_actions", d.confirm_actions),
        };
        self.finish(&node, GuiConfig::FIELDS);
        gui
    }

    // ── Structure ──────────────────────────────────────────────────────────

    fn section<'v>(&mut self, parent: &Node<'v>, key: &str) -> Node<'v> {
        let path = parent.path.child(key);
        let Some(map) = parent.map else {
            return Node { path, map: None };
        };

        match map.get(key) {
            Some(Value::Object(fields)) => Node {
                path,
                map: Some(fields),
            },
            None | Some(Value::Null) => {
                self.report(FieldError::new(path.clone(), FieldErrorKind::Missing));
                Node { path, map: None }
            }
            Some(other) => {
                self.wrong_type(path.clone(), "mapping", other);
                Node { path, map: None }
            }
        }
    }

    /// Report keys of `node` that are not in `known`.
    fn finish(&mut self, node: &Node<'_>, known: &[&str]) {
        let Some(map) = node.map else {
            return;
        };
        for key in map.keys() {
            if known.contains(&key.as_str()) {
                continue;
            }
            let path = node.path.child(key);
            if self.options.strict {
                self.errors
                    .push(FieldError::new(path, FieldErrorKind::UnknownField));
            } else {
                log::debug!("Ignoring unknown config field {path}");
            }
        }
    }

    // ── Leaves ─────────────────────────────────────────────────────────────

    /// Present, non-null value of a required field. Reports a missing field.
    fn leaf<'v>(&mut self, node: &Node<'v>, key: &str) -> Option<(FieldPath, &'v Value)> {
        let map = node.map?;
        let path = node.path.child(key);
        match map.get(key) {
            None | Some(Value::Null) => {
                self.report(FieldError::new(path, FieldErrorKind::Missing));
                None
            }
            Some(value) => Some((path, value)),
        }
    }

    fn bool(&mut self, node: &Node<'_>, key: &str, default: bool) -> bool {
        let Some((path, value)) = self.leaf(node, key) else {
            return default;
        };
        match value {
            Value::Bool(b) => *b,
            other => {
                self.wrong_type(path, "boolean", other);
                default
            }
        }
    }

    /// Optional flag: absent or `null` means unset.
    fn optional_bool(&mut self, node: &Node<'_>, key: &str, default: Option<bool>) -> Option<bool> {
        let Some(map) = node.map else {
            return default;
        };
        match map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                self.wrong_type(node.path.child(key), "boolean", other);
                default
            }
        }
    }

    /// Integer field constrained to `bounds`. Never clamps.
    fn bounded(
        &mut self,
        node: &Node<'_>,
        key: &str,
        bounds: &RangeInclusive<u32>,
        default: u32,
    ) -> u32 {
        let Some((path, value)) = self.leaf(node, key) else {
            return default;
        };

        let number = match value {
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        let Some(number) = number else {
            if let Value::Number(n) = value
                && let Some(big) = n.as_u64()
            {
                self.report(FieldError::new(
                    path,
                    FieldErrorKind::OutOfRange {
                        value: i128::from(big),
                        min: *bounds.start(),
                        max: *bounds.end(),
                    },
                ));
            } else {
                self.wrong_type(path, "integer", value);
            }
            return default;
        };

        if let Err(kind) = check_range(number, bounds) {
            self.report(FieldError::new(path, kind));
            return default;
        }
        u32::try_from(number).unwrap_or(default)
    }

    /// String field parsed into a constrained type.
    fn parsed<T>(&mut self, node: &Node<'_>, key: &str, default: T) -> T
    where
        T: FromStr<Err = FieldErrorKind>,
    {
        let Some((path, value)) = self.leaf(node, key) else {
            return default;
        };
        let Value::String(s) = value else {
            self.wrong_type(path, "string", value);
            return default;
        };
        match s.parse() {
            Ok(parsed) => parsed,
            Err(kind) => {
                self.report(FieldError::new(path, kind));
                default
            }
        }
    }

    /// Free-form string with placeholders expanded.
    fn text(&mut self, node: &Node<'_>, key: &str, default: String) -> String {
        let Some((path, value)) = self.leaf(node, key) else {
            return default;
        };
        let Value::String(s) = value else {
            self.wrong_type(path, "string", value);
            return default;
        };
        match expand_placeholders(s, self.env, self.options.placeholders) {
            Ok(expanded) => expanded,
            Err(kind) => {
                self.report(FieldError::new(path, kind));
                default
            }
        }
    }

    /// Path string with placeholders and a leading `~` expanded.
    fn path(&mut self, node: &Node<'_>, key: &str, default: PathBuf) -> PathBuf {
        let Some((path, value)) = self.leaf(node, key) else {
            return default;
        };
        let Value::String(s) = value else {
            self.wrong_type(path, "string", value);
            return default;
        };
        match expand_placeholders(s, self.env, self.options.placeholders) {
            Ok(expanded) => expand_home_dir(&expanded),
            Err(kind) => {
                self.report(FieldError::new(path, kind));
                default
            }
        }
    }
}

/// Expand `~` at the start of a path to the home directory.
fn expand_home_dir(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    };

    if let Some(rest) = rest
        && let Some(home) = dirs::home_dir()
    {
        return if rest.is_empty() { home } else { home.join(rest) };
    }
    PathBuf::from(path)
}
