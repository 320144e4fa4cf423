//! Loading the template and overrides through `ConfigLoader`.

mod common;

use std::path::PathBuf;

use chromesync::config::{
    ClockTime, ConfigError, DocumentFormat, FieldErrorKind, InvalidFieldPolicy, LoadOptions,
    Locale, LogLevel, PlaceholderScope, Theme,
};
use common::{env, loader, windows_env};

fn errors_at(err: &ConfigError) -> Vec<&str> {
    err.field_errors().iter().map(|e| e.path.as_str()).collect()
}

#[test]
fn test_template_defaults() {
    let config = loader().load_defaults().expect("template must load").config;

    assert!(config.general.auto_start);
    assert!(config.general.minimize_to_tray);
    assert!(!config.general.sync_on_startup);
    assert_eq!(config.general.language, Locale::default());
    assert_eq!(config.general.language.as_str(), "en-US");

    assert_eq!(config.browsers.len(), 2);
    let chrome = config.browser("chrome").expect("chrome entry");
    assert_eq!(chrome.profile, "Default");
    assert_eq!(
        chrome.user_data_dir,
        PathBuf::from(r"C:\Users\ada\AppData\Local\Google\Chrome\User Data")
    );
    let zen = config.browser("zen").expect("zen entry");
    assert_eq!(zen.profile, "default");
    assert_eq!(zen.user_data_dir, PathBuf::from(r"C:\Users\ada\AppData\Roaming\zen"));

    assert!(config.sync.data_types.passwords);
    assert!(!config.sync.schedule.enabled);
    assert_eq!(config.sync.schedule.interval_hours, 24);
    assert_eq!(config.sync.schedule.specific_time, ClockTime::new(2, 0).unwrap());
    assert_eq!(config.sync.auto_sync.delay_seconds, 5);
    assert!(!config.sync.auto_sync.trigger_on_chrome_close);

    assert!(config.security.encrypt_temp_files);
    assert!(!config.security.log_sensitive_operations);

    assert_eq!(config.storage.retention_days, 1);
    assert_eq!(config.storage.max_backups, 3);

    assert_eq!(config.logs.level, LogLevel::Info);
    assert_eq!(config.logs.max_size_mb, 10);
    assert_eq!(config.logs.rotation_count, 5);
    assert_eq!(
        config.logs.dir,
        PathBuf::from(r"C:\Users\ada\AppData\Local\ChromeSync\logs")
    );

    assert_eq!(config.gui.theme, Theme::System);
    assert_eq!(config.gui.notification_timeout_sec, 5);
    assert!(config.gui.confirm_actions);
}

#[test]
fn test_template_passes_typed_validation() {
    let config = loader().load_defaults().unwrap().config;
    config.validate().expect("template values are within bounds");
}

#[test]
fn test_rendered_config_loads_back_unchanged() {
    let original = loader().load_defaults().unwrap().config;
    for format in [DocumentFormat::Json, DocumentFormat::Yaml, DocumentFormat::Toml] {
        let text = format.render(&original).expect("render");
        let reloaded = loader().load_str(&text, format).expect("reload").config;
        assert_eq!(reloaded, original, "round trip through {format}");
    }
}

#[test]
fn test_interval_hours_bounds() {
    for (value, ok) in [("0", false), ("-1", false), ("1", true), ("24", true), ("168", true), ("169", false)] {
        let doc = format!(r#"{{"sync": {{"schedule": {{"interval_hours": {value}}}}}}}"#);
        let result = loader().load_str(&doc, DocumentFormat::Json);
        assert_eq!(result.is_ok(), ok, "interval_hours = {value}");
    }
}

#[test]
fn test_specific_time_format() {
    for (value, ok) in [("02:00", true), ("2:30", true), ("23:59", true), ("24:00", false), ("25:99", false), ("2pm", false)] {
        let doc = format!(r#"{{"sync": {{"schedule": {{"specific_time": "{value}"}}}}}}"#);
        let result = loader().load_str(&doc, DocumentFormat::Json);
        assert_eq!(result.is_ok(), ok, "specific_time = {value}");
    }
}

#[test]
fn test_log_level_must_be_exact() {
    for value in ["DEBUG", "INFO", "WARN", "ERROR"] {
        let doc = format!(r#"{{"logs": {{"level": "{value}"}}}}"#);
        let loaded = loader().load_str(&doc, DocumentFormat::Json).unwrap();
        assert_eq!(loaded.config.logs.level.as_str(), value);
    }
    for value in ["info", "WARNING", "TRACE", ""] {
        let doc = format!(r#"{{"logs": {{"level": "{value}"}}}}"#);
        let err = loader().load_str(&doc, DocumentFormat::Json).unwrap_err();
        assert_eq!(errors_at(&err), ["logs.level"], "level = {value:?}");
    }
}

#[test]
fn test_language_tag_shape() {
    let loaded = loader()
        .load_str(r#"{"general": {"language": "de-DE"}}"#, DocumentFormat::Json)
        .unwrap();
    assert_eq!(loaded.config.general.language.language(), "de");
    assert_eq!(loaded.config.general.language.region(), "DE");

    let err = loader()
        .load_str(r#"{"general": {"language": "english"}}"#, DocumentFormat::Json)
        .unwrap_err();
    assert_eq!(errors_at(&err), ["general.language"]);
}

#[test]
fn test_every_invalid_field_is_reported() {
    let err = loader()
        .load_str(
            r#"{
                "general": {"auto_start": 1},
                "storage": {"max_backups": 0},
                "logs": {"max_size_mb": 0},
                "gui": {"theme": "solarized"}
            }"#,
            DocumentFormat::Json,
        )
        .unwrap_err();
    assert_eq!(
        errors_at(&err),
        ["general.auto_start", "storage.max_backups", "logs.max_size_mb", "gui.theme"]
    );
}

#[test]
fn test_temp_placeholder_expansion() {
    let env = env(&[
        ("PROGRAMFILES", r"C:\Program Files"),
        ("LOCALAPPDATA", r"C:\Local"),
        ("APPDATA", r"C:\Roaming"),
        ("TEMP", r"D:\scratch"),
    ]);
    let config = chromesync::config::ConfigLoader::with_environment(env)
        .load_defaults()
        .unwrap()
        .config;
    assert_eq!(config.storage.temp_dir, PathBuf::from(r"D:\scratch\ChromeSync"));
}

#[test]
fn test_unset_placeholder_is_not_passed_through() {
    let mut env = windows_env();
    env.remove("APPDATA");
    let err = chromesync::config::ConfigLoader::with_environment(env)
        .load_defaults()
        .unwrap_err();
    let field = &err.field_errors()[0];
    assert_eq!(field.path.as_str(), "browsers.zen.user_data_dir");
    assert_eq!(
        field.kind,
        FieldErrorKind::UnresolvedPlaceholder {
            name: "APPDATA".to_string()
        }
    );
}

#[test]
fn test_placeholder_scope() {
    let mut env = windows_env();
    env.insert("SYNC_ROOT".to_string(), "/data".to_string());
    env.insert("CHROMESYNC_ROOT".to_string(), "/srv".to_string());
    let doc = r#"{"storage": {"temp_dir": "%SYNC_ROOT%/tmp"}}"#;

    let err = chromesync::config::ConfigLoader::with_environment(env.clone())
        .load_str(doc, DocumentFormat::Json)
        .unwrap_err();
    assert!(matches!(
        err.field_errors()[0].kind,
        FieldErrorKind::DisallowedPlaceholder { .. }
    ));

    let options = LoadOptions {
        placeholders: PlaceholderScope::Any,
        ..LoadOptions::default()
    };
    let loaded = chromesync::config::ConfigLoader::with_environment(env.clone())
        .with_options(options)
        .load_str(doc, DocumentFormat::Json)
        .unwrap();
    assert_eq!(loaded.config.storage.temp_dir, PathBuf::from("/data/tmp"));

    let loaded = chromesync::config::ConfigLoader::with_environment(env)
        .load_str(r#"{"storage": {"temp_dir": "%CHROMESYNC_ROOT%/tmp"}}"#, DocumentFormat::Json)
        .unwrap();
    assert_eq!(loaded.config.storage.temp_dir, PathBuf::from("/srv/tmp"));
}

#[test]
fn test_strict_mode_rejects_unknown_fields() {
    let doc = r#"{"general": {"autostart": true}, "browsers": {"chrome": {"channel": "beta"}}}"#;

    let loaded = loader().load_str(doc, DocumentFormat::Json).unwrap();
    assert!(loaded.config.general.auto_start);

    let err = loader().strict(true).load_str(doc, DocumentFormat::Json).unwrap_err();
    assert_eq!(errors_at(&err), ["general.autostart", "browsers.chrome.channel"]);
}

#[test]
fn test_yaml_override() {
    let yaml = r#"
sync:
  schedule:
    enabled: true
    specific_time: "21:15"
browsers:
  zen: null
"#;
    let config = loader().load_str(yaml, DocumentFormat::Yaml).unwrap().config;
    assert!(config.sync.schedule.enabled);
    assert_eq!(config.sync.schedule.specific_time.to_string(), "21:15");
    assert_eq!(config.browsers.keys().collect::<Vec<_>>(), ["chrome"]);
}

#[test]
fn test_toml_override() {
    let toml = r#"
[gui]
theme = "light"
notification_timeout_sec = 0

[browsers.chrome]
profile = "Profile 2"
"#;
    let config = loader().load_str(toml, DocumentFormat::Toml).unwrap().config;
    assert_eq!(config.gui.theme, Theme::Light);
    assert_eq!(config.gui.notification_timeout_sec, 0);
    let chrome = &config.browsers["chrome"];
    assert_eq!(chrome.profile, "Profile 2");
    assert_eq!(chrome.use_gui_automation, Some(true));
}

#[test]
fn test_malformed_documents() {
    let err = loader().load_str("gui: [unclosed", DocumentFormat::Yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { format: DocumentFormat::Yaml, .. }));

    let err = loader().load_str("\"just a string\"", DocumentFormat::Json).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { .. }));
    assert!(err.field_errors().is_empty());
}

#[test]
fn test_lenient_loading_reports_warnings() {
    let options = LoadOptions {
        invalid_fields: InvalidFieldPolicy::UseDefault,
        ..LoadOptions::default()
    };
    let loaded = loader()
        .with_options(options)
        .load_str(
            r#"{"sync": {"auto_sync": {"delay_seconds": 9000, "enabled": false}}}"#,
            DocumentFormat::Json,
        )
        .unwrap();
    assert_eq!(loaded.config.sync.auto_sync.delay_seconds, 5);
    assert!(!loaded.config.sync.auto_sync.enabled);
    assert_eq!(loaded.warnings.len(), 1);
    assert!(matches!(
        loaded.warnings[0].kind,
        FieldErrorKind::OutOfRange { value: 9000, min: 0, max: 300 }
    ));
}

#[test]
fn test_load_file_uses_extension() {
    let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("override.yml");
    std::fs::write(&path, "storage:\n  retention_days: 7\n").expect("Failed to write");

    let config = loader().load_file(&path).unwrap().config;
    assert_eq!(config.storage.retention_days, 7);

    let err = loader().load_file(&temp.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
