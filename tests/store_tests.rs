//! `ConfigStore` against real files in a temp directory.

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use chromesync::config::config::list_backups;
use chromesync::config::{ConfigLoader, ConfigStore, Opened, Theme};
use common::windows_env;
use tempfile::TempDir;

fn open(path: &std::path::Path) -> ConfigStore<std::collections::HashMap<String, String>> {
    ConfigStore::open(path, ConfigLoader::with_environment(windows_env())).expect("Failed to open store")
}

#[test]
fn test_first_open_then_reopen() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("ChromeSync").join("config.json");

    let first = open(&path);
    assert!(matches!(first.opened(), Opened::Created));
    let second = open(&path);
    assert!(matches!(second.opened(), Opened::Loaded { .. }));
    assert_eq!(*first.current(), *second.current());
}

#[test]
fn test_invalid_file_is_backed_up_and_replaced() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("config.json");
    let bad = r#"{"sync": {"schedule": {"interval_hours": 0}}}"#;
    fs::write(&path, bad).expect("Failed to write config");

    let store = open(&path);
    let Opened::Recovered { backup, error } = store.opened() else {
        panic!("expected recovery");
    };
    assert_eq!(error.field_errors()[0].path.as_str(), "sync.schedule.interval_hours");
    assert_eq!(fs::read_to_string(backup).expect("Failed to read backup"), bad);
    assert_eq!(store.current().sync.schedule.interval_hours, 24);

    let name = backup.file_name().and_then(|n| n.to_str()).expect("backup name");
    assert!(name.starts_with("config.json.") && name.ends_with(".bak"), "{name}");
    assert_eq!(list_backups(&path).expect("Failed to list backups"), [backup.clone()]);
}

#[test]
fn test_snapshots_survive_updates() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = open(&temp.path().join("config.json"));

    let before = store.current();
    store.update(|c| c.gui.theme = Theme::Dark).expect("Failed to update");
    assert_eq!(before.gui.theme, Theme::System);
    assert_eq!(store.current().gui.theme, Theme::Dark);
}

#[test]
fn test_concurrent_readers_see_whole_configs() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(open(&temp.path().join("config.json")));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let config = store.current();
                    // Both fields are always written together.
                    assert_eq!(config.gui.start_minimized, config.general.sync_on_startup);
                }
            })
        })
        .collect();

    for i in 0..20 {
        let flag = i % 2 == 0;
        store
            .update(|c| {
                c.gui.start_minimized = flag;
                c.general.sync_on_startup = flag;
            })
            .expect("Failed to update");
    }
    for reader in readers {
        reader.join().expect("reader panicked");
    }
}

#[test]
fn test_export_then_import_elsewhere() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let source = open(&temp.path().join("a").join("config.json"));
    source
        .update(|c| {
            c.storage.retention_days = 14;
            c.browsers.remove("zen");
        })
        .expect("Failed to update");

    let exported = temp.path().join("shared.yaml");
    source.export(&exported, false).expect("Failed to export");

    let target = open(&temp.path().join("b").join("config.json"));
    let imported = target.import(&exported).expect("Failed to import");
    assert_eq!(imported.storage.retention_days, 14);
    assert!(!imported.sync.data_types.passwords);
    assert!(!imported.browsers.contains_key("zen"));

    target.reload().expect("Failed to reload");
    assert_eq!(*target.current(), *imported);
}

#[test]
fn test_exported_file_resolves_against_importing_host() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let source = open(&temp.path().join("a").join("config.json"));
    source
        .update(|c| c.gui.theme = Theme::Dark)
        .expect("Failed to update");

    let exported = temp.path().join("shared.json");
    source.export(&exported, true).expect("Failed to export");
    let text = fs::read_to_string(&exported).expect("Failed to read export");
    assert!(text.contains("%TEMP%"));
    assert!(!text.contains(r"C:\\Users\\ada"));

    let mut other_host = windows_env();
    other_host.insert("TEMP".to_string(), r"E:\scratch".to_string());
    let target = ConfigStore::open(
        temp.path().join("b").join("config.json"),
        ConfigLoader::with_environment(other_host),
    )
    .expect("Failed to open store");
    let imported = target.import(&exported).expect("Failed to import");
    assert_eq!(imported.gui.theme, Theme::Dark);
    assert_eq!(
        imported.storage.temp_dir,
        std::path::PathBuf::from(r"E:\scratch\ChromeSync")
    );
}
