//! Application log file.
//!
//! A `log::Log` implementation driven by the `logs` and `security` config
//! sections. Records go to `chromesync.log` inside `logs.dir`. When the file
//! would grow past `logs.max_size_mb` it is rotated to `chromesync.log.1`,
//! `.2`, ... keeping at most `logs.rotation_count` old files.
//!
//! Unless `security.log_sensitive_operations` is on, values that follow a
//! sensitive-looking key (`password=...`, `"api_key": "..."`) are replaced
//! with `*****` before they reach the file.

use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chromesync_config::{LogsConfig, SecurityConfig};
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use regex::Regex;

pub const LOG_FILE_NAME: &str = "chromesync.log";

const MASK: &str = "*****";

static SENSITIVE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(\w*(?:password|token|secret|key|auth|credential|private|sensitive|hash|salt)\w*)(["']?\s*[:=]\s*["']?)([^\s"',;}]+)"#,
    )
    .expect("sensitive value regex is a compile-time constant and must be valid")
});

/// Replace values of sensitive-looking keys with `*****`.
pub fn mask_sensitive(message: &str) -> Cow<'_, str> {
    SENSITIVE_VALUE.replace_all(message, format!("${{1}}${{2}}{MASK}"))
}

/// Everything the file logger needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub level: LevelFilter,
    /// 0 disables rotation
    pub max_size_bytes: u64,
    pub rotation_count: u32,
    pub include_timestamps: bool,
    pub mask_sensitive: bool,
    /// Also write records to stderr.
    pub mirror_stderr: bool,
}

impl LogSettings {
    pub fn from_config(logs: &LogsConfig, security: &SecurityConfig) -> Self {
        Self {
            dir: logs.dir.clone(),
            level: logs.level.to_level_filter(),
            max_size_bytes: logs.max_size_bytes(),
            rotation_count: logs.rotation_count,
            include_timestamps: logs.include_timestamps,
            mask_sensitive: !security.log_sensitive_operations,
            mirror_stderr: false,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }
}

struct Sink {
    // `None` while rotating; Windows cannot rename an open file.
    file: Option<File>,
    written: u64,
}

pub struct FileLogger {
    settings: LogSettings,
    path: PathBuf,
    sink: Mutex<Sink>,
}

impl std::fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLogger")
            .field("path", &self.path)
            .field("level", &self.settings.level)
            .finish_non_exhaustive()
    }
}

fn open_append(path: &Path) -> io::Result<Sink> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let written = file.metadata()?.len();
    Ok(Sink {
        file: Some(file),
        written,
    })
}

fn rotated_path(path: &Path, index: u32) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{index}"));
    path.with_file_name(name)
}

impl FileLogger {
    /// Open (or create) the log file, creating `settings.dir` if needed.
    pub fn open(settings: LogSettings) -> io::Result<Self> {
        fs::create_dir_all(&settings.dir)?;
        let path = settings.file_path();
        let sink = open_append(&path)?;
        Ok(Self {
            settings,
            path,
            sink: Mutex::new(sink),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    fn format(&self, record: &Record<'_>) -> String {
        let message = record.args().to_string();
        let message = if self.settings.mask_sensitive {
            mask_sensitive(&message).into_owned()
        } else {
            message
        };

        if self.settings.include_timestamps {
            format!(
                "{} [{:<5}] {}: {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            )
        } else {
            format!("[{:<5}] {}: {}\n", record.level(), record.target(), message)
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.sink.lock();
        let sink = &mut *guard;
        let max = self.settings.max_size_bytes;
        if max > 0 && sink.written > 0 && sink.written + line.len() as u64 > max {
            self.rotate(sink)?;
        }
        if sink.file.is_none() {
            *sink = open_append(&self.path)?;
        }
        if let Some(file) = sink.file.as_mut() {
            file.write_all(line.as_bytes())?;
            sink.written += line.len() as u64;
        }
        Ok(())
    }

    /// Shift `chromesync.log.N` up by one, dropping the oldest, then start a
    /// fresh file.
    fn rotate(&self, sink: &mut Sink) -> io::Result<()> {
        if let Some(mut file) = sink.file.take() {
            file.flush()?;
        }
        sink.written = 0;
        let keep = self.settings.rotation_count;

        if keep == 0 {
            sink.file = Some(File::create(&self.path)?);
            return Ok(());
        }

        let oldest = rotated_path(&self.path, keep);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..keep).rev() {
            let from = rotated_path(&self.path, index);
            if from.exists() {
                fs::rename(&from, rotated_path(&self.path, index + 1))?;
            }
        }
        fs::rename(&self.path, rotated_path(&self.path, 1))?;

        *sink = open_append(&self.path)?;
        Ok(())
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.settings.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        if self.settings.mirror_stderr {
            eprint!("{line}");
        }
        // Nowhere left to report a failing log write.
        let _ = self.write_line(&line);
    }

    fn flush(&self) {
        if let Some(file) = self.sink.lock().file.as_mut() {
            let _ = file.flush();
        }
    }
}

/// Install the file logger as the global logger.
///
/// Fails if the log directory cannot be created or a logger is already set.
pub fn init(settings: LogSettings) -> anyhow::Result<PathBuf> {
    let level = settings.level;
    let logger = FileLogger::open(settings)?;
    let path = logger.path().to_path_buf();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(path)
}
