//! Config file watcher.
//!
//! Watches the directory holding the config file and emits a
//! [`ReloadEvent`] whenever the file is written or replaced. Editors and
//! [`ConfigStore::save`](crate::ConfigStore::save) tend to produce bursts of
//! events for one logical save (truncate, write, rename), so the event is
//! only emitted once the file has been quiet for the debounce delay.
//!
//! The watcher only reports; the caller decides when to call
//! [`ConfigStore::reload`](crate::ConfigStore::reload).

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};

/// Poll interval used when the native backend is unavailable.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The config file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub path: PathBuf,
}

/// Forward one [`ReloadEvent`] per burst of `changes`, once no change has
/// arrived for `delay`. Returns when the change sender is dropped.
fn debounce(changes: Receiver<()>, delay: Duration, path: PathBuf, events: Sender<ReloadEvent>) {
    while changes.recv().is_ok() {
        loop {
            match changes.recv_timeout(delay) {
                Ok(()) => log::trace!("Debouncing config change event"),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        log::info!("Config file changed: {}", path.display());
        if events.send(ReloadEvent { path: path.clone() }).is_err() {
            log::debug!("Config watcher receiver dropped");
            return;
        }
    }
}

pub struct ConfigWatcher {
    // Dropping the watcher stops it.
    _watcher: Box<dyn Watcher + Send>,
    events: Receiver<ReloadEvent>,
    path: PathBuf,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn event_handler(
    file_name: OsString,
    tx: Sender<()>,
) -> impl Fn(notify::Result<Event>) + Send + 'static {
    move |result| {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Config watcher error: {e}");
                return;
            }
        };

        // Create covers editors and atomic saves that rename over the file.
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        if !event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
        {
            return;
        }
        // Fails only once the debounce thread is gone.
        let _ = tx.send(());
    }
}

impl ConfigWatcher {
    /// Start watching `config_path`.
    ///
    /// Uses the platform's native backend and falls back to polling when it
    /// cannot be initialised (containers, network filesystems).
    ///
    /// # Errors
    ///
    /// The file does not exist, or neither backend can watch its directory.
    pub fn new(config_path: &Path, delay: Duration) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }

        let path = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());
        let file_name = path
            .file_name()
            .context("Config path has no file name")?
            .to_os_string();
        let dir = path
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        let (change_tx, change_rx) = channel();
        let (event_tx, event_rx) = channel();
        let handler = event_handler(file_name.clone(), change_tx.clone());

        let mut watcher: Box<dyn Watcher + Send> = match notify::recommended_watcher(handler) {
            Ok(w) => {
                log::debug!("Config watcher: using native backend");
                Box::new(w)
            }
            Err(e) => {
                log::warn!("Config watcher: native backend unavailable ({e}); polling instead");
                let handler = event_handler(file_name, change_tx);
                let poll = PollWatcher::new(handler, NotifyConfig::default().with_poll_interval(POLL_INTERVAL))
                    .context("Failed to create polling watcher")?;
                Box::new(poll)
            }
        };

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", dir.display()))?;

        let thread_path = path.clone();
        std::thread::Builder::new()
            .name("config-watch-debounce".into())
            .spawn(move || debounce(change_rx, delay, thread_path, event_tx))
            .context("Failed to start config watcher thread")?;
        log::info!("Watching {} for changes", path.display());

        Ok(Self {
            _watcher: watcher,
            events: event_rx,
            path,
        })
    }

    /// Canonical path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next pending event, without blocking.
    pub fn try_recv(&self) -> Option<ReloadEvent> {
        self.events.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `None` on timeout. Also returns `None` if the watcher backend
    /// has shut down, which callers may treat the same way.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ReloadEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
