//! Watching the settings file for external edits
//!
//! Uses `notify` with debouncing. The parent directory is watched rather than
//! the file itself so that editors which save by rename are still seen.

use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

type DebounceResult = Result<Vec<DebouncedEvent>, notify::Error>;

/// Debounced watcher for one settings file
pub struct SettingsFileWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    rx: Receiver<DebounceResult>,
    path: PathBuf,
}

impl SettingsFileWatcher {
    /// Start watching `path`
    ///
    /// The parent directory must exist. Events are debounced with a 300ms delay.
    pub fn new(path: PathBuf) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(Duration::from_millis(300), tx)?;

        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)?;

        tracing::info!("Watching settings file: {}", path.display());

        Ok(Self {
            _debouncer: debouncer,
            rx,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending events (non-blocking)
    ///
    /// Returns true when at least one of them concerned the settings file.
    pub fn poll(&self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(events) => {
                    changed |= events.iter().any(|event| {
                        !matches!(event.kind, DebouncedEventKind::AnyContinuous)
                            && self.is_settings_file(&event.path)
                    });
                }
                Err(e) => tracing::warn!("Settings watcher error: {:?}", e),
            }
        }

        if changed {
            tracing::debug!("Settings file changed on disk");
        }
        changed
    }

    fn is_settings_file(&self, path: &Path) -> bool {
        path == self.path || path.file_name() == self.path.file_name()
    }
}

impl std::fmt::Debug for SettingsFileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsFileWatcher")
            .field("path", &self.path)
            .finish()
    }
}
