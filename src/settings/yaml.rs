//! YAML-file settings backend
//!
//! The settings file holds one mapping per plugin id:
//!
//! ```yaml
//! editor-sync:codemirror:
//!   keyMap: vim
//!   theme: material
//!   matchBrackets: true
//! ```
//!
//! Writes and reloads are handed to a single background writer thread so
//! they hit the disk in the order they were issued. Each write re-reads the
//! file first and only replaces this plugin's key, leaving edits made by
//! others in place. The in-memory record only changes once a write
//! succeeded, when [`SettingsStore::pump`] (or [`YamlSettingsStore::reload`])
//! picks up the completion.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use serde_json::Value;

use super::{non_null, PendingWrite, SettingsChanged, SettingsError, SettingsStore, WriteCompleter};
use crate::signal::Signal;

type Record = BTreeMap<String, Value>;
type Document = BTreeMap<String, Record>;

enum Job {
    Write {
        key: String,
        value: Value,
        completer: WriteCompleter,
    },
    Reload(Sender<Result<(), SettingsError>>),
}

enum Completion {
    Write {
        key: String,
        value: Value,
        succeeded: bool,
    },
    Reloaded(Record),
}

/// Settings persisted to a YAML file
pub struct YamlSettingsStore {
    path: PathBuf,
    plugin: RefCell<Option<String>>,
    record: RefCell<Record>,
    jobs: RefCell<Option<Sender<Job>>>,
    writer: RefCell<Option<JoinHandle<()>>>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    reload_changed: Cell<bool>,
    queued: RefCell<VecDeque<SettingsChanged>>,
    changed: Signal<SettingsChanged>,
}

impl YamlSettingsStore {
    /// Store backed by `path`; nothing is read until [`SettingsStore::load`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            path: path.into(),
            plugin: RefCell::new(None),
            record: RefCell::new(Record::new()),
            jobs: RefCell::new(None),
            writer: RefCell::new(None),
            completion_tx,
            completion_rx,
            reload_changed: Cell::new(false),
            queued: RefCell::new(VecDeque::new()),
            changed: Signal::new(),
        }
    }

    /// Store backed by `~/.config/editor-sync/settings.yaml`
    pub fn open_default() -> Result<Self, SettingsError> {
        let path = crate::config_paths::settings_file()
            .ok_or_else(|| SettingsError::Io("No config directory available".to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, queueing a change notification if the record differs
    ///
    /// Returns whether anything changed. Used after the settings file was
    /// edited outside the plugin. The read is queued behind pending writes,
    /// and their completions are applied before the reloaded record, so a
    /// write that finished earlier never overrides the file's newer content.
    pub fn reload(&self) -> Result<bool, SettingsError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        {
            let jobs = self.jobs.borrow();
            let Some(jobs) = jobs.as_ref() else {
                return Err(SettingsError::NotLoaded);
            };
            jobs.send(Job::Reload(reply_tx))
                .map_err(|_| SettingsError::Cancelled)?;
        }
        reply_rx.recv().unwrap_or(Err(SettingsError::Cancelled))?;

        self.reload_changed.set(false);
        self.apply_completions();
        let changed = self.reload_changed.replace(false);
        if changed {
            tracing::info!("Reloaded settings from {}", self.path.display());
        } else {
            tracing::debug!("Settings file unchanged after reload");
        }
        Ok(changed)
    }

    /// Move finished writes and reloads into the record, in issue order
    fn apply_completions(&self) {
        let plugin = self.plugin.borrow().clone().unwrap_or_default();
        while let Ok(completion) = self.completion_rx.try_recv() {
            match completion {
                Completion::Write {
                    key,
                    value,
                    succeeded,
                } => {
                    if !succeeded {
                        continue;
                    }
                    self.record.borrow_mut().insert(key.clone(), value);
                    self.queued.borrow_mut().push_back(SettingsChanged {
                        plugin: plugin.clone(),
                        keys: vec![key],
                    });
                }
                Completion::Reloaded(fresh) => {
                    if *self.record.borrow() == fresh {
                        continue;
                    }
                    *self.record.borrow_mut() = fresh;
                    self.reload_changed.set(true);
                    self.queued.borrow_mut().push_back(SettingsChanged {
                        plugin: plugin.clone(),
                        keys: Vec::new(),
                    });
                }
            }
        }
    }

    fn spawn_writer(&self, plugin: String, document: Document) -> Result<(), SettingsError> {
        let (jobs_tx, jobs_rx) = mpsc::channel();
        let path = self.path.clone();
        let done = self.completion_tx.clone();
        let handle = std::thread::Builder::new()
            .name("settings-writer".to_string())
            .spawn(move || run_writer(path, plugin, document, jobs_rx, done))
            .map_err(|e| SettingsError::Io(format!("Failed to spawn settings writer: {}", e)))?;

        *self.jobs.borrow_mut() = Some(jobs_tx);
        *self.writer.borrow_mut() = Some(handle);
        Ok(())
    }
}

impl SettingsStore for YamlSettingsStore {
    /// Load the record for `plugin`
    ///
    /// Loading again under the same id behaves like
    /// [`YamlSettingsStore::reload`]; a different id is rejected because the
    /// writer is bound to the first one.
    fn load(&self, plugin: &str) -> Result<(), SettingsError> {
        let loaded = self.plugin.borrow().clone();
        if let Some(loaded) = loaded {
            if loaded != plugin {
                return Err(SettingsError::Rejected(format!(
                    "store already loaded for '{}', cannot load '{}'",
                    loaded, plugin
                )));
            }
            return self.reload().map(|_| ());
        }

        let document = read_document(&self.path)?;
        *self.record.borrow_mut() = document.get(plugin).cloned().unwrap_or_default();
        self.spawn_writer(plugin.to_string(), document)?;
        *self.plugin.borrow_mut() = Some(plugin.to_string());
        tracing::info!("Loaded settings for {} from {}", plugin, self.path.display());
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.plugin.borrow().is_some()
    }

    fn get(&self, key: &str) -> Option<Value> {
        non_null(self.record.borrow().get(key))
    }

    fn set(&self, key: &str, value: Value) -> PendingWrite {
        let jobs = self.jobs.borrow();
        let Some(jobs) = jobs.as_ref() else {
            return PendingWrite::ready(Err(SettingsError::NotLoaded));
        };

        let (completer, pending) = PendingWrite::channel();
        // A send error drops the completer, which resolves to Cancelled.
        let _ = jobs.send(Job::Write {
            key: key.to_string(),
            value,
            completer,
        });
        pending
    }

    fn changed(&self) -> &Signal<SettingsChanged> {
        &self.changed
    }

    fn pump(&self) -> usize {
        self.apply_completions();

        let mut delivered = 0;
        loop {
            let next = self.queued.borrow_mut().pop_front();
            let Some(change) = next else { break };
            self.changed.emit(&change);
            delivered += 1;
        }
        delivered
    }
}

impl Drop for YamlSettingsStore {
    fn drop(&mut self) {
        // Closing the job channel lets the writer drain and exit.
        self.jobs.get_mut().take();
        if let Some(handle) = self.writer.get_mut().take() {
            if handle.join().is_err() {
                tracing::warn!("Settings writer thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for YamlSettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YamlSettingsStore")
            .field("path", &self.path)
            .field("plugin", &self.plugin.borrow())
            .field("record", &self.record.borrow())
            .finish()
    }
}

fn run_writer(
    path: PathBuf,
    plugin: String,
    mut document: Document,
    jobs: Receiver<Job>,
    done: Sender<Completion>,
) {
    for job in jobs {
        match job {
            Job::Reload(reply) => match read_document(&path) {
                Ok(fresh) => {
                    let record = fresh.get(&plugin).cloned().unwrap_or_default();
                    document = fresh;
                    let _ = done.send(Completion::Reloaded(record));
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            Job::Write {
                key,
                value,
                completer,
            } => {
                // The file may have been edited since the last read; a
                // missing file is recreated from the cached document.
                let current = if path.exists() {
                    read_document(&path)
                } else {
                    Ok(document.clone())
                };

                let result = current.and_then(|mut fresh| {
                    fresh
                        .entry(plugin.clone())
                        .or_default()
                        .insert(key.clone(), value.clone());
                    write_document(&path, &fresh)?;
                    document = fresh;
                    Ok(())
                });
                if let Err(e) = &result {
                    tracing::warn!("Failed to save setting '{}': {}", key, e);
                }

                // Report to the store first so a caller returning from
                // `wait()` finds the completion on its next pump.
                let _ = done.send(Completion::Write {
                    key,
                    value,
                    succeeded: result.is_ok(),
                });
                completer.complete(result);
            }
        }
    }
    tracing::debug!("Settings writer for {} stopped", plugin);
}

fn read_document(path: &Path) -> Result<Document, SettingsError> {
    if !path.exists() {
        tracing::debug!(
            "Settings file not found at {}, starting empty",
            path.display()
        );
        return Ok(Document::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| SettingsError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Ok(Document::new());
    }

    serde_yaml::from_str(&content)
        .map_err(|e| SettingsError::Parse(format!("{}: {}", path.display(), e)))
}

fn write_document(path: &Path, document: &Document) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            SettingsError::Io(format!("Failed to create settings directory: {}", e))
        })?;
    }

    let content =
        serde_yaml::to_string(document).map_err(|e| SettingsError::Serialize(e.to_string()))?;

    std::fs::write(path, content)
        .map_err(|e| SettingsError::Io(format!("Failed to write {}: {}", path.display(), e)))?;

    tracing::info!("Saved settings to {}", path.display());
    Ok(())
}
