//! In-process settings backend

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;

use super::{non_null, PendingWrite, SettingsChanged, SettingsError, SettingsStore};
use crate::signal::Signal;

/// Settings record held in memory
///
/// Writes land immediately; the matching `changed` notification is queued
/// and delivered by [`SettingsStore::pump`], like a store whose writes
/// complete asynchronously.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    plugin: RefCell<Option<String>>,
    seeded: RefCell<BTreeMap<String, Value>>,
    record: RefCell<BTreeMap<String, Value>>,
    queued: RefCell<VecDeque<SettingsChanged>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
    changed: Signal<SettingsChanged>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose record will contain `values` once loaded
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let store = Self::new();
        for (key, value) in values {
            store.seed(key, value);
        }
        store
    }

    /// Pre-populate a key as if it had been persisted earlier
    pub fn seed(&self, key: impl Into<String>, value: Value) {
        self.seeded.borrow_mut().insert(key.into(), value);
    }

    /// Change a key from outside the plugin (another window, a settings editor)
    ///
    /// The notification is queued like any other write.
    pub fn set_external(&self, key: &str, value: Value) {
        self.record.borrow_mut().insert(key.to_string(), value);
        self.queue_change(key);
    }

    /// Make every following `set` fail with [`SettingsError::Rejected`]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes issued through `set`
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Notifications waiting for the next `pump`
    pub fn queued_changes(&self) -> usize {
        self.queued.borrow().len()
    }

    fn queue_change(&self, key: &str) {
        let plugin = self.plugin.borrow().clone().unwrap_or_default();
        self.queued.borrow_mut().push_back(SettingsChanged {
            plugin,
            keys: vec![key.to_string()],
        });
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, plugin: &str) -> Result<(), SettingsError> {
        if let Some(loaded) = self.plugin.borrow().as_deref() {
            if loaded != plugin {
                return Err(SettingsError::Rejected(format!(
                    "store already loaded for '{}', cannot load '{}'",
                    loaded, plugin
                )));
            }
        }
        *self.plugin.borrow_mut() = Some(plugin.to_string());
        let seeded = self.seeded.borrow().clone();
        self.record.borrow_mut().extend(seeded);
        tracing::debug!("Loaded in-memory settings for {}", plugin);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.plugin.borrow().is_some()
    }

    fn get(&self, key: &str) -> Option<Value> {
        non_null(self.record.borrow().get(key))
    }

    fn set(&self, key: &str, value: Value) -> PendingWrite {
        if !self.is_loaded() {
            return PendingWrite::ready(Err(SettingsError::NotLoaded));
        }
        if self.fail_writes.get() {
            return PendingWrite::ready(Err(SettingsError::Rejected(format!(
                "write to '{}' refused",
                key
            ))));
        }

        self.record.borrow_mut().insert(key.to_string(), value);
        self.writes.set(self.writes.get() + 1);
        self.queue_change(key);
        PendingWrite::ready(Ok(()))
    }

    fn changed(&self) -> &Signal<SettingsChanged> {
        &self.changed
    }

    fn pump(&self) -> usize {
        let mut delivered = 0;
        // Pop one at a time so handlers may queue further changes.
        loop {
            let next = self.queued.borrow_mut().pop_front();
            let Some(change) = next else { break };
            self.changed.emit(&change);
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_seeded_values_visible_after_load() {
        let store = MemorySettingsStore::with_values([("theme", json!("seti"))]);
        assert_eq!(store.get("theme"), None);

        store.load("plugin").unwrap();
        assert_eq!(store.get("theme"), Some(json!("seti")));
    }

    #[test]
    fn test_null_reads_as_missing() {
        let store = MemorySettingsStore::with_values([("theme", Value::Null)]);
        store.load("plugin").unwrap();
        assert_eq!(store.get("theme"), None);
        assert_eq!(store.get("absent"), None);
    }

    #[test]
    fn test_set_before_load_fails() {
        let store = MemorySettingsStore::new();
        assert_eq!(
            store.set("theme", json!("x")).wait(),
            Err(SettingsError::NotLoaded)
        );
    }

    #[test]
    fn test_changes_delivered_on_pump() {
        let store = Rc::new(MemorySettingsStore::new());
        store.load("plugin").unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_slot = Rc::clone(&seen);
        let _sub = store
            .changed()
            .connect(move |change| seen_in_slot.borrow_mut().push(change.keys.clone()));

        store.set("theme", json!("material")).wait().unwrap();
        assert!(seen.borrow().is_empty());

        assert_eq!(store.pump(), 1);
        assert_eq!(*seen.borrow(), vec![vec!["theme".to_string()]]);
        assert_eq!(store.pump(), 0);
    }

    #[test]
    fn test_load_under_second_id_rejected() {
        let store = MemorySettingsStore::with_values([("theme", json!("seti"))]);
        store.load("plugin").unwrap();
        store.load("plugin").unwrap();

        assert!(matches!(
            store.load("other"),
            Err(SettingsError::Rejected(_))
        ));
        assert_eq!(store.get("theme"), Some(json!("seti")));
    }

    #[test]
    fn test_failed_write_leaves_record_untouched() {
        let store = MemorySettingsStore::new();
        store.load("plugin").unwrap();
        store.fail_writes(true);

        assert!(store.set("theme", json!("material")).wait().is_err());
        assert_eq!(store.get("theme"), None);
        assert_eq!(store.queued_changes(), 0);
        assert_eq!(store.write_count(), 0);
    }
}
