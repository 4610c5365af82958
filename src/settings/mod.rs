//! Settings store collaborators
//!
//! The reconciler reads and writes its three keys through the
//! [`SettingsStore`] trait. Two backends ship with the crate:
//!
//! - [`MemorySettingsStore`] keeps the record in process (embedding hosts, tests)
//! - [`YamlSettingsStore`] persists to `~/.config/editor-sync/settings.yaml`
//!
//! Both deliver change notifications from [`SettingsStore::pump`], never from
//! inside `set`, so a handler reacting to `changed` can always call back into
//! the store.

mod memory;
mod pending;
mod yaml;

use serde_json::Value;

use crate::signal::Signal;

pub use memory::MemorySettingsStore;
pub use pending::{PendingWrite, WriteCompleter};
pub use yaml::YamlSettingsStore;

/// Payload of [`SettingsStore::changed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChanged {
    /// Plugin whose record changed
    pub plugin: String,
    /// Keys touched by the change (empty when unknown, e.g. after a reload)
    pub keys: Vec<String>,
}

/// Errors surfaced by settings backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// `set` was called before `load`
    NotLoaded,
    /// Reading or writing the backing file failed
    Io(String),
    /// The backing file is not valid YAML for a settings document
    Parse(String),
    /// The record could not be serialized
    Serialize(String),
    /// The backend refused the write
    Rejected(String),
    /// The write was dropped before it completed
    Cancelled,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::NotLoaded => write!(f, "Settings have not been loaded"),
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
            SettingsError::Serialize(e) => write!(f, "Serialize error: {}", e),
            SettingsError::Rejected(e) => write!(f, "Write rejected: {}", e),
            SettingsError::Cancelled => write!(f, "Write cancelled before completion"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Key-value settings record for one plugin
///
/// All methods take `&self`; backends use interior mutability so the store
/// can be shared between the plugin and the host.
pub trait SettingsStore {
    /// Load the persisted record for `plugin`
    fn load(&self, plugin: &str) -> Result<(), SettingsError>;

    /// Whether `load` has completed successfully
    fn is_loaded(&self) -> bool;

    /// Current value of `key`; `None` for missing keys and `null`
    fn get(&self, key: &str) -> Option<Value>;

    /// Persist `value` under `key`
    ///
    /// The returned handle completes when the write lands or fails.
    fn set(&self, key: &str, value: Value) -> PendingWrite;

    /// Fired after the record changed, from within [`SettingsStore::pump`]
    fn changed(&self) -> &Signal<SettingsChanged>;

    /// Deliver queued change notifications, returning how many were emitted
    fn pump(&self) -> usize;
}

/// Treat JSON `null` like a missing key
pub(crate) fn non_null(value: Option<&Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    }
}
