//! Editor settings synchronization
//!
//! This crate keeps key map, theme and bracket matching consistent between a
//! persisted settings store and every open embedded editor, and exposes those
//! settings as menu and palette commands.
//!
//! The host owns an [`InstanceTracker`] and a [`SettingsStore`], then calls
//! [`EditorSyncPlugin::activate`] and later [`EditorSyncPlugin::restored`].

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod editor;
pub mod menu;
pub mod plugin;
pub mod reconciler;
pub mod settings;
pub mod settings_watcher;
pub mod signal;
pub mod startup;
pub mod tracing;
pub mod tracker;

// Re-export commonly used types
pub use commands::{Command, CommandId, CommandRegistry};
pub use config::EditorConfig;
pub use editor::{EditorOption, EditorWidget, InstanceId, OptionBag};
pub use plugin::{EditorSyncPlugin, PLUGIN_ID};
pub use reconciler::SettingsReconciler;
pub use settings::{MemorySettingsStore, PendingWrite, SettingsStore, YamlSettingsStore};
pub use signal::{Signal, Subscription};
pub use tracker::InstanceTracker;
