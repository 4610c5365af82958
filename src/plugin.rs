//! Plugin lifecycle
//!
//! [`EditorSyncPlugin::activate`] wires the reconciler, command registry and
//! startup gate together. The host then calls [`EditorSyncPlugin::restored`]
//! once its layout is back; whichever of that and the settings load happens
//! last initializes the reconciler.

use std::rc::Rc;

use crate::commands::CommandRegistry;
use crate::config::{EditorConfig, SharedConfig};
use crate::reconciler::SettingsReconciler;
use crate::settings::{SettingsError, SettingsStore};
use crate::startup::{Ready, StartupGate};
use crate::tracker::InstanceTracker;

/// Settings record id
pub const PLUGIN_ID: &str = "editor-sync:codemirror";

pub struct EditorSyncPlugin {
    config: SharedConfig,
    store: Rc<dyn SettingsStore>,
    reconciler: Rc<SettingsReconciler>,
    registry: CommandRegistry,
    gate: StartupGate,
    load_error: Option<SettingsError>,
}

impl EditorSyncPlugin {
    /// Create the plugin and start loading its settings
    ///
    /// A failed load is logged; the plugin keeps serving defaults and is
    /// never initialized.
    pub fn activate(store: Rc<dyn SettingsStore>, tracker: Rc<InstanceTracker>) -> Self {
        let config = EditorConfig::default().shared();
        let reconciler =
            SettingsReconciler::new(Rc::clone(&config), Rc::clone(&store), tracker);
        let registry = CommandRegistry::new(Rc::clone(&reconciler));

        let mut plugin = Self {
            config,
            store,
            reconciler,
            registry,
            gate: StartupGate::new(),
            load_error: None,
        };

        match plugin.store.load(PLUGIN_ID) {
            Ok(()) => {
                tracing::info!("Loaded settings for {}", PLUGIN_ID);
                let ready = plugin.gate.settings_loaded();
                plugin.start(ready);
            }
            Err(e) => {
                tracing::warn!("Failed to load settings for {}: {}", PLUGIN_ID, e);
                plugin.load_error = Some(e);
            }
        }
        plugin
    }

    /// The host finished restoring its layout
    pub fn restored(&self) {
        tracing::debug!("Host restored");
        let ready = self.gate.restored();
        self.start(ready);
    }

    /// Disconnect from the store and tracker
    pub fn deactivate(&self) {
        self.reconciler.dispose();
        tracing::info!("Deactivated {}", PLUGIN_ID);
    }

    pub fn is_initialized(&self) -> bool {
        self.reconciler.is_initialized()
    }

    /// Error from the settings load, if it failed
    pub fn load_error(&self) -> Option<&SettingsError> {
        self.load_error.as_ref()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn reconciler(&self) -> &Rc<SettingsReconciler> {
        &self.reconciler
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn store(&self) -> &Rc<dyn SettingsStore> {
        &self.store
    }

    fn start(&self, ready: Option<Ready>) {
        if let Some(ready) = ready {
            self.reconciler.initialize(ready);
        }
    }
}

impl std::fmt::Debug for EditorSyncPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSyncPlugin")
            .field("reconciler", &self.reconciler)
            .field("gate", &self.gate)
            .field("load_error", &self.load_error)
            .finish()
    }
}
