//! Settings reconciler
//!
//! Keeps the shared [`EditorConfig`] in line with the settings store and
//! every tracked editor instance:
//!
//! ```text
//! store ──load/changed──▶ reconciler ──broadcast──▶ every tracked instance
//!                            ▲    │
//!            user commands ──┘    └──set──▶ store (PendingWrite)
//! ```
//!
//! Broadcasts always re-apply all three options to every instance. There is
//! no diffing: instances are few and setting an option is idempotent.
//!
//! Nothing is broadcast before [`SettingsReconciler::initialize`], which can
//! only be called with a [`Ready`] token proving that the store finished
//! loading and the host finished restoring.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::commands::CommandId;
use crate::config::{
    key_map_or_default, theme_or_default, EditorConfig, SharedConfig, KEY_MAP_KEY,
    MATCH_BRACKETS_KEY, THEME_KEY,
};
use crate::editor::{EditorOption, EditorWidget, OptionBag};
use crate::settings::{PendingWrite, SettingsStore};
use crate::signal::{Signal, Subscription};
use crate::startup::Ready;
use crate::tracker::InstanceTracker;

/// Synchronizes key map, theme and bracket matching across editors
pub struct SettingsReconciler {
    config: SharedConfig,
    store: Rc<dyn SettingsStore>,
    tracker: Rc<InstanceTracker>,
    initialized: Cell<bool>,
    instance_count: Cell<usize>,
    command_changed: Signal<CommandId>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl SettingsReconciler {
    /// Create a reconciler and subscribe it to the tracker
    ///
    /// Instances added from now on receive the current in-memory values,
    /// which are the defaults in `config` until initialization.
    pub fn new(
        config: SharedConfig,
        store: Rc<dyn SettingsStore>,
        tracker: Rc<InstanceTracker>,
    ) -> Rc<Self> {
        let reconciler = Rc::new(Self {
            config,
            instance_count: Cell::new(tracker.len()),
            store,
            tracker,
            initialized: Cell::new(false),
            command_changed: Signal::new(),
            subscriptions: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&reconciler);
        let on_added = reconciler.tracker.added().connect(move |event| {
            let Some(this) = weak.upgrade() else { return };
            if let Some(widget) = this.tracker.get(event.id) {
                this.on_instance_added(widget.as_ref());
            }
            this.on_instance_count_changed(event.count);
        });

        let weak = Rc::downgrade(&reconciler);
        let on_removed = reconciler.tracker.removed().connect(move |event| {
            if let Some(this) = weak.upgrade() {
                this.on_instance_count_changed(event.count);
            }
        });

        reconciler
            .subscriptions
            .borrow_mut()
            .extend([on_added, on_removed]);
        reconciler
    }

    /// Load persisted values, broadcast them, and follow store changes
    ///
    /// Calling this again after a successful initialization does nothing.
    pub fn initialize(self: &Rc<Self>, _ready: Ready) {
        if self.initialized.replace(true) {
            tracing::debug!("Settings reconciler already initialized");
            return;
        }

        self.reload_from_store();

        let weak: Weak<Self> = Rc::downgrade(self);
        let on_changed = self.store.changed().connect(move |_| {
            if let Some(this) = weak.upgrade() {
                this.on_settings_changed();
            }
        });
        self.subscriptions.borrow_mut().push(on_changed);

        let config = self.config();
        tracing::info!(
            "Editor settings initialized (keyMap={}, theme={}, matchBrackets={})",
            config.key_map,
            config.theme,
            config.match_brackets
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Apply the current values to one new instance
    ///
    /// Only that instance's three shared options are touched; nothing is
    /// persisted or broadcast.
    pub fn on_instance_added(&self, widget: &dyn EditorWidget) {
        let Some(options) = widget.native_options() else {
            tracing::trace!("{} has no native options, skipping", widget.id());
            return;
        };
        let config = self.config();
        apply(options, &config);
        tracing::debug!("Applied editor settings to new instance {}", widget.id());
    }

    /// Re-read every key from the store and broadcast
    pub fn on_settings_changed(&self) {
        if !self.is_initialized() {
            tracing::debug!("Ignoring settings change before initialization");
            return;
        }
        self.reload_from_store();
    }

    /// React to the number of tracked instances changing
    ///
    /// Reaching exactly one instance changes how the match-brackets entry
    /// is labelled in collapsed menus, so that command is re-announced.
    /// Dropping to zero is not announced.
    pub fn on_instance_count_changed(&self, count: usize) {
        let previous = self.instance_count.replace(count);
        if count == 1 && previous != 1 {
            self.command_changed.emit(&CommandId::MatchBrackets);
        }
    }

    pub fn set_key_map(&self, name: &str) -> PendingWrite {
        let key_map = key_map_or_default(name);
        self.config.borrow_mut().key_map = key_map.clone();
        self.broadcast();
        self.store.set(KEY_MAP_KEY, Value::from(key_map))
    }

    pub fn set_theme(&self, name: &str) -> PendingWrite {
        let theme = theme_or_default(name);
        self.config.borrow_mut().theme = theme.clone();
        self.broadcast();
        self.store.set(THEME_KEY, Value::from(theme))
    }

    pub fn set_match_brackets(&self, flag: bool) -> PendingWrite {
        self.config.borrow_mut().match_brackets = flag;
        self.broadcast();
        self.store.set(MATCH_BRACKETS_KEY, Value::from(flag))
    }

    /// Snapshot of the in-memory values
    pub fn config(&self) -> EditorConfig {
        self.config.borrow().clone()
    }

    pub fn is_key_map(&self, name: &str) -> bool {
        self.config.borrow().key_map == name
    }

    pub fn is_theme(&self, name: &str) -> bool {
        self.config.borrow().theme == name
    }

    pub fn match_brackets(&self) -> bool {
        self.config.borrow().match_brackets
    }

    /// Whether any editor instance is open
    pub fn has_instances(&self) -> bool {
        !self.tracker.is_empty()
    }

    pub fn tracker(&self) -> &Rc<InstanceTracker> {
        &self.tracker
    }

    /// Fired when a command's label, enablement or toggle state may have changed
    pub fn command_changed(&self) -> &Signal<CommandId> {
        &self.command_changed
    }

    /// Drop every subscription; the reconciler goes quiet
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        tracing::debug!(
            "Disposing settings reconciler ({} subscriptions)",
            subscriptions.len()
        );
        drop(subscriptions);
    }

    fn reload_from_store(&self) {
        let loaded = EditorConfig::from_store(self.store.as_ref());
        *self.config.borrow_mut() = loaded;
        self.broadcast();
    }

    /// Apply the in-memory values to every tracked instance
    fn broadcast(&self) {
        if !self.is_initialized() {
            tracing::debug!("Not broadcasting before initialization");
            return;
        }

        let config = self.config();
        let mut applied = 0;
        for widget in self.tracker.instances() {
            if let Some(options) = widget.native_options() {
                apply(options, &config);
                applied += 1;
            }
        }
        tracing::debug!(
            "Broadcast keyMap={} theme={} matchBrackets={} to {} editors",
            config.key_map,
            config.theme,
            config.match_brackets,
            applied
        );
    }
}

impl std::fmt::Debug for SettingsReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsReconciler")
            .field("config", &self.config.borrow())
            .field("initialized", &self.initialized.get())
            .field("instances", &self.tracker.len())
            .finish()
    }
}

fn apply(options: &dyn OptionBag, config: &EditorConfig) {
    options.set_option(EditorOption::KeyMap(config.key_map.clone()));
    options.set_option(EditorOption::Theme(config.theme.clone()));
    options.set_option(EditorOption::MatchBrackets(config.match_brackets));
}
