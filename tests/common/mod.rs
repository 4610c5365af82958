//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use editor_sync::commands::CommandRegistry;
use editor_sync::config::EditorConfig;
use editor_sync::editor::{EditorAction, EditorOption, EditorWidget, InstanceId, OptionBag, OptionKey};
use editor_sync::reconciler::SettingsReconciler;
use editor_sync::settings::{MemorySettingsStore, SettingsStore};
use editor_sync::startup::StartupGate;
use editor_sync::tracker::InstanceTracker;
use editor_sync::PLUGIN_ID;

/// Editor that records every option write and action
#[derive(Debug)]
pub struct FakeEditor {
    id: InstanceId,
    options: RefCell<HashMap<OptionKey, EditorOption>>,
    writes: RefCell<Vec<EditorOption>>,
    actions: RefCell<Vec<EditorAction>>,
}

impl FakeEditor {
    pub fn new(id: u64) -> Rc<Self> {
        Rc::new(Self {
            id: InstanceId(id),
            options: RefCell::new(HashMap::new()),
            writes: RefCell::new(Vec::new()),
            actions: RefCell::new(Vec::new()),
        })
    }

    /// Every `set_option` call in order
    pub fn writes(&self) -> Vec<EditorOption> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    pub fn actions(&self) -> Vec<EditorAction> {
        self.actions.borrow().clone()
    }

    pub fn get(&self, key: OptionKey) -> Option<EditorOption> {
        self.options.borrow().get(&key).cloned()
    }

    /// The three shared options as currently applied
    pub fn shared_options(&self) -> (Option<String>, Option<String>, Option<bool>) {
        let key_map = match self.get(OptionKey::KeyMap) {
            Some(EditorOption::KeyMap(name)) => Some(name),
            _ => None,
        };
        let theme = match self.get(OptionKey::Theme) {
            Some(EditorOption::Theme(name)) => Some(name),
            _ => None,
        };
        let match_brackets = match self.get(OptionKey::MatchBrackets) {
            Some(EditorOption::MatchBrackets(flag)) => Some(flag),
            _ => None,
        };
        (key_map, theme, match_brackets)
    }
}

impl OptionBag for FakeEditor {
    fn set_option(&self, option: EditorOption) {
        self.writes.borrow_mut().push(option.clone());
        self.options.borrow_mut().insert(option.key(), option);
    }

    fn option(&self, key: OptionKey) -> Option<EditorOption> {
        self.get(key)
    }

    fn exec(&self, action: EditorAction) {
        self.actions.borrow_mut().push(action);
    }
}

impl EditorWidget for FakeEditor {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn native_options(&self) -> Option<&dyn OptionBag> {
        Some(self)
    }
}

/// Widget that does not expose native options (e.g. an image viewer)
#[derive(Debug)]
pub struct PlainWidget {
    id: InstanceId,
}

impl PlainWidget {
    pub fn new(id: u64) -> Rc<Self> {
        Rc::new(Self { id: InstanceId(id) })
    }
}

impl EditorWidget for PlainWidget {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn native_options(&self) -> Option<&dyn OptionBag> {
        None
    }
}

/// Reconciler wired to a memory store and an empty tracker
pub struct Harness {
    pub store: Rc<MemorySettingsStore>,
    pub tracker: Rc<InstanceTracker>,
    pub reconciler: Rc<SettingsReconciler>,
}

impl Harness {
    /// Store seeded with `values`, not yet loaded
    pub fn new<const N: usize>(values: [(&str, Value); N]) -> Self {
        let store = Rc::new(MemorySettingsStore::with_values(values));
        let tracker = Rc::new(InstanceTracker::new());
        let reconciler = SettingsReconciler::new(
            EditorConfig::default().shared(),
            Rc::clone(&store) as Rc<dyn SettingsStore>,
            Rc::clone(&tracker),
        );
        Self {
            store,
            tracker,
            reconciler,
        }
    }

    /// Load the store and initialize the reconciler
    pub fn initialized<const N: usize>(values: [(&str, Value); N]) -> Self {
        let harness = Self::new(values);
        harness.initialize();
        harness
    }

    pub fn initialize(&self) {
        self.store.load(PLUGIN_ID).unwrap();
        let gate = StartupGate::new();
        gate.settings_loaded();
        let ready = gate.restored().unwrap();
        self.reconciler.initialize(ready);
    }

    pub fn add(&self, editor: &Rc<FakeEditor>) {
        assert!(self.tracker.add(Rc::clone(editor) as Rc<dyn EditorWidget>));
    }

    pub fn registry(&self) -> CommandRegistry {
        CommandRegistry::new(Rc::clone(&self.reconciler))
    }
}

/// The options a full broadcast writes, in order
pub fn broadcast_writes(key_map: &str, theme: &str, match_brackets: bool) -> Vec<EditorOption> {
    vec![
        EditorOption::KeyMap(key_map.to_string()),
        EditorOption::Theme(theme.to_string()),
        EditorOption::MatchBrackets(match_brackets),
    ]
}
