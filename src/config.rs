//! Shared editor configuration
//!
//! Holds the key map, theme and bracket-matching flag that every embedded
//! editor instance must agree on. One [`EditorConfig`] exists per plugin
//! activation and is handed around as a [`SharedConfig`] handle.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::SettingsStore;

/// Settings key for the key-binding scheme
pub const KEY_MAP_KEY: &str = "keyMap";
/// Settings key for the editor theme
pub const THEME_KEY: &str = "theme";
/// Settings key for bracket matching
pub const MATCH_BRACKETS_KEY: &str = "matchBrackets";

/// Key map used when none is configured
pub const DEFAULT_KEY_MAP: &str = "default";
/// Built-in theme of the embedded editor library
pub const DEFAULT_THEME: &str = "default";

/// A key-binding scheme the embedded editor ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapScheme {
    /// Identifier stored in settings (e.g. "sublime")
    pub id: &'static str,
    /// Display title for menus and the palette
    pub title: &'static str,
}

/// Key maps offered in menus and the palette
pub const KEY_MAP_SCHEMES: &[KeyMapScheme] = &[
    KeyMapScheme {
        id: "default",
        title: "Default",
    },
    KeyMapScheme {
        id: "sublime",
        title: "Sublime Text",
    },
    KeyMapScheme {
        id: "vim",
        title: "vim",
    },
    KeyMapScheme {
        id: "emacs",
        title: "emacs",
    },
];

/// Themes offered in menus and the palette
pub const BUILTIN_THEMES: &[&str] = &[
    "default",
    "abcdef",
    "base16-dark",
    "base16-light",
    "hopscotch",
    "material",
    "mbo",
    "mdn-like",
    "seti",
    "the-matrix",
    "xq-light",
    "zenburn",
];

/// Display title for a key map id
///
/// Unknown schemes are shown by their id.
pub fn key_map_title(id: &str) -> &str {
    KEY_MAP_SCHEMES
        .iter()
        .find(|scheme| scheme.id == id)
        .map(|scheme| scheme.title)
        .unwrap_or(id)
}

/// Configuration every tracked editor instance is kept in line with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Key-binding scheme (e.g. "default", "vim")
    #[serde(default = "default_key_map")]
    pub key_map: String,
    /// Theme id (e.g. "default", "material")
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Highlight matching brackets
    #[serde(default)]
    pub match_brackets: bool,
}

/// Handle to the configuration owned by one plugin activation
pub type SharedConfig = Rc<RefCell<EditorConfig>>;

fn default_key_map() -> String {
    DEFAULT_KEY_MAP.to_string()
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            key_map: default_key_map(),
            theme: default_theme(),
            match_brackets: false,
        }
    }
}

impl EditorConfig {
    /// Wrap a configuration in a shared handle
    pub fn shared(self) -> SharedConfig {
        Rc::new(RefCell::new(self))
    }

    /// Read all three values from a store
    ///
    /// Missing keys, `null`, empty strings and values of the wrong type all
    /// fall back to the defaults.
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        Self {
            key_map: name_or_default(store.get(KEY_MAP_KEY).as_ref(), DEFAULT_KEY_MAP),
            theme: name_or_default(store.get(THEME_KEY).as_ref(), DEFAULT_THEME),
            match_brackets: store
                .get(MATCH_BRACKETS_KEY)
                .and_then(|value| value.as_bool())
                .unwrap_or(false),
        }
    }
}

/// Substitute `default` for an empty name
pub fn key_map_or_default(name: &str) -> String {
    if name.is_empty() {
        default_key_map()
    } else {
        name.to_string()
    }
}

/// Substitute the built-in theme for an empty name
pub fn theme_or_default(name: &str) -> String {
    if name.is_empty() {
        default_theme()
    } else {
        name.to_string()
    }
}

fn name_or_default(value: Option<&Value>, default: &str) -> String {
    match value.and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default.to_string(),
    }
}
