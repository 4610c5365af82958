//! Editor instance capability
//!
//! The host wraps each embedded editor widget in an [`EditorWidget`]. Widgets
//! backed by the third-party editor expose their native option bag through
//! [`EditorWidget::native_options`]; the reconciler only touches instances
//! that do and skips the rest.

use std::fmt;

/// Identifies a tracked editor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor#{}", self.0)
    }
}

/// Names of the options the plugin reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    KeyMap,
    Theme,
    MatchBrackets,
    IndentWithTabs,
    IndentUnit,
}

impl OptionKey {
    /// Option name as the embedded editor spells it
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::KeyMap => "keyMap",
            OptionKey::Theme => "theme",
            OptionKey::MatchBrackets => "matchBrackets",
            OptionKey::IndentWithTabs => "indentWithTabs",
            OptionKey::IndentUnit => "indentUnit",
        }
    }
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOption {
    KeyMap(String),
    Theme(String),
    MatchBrackets(bool),
    IndentWithTabs(bool),
    /// Indent width in columns
    IndentUnit(u32),
}

impl EditorOption {
    pub fn key(&self) -> OptionKey {
        match self {
            EditorOption::KeyMap(_) => OptionKey::KeyMap,
            EditorOption::Theme(_) => OptionKey::Theme,
            EditorOption::MatchBrackets(_) => OptionKey::MatchBrackets,
            EditorOption::IndentWithTabs(_) => OptionKey::IndentWithTabs,
            EditorOption::IndentUnit(_) => OptionKey::IndentUnit,
        }
    }
}

/// Actions the embedded editor runs by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    Find,
    Replace,
    JumpToLine,
}

impl EditorAction {
    /// Command name understood by the embedded editor
    pub fn as_str(self) -> &'static str {
        match self {
            EditorAction::Find => "find",
            EditorAction::Replace => "replace",
            EditorAction::JumpToLine => "jumpToLine",
        }
    }
}

/// Runtime options of one embedded editor
///
/// Setting an option is expected to be cheap and idempotent.
pub trait OptionBag {
    fn set_option(&self, option: EditorOption);

    /// Current value, `None` if the option was never set
    fn option(&self, key: OptionKey) -> Option<EditorOption>;

    fn exec(&self, action: EditorAction);
}

/// An open editor widget known to the host
pub trait EditorWidget {
    fn id(&self) -> InstanceId;

    /// The native option bag, for widgets backed by the embedded editor
    fn native_options(&self) -> Option<&dyn OptionBag>;
}
