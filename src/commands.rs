//! Editor commands for menus and the command palette
//!
//! Each shared setting is exposed as a parameterized, toggleable command;
//! the editor actions (find, replace, go to line) are forwarded to the
//! current instance. Commands are plain data ([`Command`]); the
//! [`CommandRegistry`] answers label/enabled/toggled queries and executes
//! them against the reconciler.

use std::rc::Rc;

use crate::config::{key_map_title, BUILTIN_THEMES, KEY_MAP_SCHEMES};
use crate::editor::{EditorAction, EditorOption, EditorWidget, OptionKey};
use crate::reconciler::SettingsReconciler;
use crate::settings::PendingWrite;
use crate::signal::Signal;

// ============================================================================
// Command Registry
// ============================================================================

/// Identifies a command independently of its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    ChangeKeyMap,
    ChangeTheme,
    MatchBrackets,
    ChangeTabs,
    Find,
    Replace,
    GoToLine,
}

impl CommandId {
    /// Stable id registered with the host
    pub fn as_str(self) -> &'static str {
        match self {
            CommandId::ChangeKeyMap => "codemirror:change-keymap",
            CommandId::ChangeTheme => "codemirror:change-theme",
            CommandId::MatchBrackets => "codemirror:match-brackets",
            CommandId::ChangeTabs => "codemirror:change-tabs",
            CommandId::Find => "codemirror:find",
            CommandId::Replace => "codemirror:find-and-replace",
            CommandId::GoToLine => "codemirror:go-to-line",
        }
    }

    /// Look up a command by its stable id
    pub fn parse(id: &str) -> Option<Self> {
        COMMANDS.iter().map(|def| def.id).find(|cmd| cmd.as_str() == id)
    }
}

/// Static description of a command
#[derive(Debug, Clone)]
pub struct CommandDef {
    pub id: CommandId,
    /// Generic label, used where no argument is known
    pub label: &'static str,
    /// Palette category
    pub category: &'static str,
    pub keybinding: Option<&'static str>,
}

/// Every command the plugin registers
pub static COMMANDS: &[CommandDef] = &[
    CommandDef {
        id: CommandId::ChangeKeyMap,
        label: "Change Key Map",
        category: "Text Editor Key Map",
        keybinding: None,
    },
    CommandDef {
        id: CommandId::ChangeTheme,
        label: "Change Theme",
        category: "Text Editor Theme",
        keybinding: None,
    },
    CommandDef {
        id: CommandId::MatchBrackets,
        label: "Match Brackets",
        category: "Text Editor",
        keybinding: None,
    },
    CommandDef {
        id: CommandId::ChangeTabs,
        label: "Change Indentation",
        category: "Text Editor Indentation",
        keybinding: None,
    },
    CommandDef {
        id: CommandId::Find,
        label: "Find...",
        category: "Text Editor",
        keybinding: Some("⌘F"),
    },
    CommandDef {
        id: CommandId::Replace,
        label: "Find and Replace...",
        category: "Text Editor",
        keybinding: Some("⌥⌘F"),
    },
    CommandDef {
        id: CommandId::GoToLine,
        label: "Go to Line...",
        category: "Text Editor",
        keybinding: Some("⌘L"),
    },
];

/// Indentation choices offered in menus: `None` is "Indent with Tab"
pub const TAB_CHOICES: &[Option<u32>] = &[None, Some(1), Some(2), Some(4), Some(8)];

/// Indent width used with tab indentation
const TAB_INDENT_UNIT: u32 = 4;

pub fn command_def(id: CommandId) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|def| def.id == id)
}

/// A command together with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChangeKeyMap(String),
    ChangeTheme(String),
    ToggleMatchBrackets,
    ChangeTabs { insert_spaces: bool, size: u32 },
    Find,
    Replace,
    GoToLine,
}

impl Command {
    pub fn id(&self) -> CommandId {
        match self {
            Command::ChangeKeyMap(_) => CommandId::ChangeKeyMap,
            Command::ChangeTheme(_) => CommandId::ChangeTheme,
            Command::ToggleMatchBrackets => CommandId::MatchBrackets,
            Command::ChangeTabs { .. } => CommandId::ChangeTabs,
            Command::Find => CommandId::Find,
            Command::Replace => CommandId::Replace,
            Command::GoToLine => CommandId::GoToLine,
        }
    }

    /// Command for one of [`TAB_CHOICES`]
    pub fn tabs(choice: Option<u32>) -> Self {
        match choice {
            Some(size) => Command::ChangeTabs {
                insert_spaces: true,
                size,
            },
            None => Command::ChangeTabs {
                insert_spaces: false,
                size: TAB_INDENT_UNIT,
            },
        }
    }

    /// Human-readable label for menus
    pub fn label(&self) -> String {
        match self {
            Command::ChangeKeyMap(id) => key_map_title(id).to_string(),
            Command::ChangeTheme(theme) => theme.clone(),
            Command::ChangeTabs {
                insert_spaces: false,
                ..
            } => "Indent with Tab".to_string(),
            Command::ChangeTabs { size, .. } => format!("Spaces: {}", size),
            other => command_def(other.id())
                .map(|def| def.label)
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn action(&self) -> Option<EditorAction> {
        match self {
            Command::Find => Some(EditorAction::Find),
            Command::Replace => Some(EditorAction::Replace),
            Command::GoToLine => Some(EditorAction::JumpToLine),
            _ => None,
        }
    }

    /// Whether the command works on the current instance rather than the shared settings
    fn needs_current(&self) -> bool {
        matches!(self, Command::ChangeTabs { .. }) || self.action().is_some()
    }
}

/// What executing a command set in motion
#[derive(Debug)]
pub enum Dispatch {
    /// A shared setting changed; the write completes later
    Persisting(PendingWrite),
    /// The current editor was updated directly
    Applied,
}

/// Errors from [`CommandRegistry::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command is currently disabled
    Disabled(CommandId),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Disabled(id) => write!(f, "Command is disabled: {}", id.as_str()),
        }
    }
}

impl std::error::Error for CommandError {}

/// Answers command queries and executes commands
pub struct CommandRegistry {
    reconciler: Rc<SettingsReconciler>,
}

impl CommandRegistry {
    pub fn new(reconciler: Rc<SettingsReconciler>) -> Self {
        Self { reconciler }
    }

    pub fn label(&self, command: &Command) -> String {
        command.label()
    }

    /// Commands need at least one open editor; per-editor commands also
    /// need a current editor exposing its options
    pub fn is_enabled(&self, command: &Command) -> bool {
        if !self.reconciler.has_instances() {
            return false;
        }
        if command.needs_current() {
            return self.current_with_options().is_some();
        }
        true
    }

    pub fn is_toggled(&self, command: &Command) -> bool {
        match command {
            Command::ChangeKeyMap(id) => self.reconciler.is_key_map(id),
            Command::ChangeTheme(theme) => self.reconciler.is_theme(theme),
            Command::ToggleMatchBrackets => self.reconciler.match_brackets(),
            Command::ChangeTabs {
                insert_spaces,
                size,
            } => self.tabs_match(*insert_spaces, *size),
            Command::Find | Command::Replace | Command::GoToLine => false,
        }
    }

    pub fn execute(&self, command: &Command) -> Result<Dispatch, CommandError> {
        if !self.is_enabled(command) {
            tracing::debug!("Refusing disabled command {}", command.id().as_str());
            return Err(CommandError::Disabled(command.id()));
        }

        tracing::debug!("Executing {} ({})", command.id().as_str(), command.label());
        let dispatch = match command {
            Command::ChangeKeyMap(id) => Dispatch::Persisting(self.reconciler.set_key_map(id)),
            Command::ChangeTheme(theme) => Dispatch::Persisting(self.reconciler.set_theme(theme)),
            Command::ToggleMatchBrackets => {
                let flag = !self.reconciler.match_brackets();
                Dispatch::Persisting(self.reconciler.set_match_brackets(flag))
            }
            Command::ChangeTabs {
                insert_spaces,
                size,
            } => {
                let widget = self
                    .current_with_options()
                    .ok_or(CommandError::Disabled(CommandId::ChangeTabs))?;
                if let Some(options) = widget.native_options() {
                    options.set_option(EditorOption::IndentWithTabs(!insert_spaces));
                    options.set_option(EditorOption::IndentUnit(*size));
                }
                Dispatch::Applied
            }
            Command::Find | Command::Replace | Command::GoToLine => {
                let widget = self
                    .current_with_options()
                    .ok_or(CommandError::Disabled(command.id()))?;
                if let (Some(options), Some(action)) = (widget.native_options(), command.action())
                {
                    options.exec(action);
                }
                Dispatch::Applied
            }
        };
        Ok(dispatch)
    }

    /// Fired when a command's state may have changed
    pub fn command_changed(&self) -> &Signal<CommandId> {
        self.reconciler.command_changed()
    }

    pub fn reconciler(&self) -> &Rc<SettingsReconciler> {
        &self.reconciler
    }

    fn current_with_options(&self) -> Option<Rc<dyn EditorWidget>> {
        self.reconciler
            .tracker()
            .current()
            .filter(|widget| widget.native_options().is_some())
    }

    fn tabs_match(&self, insert_spaces: bool, size: u32) -> bool {
        let Some(widget) = self.current_with_options() else {
            return false;
        };
        let Some(options) = widget.native_options() else {
            return false;
        };

        let with_tabs = matches!(
            options.option(OptionKey::IndentWithTabs),
            Some(EditorOption::IndentWithTabs(true))
        );
        if !insert_spaces {
            return with_tabs;
        }
        !with_tabs && options.option(OptionKey::IndentUnit) == Some(EditorOption::IndentUnit(size))
    }
}

// ============================================================================
// Command Palette
// ============================================================================

/// One searchable palette item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub command: Command,
    pub label: String,
    pub category: &'static str,
    pub keybinding: Option<&'static str>,
}

impl PaletteEntry {
    fn new(command: Command) -> Self {
        let def = command_def(command.id());
        Self {
            label: command.label(),
            category: def.map(|def| def.category).unwrap_or("Text Editor"),
            keybinding: def.and_then(|def| def.keybinding),
            command,
        }
    }

    /// Text the palette searches: category then label
    pub fn search_text(&self) -> String {
        format!("{} {}", self.category, self.label)
    }
}

/// Every concrete command, in menu order
pub fn palette_entries() -> Vec<PaletteEntry> {
    let key_maps = KEY_MAP_SCHEMES
        .iter()
        .map(|scheme| Command::ChangeKeyMap(scheme.id.to_string()));
    let themes = BUILTIN_THEMES
        .iter()
        .map(|theme| Command::ChangeTheme(theme.to_string()));
    let tabs = TAB_CHOICES.iter().map(|choice| Command::tabs(*choice));
    let actions = [
        Command::ToggleMatchBrackets,
        Command::Find,
        Command::Replace,
        Command::GoToLine,
    ];

    key_maps
        .chain(themes)
        .chain(tabs)
        .chain(actions)
        .map(PaletteEntry::new)
        .collect()
}

/// Palette entries matching `query`, best match first
pub fn filter_palette(query: &str) -> Vec<PaletteEntry> {
    let entries = palette_entries();
    if query.trim().is_empty() {
        return entries;
    }

    let mut scored: Vec<(PaletteEntry, i32)> = entries
        .into_iter()
        .filter_map(|entry| {
            let score = fuzzy_score(query, &entry.search_text())?;
            Some((entry, score))
        })
        .collect();

    // Stable sort keeps menu order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(entry, _)| entry).collect()
}

/// Subsequence match score, `None` when some query character is missing
///
/// Runs of consecutive hits, hits at word starts, and a hit on the very
/// first character score extra.
fn fuzzy_score(query: &str, target: &str) -> Option<i32> {
    let mut wanted = query
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .peekable();
    if wanted.peek().is_none() {
        return Some(0);
    }

    let mut score = 0;
    let mut in_run = false;
    let mut word_start = true;

    for (index, ch) in target.chars().flat_map(char::to_lowercase).enumerate() {
        let hit = wanted.peek() == Some(&ch);
        if hit {
            wanted.next();
            score += 1;
            if in_run {
                score += 2;
            }
            if word_start {
                score += 3;
            }
            if index == 0 {
                score += 5;
            }
        }
        in_run = hit;
        word_start = matches!(ch, ' ' | '_' | '-' | ':');
    }

    if wanted.peek().is_none() {
        Some(score)
    } else {
        None
    }
}
