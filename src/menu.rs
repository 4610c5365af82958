//! Menu model
//!
//! Declares where the plugin's commands appear in the host's menus. The host
//! renders [`ResolvedItem`]s; resolving again after
//! [`CommandRegistry::command_changed`] fires keeps labels and check marks
//! current.

use crate::commands::{Command, CommandRegistry, TAB_CHOICES};
use crate::config::{BUILTIN_THEMES, KEY_MAP_SCHEMES};

/// Host menu a group is placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLocation {
    Settings,
    Edit,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Command(Command),
    Submenu { title: String, items: Vec<MenuItem> },
    Separator,
}

/// A contiguous block of items in one host menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuGroup {
    pub location: MenuLocation,
    /// Ordering hint among groups in the same menu
    pub rank: u32,
    pub items: Vec<MenuItem>,
}

/// A menu item ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedItem {
    Command {
        command: Command,
        label: String,
        enabled: bool,
        toggled: bool,
    },
    Submenu {
        title: String,
        items: Vec<ResolvedItem>,
    },
    Separator,
}

/// All menu groups contributed by the plugin
pub fn menu_groups() -> Vec<MenuGroup> {
    let key_maps = KEY_MAP_SCHEMES
        .iter()
        .map(|scheme| MenuItem::Command(Command::ChangeKeyMap(scheme.id.to_string())))
        .collect();
    let themes = BUILTIN_THEMES
        .iter()
        .map(|theme| MenuItem::Command(Command::ChangeTheme(theme.to_string())))
        .collect();

    // Tab first, then a separator before the space widths
    let mut indentation = Vec::with_capacity(TAB_CHOICES.len() + 1);
    for choice in TAB_CHOICES {
        if choice.is_some() && indentation.len() == 1 {
            indentation.push(MenuItem::Separator);
        }
        indentation.push(MenuItem::Command(Command::tabs(*choice)));
    }

    vec![
        MenuGroup {
            location: MenuLocation::Settings,
            rank: 20,
            items: vec![
                MenuItem::Submenu {
                    title: "Text Editor Key Map".to_string(),
                    items: key_maps,
                },
                MenuItem::Submenu {
                    title: "Text Editor Theme".to_string(),
                    items: themes,
                },
                MenuItem::Submenu {
                    title: "Text Editor Indentation".to_string(),
                    items: indentation,
                },
            ],
        },
        MenuGroup {
            location: MenuLocation::Edit,
            rank: 10,
            items: vec![
                MenuItem::Command(Command::Find),
                MenuItem::Command(Command::Replace),
                MenuItem::Command(Command::GoToLine),
            ],
        },
        MenuGroup {
            location: MenuLocation::View,
            rank: 10,
            items: vec![MenuItem::Command(Command::ToggleMatchBrackets)],
        },
    ]
}

/// Evaluate labels, enablement and toggle state for `items`
pub fn resolve(items: &[MenuItem], registry: &CommandRegistry) -> Vec<ResolvedItem> {
    items
        .iter()
        .map(|item| match item {
            MenuItem::Command(command) => ResolvedItem::Command {
                command: command.clone(),
                label: registry.label(command),
                enabled: registry.is_enabled(command),
                toggled: registry.is_toggled(command),
            },
            MenuItem::Submenu { title, items } => ResolvedItem::Submenu {
                title: title.clone(),
                items: resolve(items, registry),
            },
            MenuItem::Separator => ResolvedItem::Separator,
        })
        .collect()
}
