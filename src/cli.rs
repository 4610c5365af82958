//! Command-line interface
//!
//! Supports:
//! - Showing the effective editor settings
//! - Changing key map, theme and bracket matching
//! - Listing the built-in key maps and themes
//! - Searching the command palette
//! - Following external edits to the settings file

use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::filter_palette;
use crate::config::{BUILTIN_THEMES, KEY_MAP_SCHEMES};
use crate::plugin::EditorSyncPlugin;
use crate::settings::{PendingWrite, SettingsStore, YamlSettingsStore};
use crate::settings_watcher::SettingsFileWatcher;
use crate::tracker::InstanceTracker;

const WATCH_INTERVAL: Duration = Duration::from_millis(200);

/// Keep embedded editor settings in sync
#[derive(Parser, Debug)]
#[command(name = "editor-sync", version, about = "Manage shared text editor settings")]
pub struct CliArgs {
    /// Settings file (defaults to ~/.config/editor-sync/settings.yaml)
    #[arg(long, value_name = "PATH", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Print the effective settings
    Show,
    /// Change the key map
    SetKeymap { name: String },
    /// Change the theme
    SetTheme { name: String },
    /// Turn bracket matching on or off
    MatchBrackets {
        #[arg(value_enum)]
        state: Switch,
    },
    /// List built-in key maps and themes, marking the active ones
    List,
    /// Search the command palette
    Palette {
        #[arg(default_value = "")]
        query: String,
    },
    /// Print the settings again whenever the file changes on disk
    Watch,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl CliArgs {
    /// Run the command, writing human-readable output to `out`
    pub fn run(self, out: &mut impl Write) -> Result<()> {
        if let CliCommand::Palette { query } = &self.command {
            return print_palette(query, out);
        }

        let store = Rc::new(match self.settings {
            Some(path) => YamlSettingsStore::new(path),
            None => YamlSettingsStore::open_default()?,
        });
        let path = store.path().to_path_buf();

        let plugin = EditorSyncPlugin::activate(
            Rc::clone(&store) as Rc<dyn SettingsStore>,
            Rc::new(InstanceTracker::new()),
        );
        if let Some(e) = plugin.load_error() {
            anyhow::bail!("Failed to load {}: {}", path.display(), e);
        }
        plugin.restored();

        let reconciler = plugin.reconciler();
        let pending = match self.command {
            CliCommand::Show => {
                let config = reconciler.config();
                writeln!(out, "keyMap: {}", config.key_map)?;
                writeln!(out, "theme: {}", config.theme)?;
                writeln!(out, "matchBrackets: {}", config.match_brackets)?;
                None
            }
            CliCommand::List => {
                writeln!(out, "Key maps:")?;
                for scheme in KEY_MAP_SCHEMES {
                    let mark = if reconciler.is_key_map(scheme.id) { '*' } else { ' ' };
                    writeln!(out, "{} {:<10} {}", mark, scheme.id, scheme.title)?;
                }
                writeln!(out, "Themes:")?;
                for theme in BUILTIN_THEMES {
                    let mark = if reconciler.is_theme(theme) { '*' } else { ' ' };
                    writeln!(out, "{} {}", mark, theme)?;
                }
                None
            }
            CliCommand::SetKeymap { name } => Some(reconciler.set_key_map(&name)),
            CliCommand::SetTheme { name } => Some(reconciler.set_theme(&name)),
            CliCommand::MatchBrackets { state } => {
                Some(reconciler.set_match_brackets(state == Switch::On))
            }
            CliCommand::Watch => {
                watch(&store, &plugin, out)?;
                None
            }
            CliCommand::Palette { .. } => None,
        };

        if let Some(pending) = pending {
            finish_write(pending, &path)?;
            store.pump();
            let config = reconciler.config();
            writeln!(
                out,
                "Saved keyMap={} theme={} matchBrackets={}",
                config.key_map, config.theme, config.match_brackets
            )?;
        }

        plugin.deactivate();
        Ok(())
    }
}

fn watch(store: &YamlSettingsStore, plugin: &EditorSyncPlugin, out: &mut impl Write) -> Result<()> {
    let watcher = SettingsFileWatcher::new(store.path().to_path_buf())
        .with_context(|| format!("Failed to watch {}", store.path().display()))?;
    writeln!(out, "Watching {}", watcher.path().display())?;

    loop {
        std::thread::sleep(WATCH_INTERVAL);
        if !watcher.poll() {
            continue;
        }
        match store.reload() {
            Ok(true) => {
                store.pump();
                let config = plugin.reconciler().config();
                writeln!(
                    out,
                    "keyMap={} theme={} matchBrackets={}",
                    config.key_map, config.theme, config.match_brackets
                )?;
                out.flush()?;
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to reload settings: {}", e),
        }
    }
}

fn finish_write(pending: PendingWrite, path: &std::path::Path) -> Result<()> {
    pending
        .wait()
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_palette(query: &str, out: &mut impl Write) -> Result<()> {
    for entry in filter_palette(query) {
        match entry.keybinding {
            Some(keys) => writeln!(out, "{}: {}  {}", entry.category, entry.label, keys)?,
            None => writeln!(out, "{}: {}", entry.category, entry.label)?,
        }
    }
    Ok(())
}
