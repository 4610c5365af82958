//! Startup ordering
//!
//! Configuration may only be served once the settings store has loaded and
//! the host has signalled that it finished restoring its layout. Either can
//! finish first. [`StartupGate`] records both and mints a single [`Ready`]
//! token for whichever call completes the pair.

use std::cell::Cell;

/// Proof that both startup conditions were met
///
/// Only [`StartupGate`] can create one.
#[derive(Debug)]
pub struct Ready {
    _private: (),
}

#[derive(Debug, Default)]
pub struct StartupGate {
    settings_loaded: Cell<bool>,
    restored: Cell<bool>,
    issued: Cell<bool>,
}

impl StartupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the settings store finished loading
    pub fn settings_loaded(&self) -> Option<Ready> {
        self.settings_loaded.set(true);
        self.try_issue()
    }

    /// Record that the host finished restoring
    pub fn restored(&self) -> Option<Ready> {
        self.restored.set(true);
        self.try_issue()
    }

    pub fn is_ready(&self) -> bool {
        self.settings_loaded.get() && self.restored.get()
    }

    fn try_issue(&self) -> Option<Ready> {
        if !self.is_ready() || self.issued.replace(true) {
            return None;
        }
        Some(Ready { _private: () })
    }
}
