//! Deferred completion for settings writes

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::SettingsError;

/// Result of a settings write that may not have landed yet
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    rx: Receiver<Result<(), SettingsError>>,
    outcome: Option<Result<(), SettingsError>>,
}

/// Writer side of a [`PendingWrite`]
///
/// Dropping it without calling [`WriteCompleter::complete`] resolves the
/// pending write to [`SettingsError::Cancelled`].
#[derive(Debug)]
pub struct WriteCompleter {
    tx: Sender<Result<(), SettingsError>>,
}

impl PendingWrite {
    /// Create a linked completer/pending pair
    pub fn channel() -> (WriteCompleter, PendingWrite) {
        let (tx, rx) = mpsc::channel();
        (
            WriteCompleter { tx },
            PendingWrite { rx, outcome: None },
        )
    }

    /// A write that has already completed
    pub fn ready(result: Result<(), SettingsError>) -> Self {
        let (completer, pending) = Self::channel();
        completer.complete(result);
        pending
    }

    /// Non-blocking check; `None` while the write is still in flight
    pub fn try_result(&mut self) -> Option<Result<(), SettingsError>> {
        if self.outcome.is_none() {
            self.outcome = match self.rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(SettingsError::Cancelled)),
            };
        }
        self.outcome.clone()
    }

    /// Whether the write has completed (successfully or not)
    pub fn is_complete(&mut self) -> bool {
        self.try_result().is_some()
    }

    /// Block until the write completes
    pub fn wait(mut self) -> Result<(), SettingsError> {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }
        self.rx.recv().unwrap_or(Err(SettingsError::Cancelled))
    }
}

impl WriteCompleter {
    /// Resolve the linked [`PendingWrite`]
    pub fn complete(self, result: Result<(), SettingsError>) {
        // The caller may have dropped its handle; nobody is waiting then.
        let _ = self.tx.send(result);
    }
}
