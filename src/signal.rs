//! Single-threaded signals with explicit subscription handles
//!
//! Collaborators (settings store, instance tracker, reconciler) announce
//! events through a [`Signal<T>`]. Connecting returns a [`Subscription`]
//! that disconnects the slot when dropped, so teardown is deterministic:
//! drop the handles and nothing fires anymore.
//!
//! Emission snapshots the slot list first. Slots may connect or disconnect
//! other slots (or themselves) while a signal is being emitted; changes take
//! effect from the next emission.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Slot<T> = Rc<dyn Fn(&T)>;

struct Slots<T> {
    next_id: u64,
    entries: Vec<(u64, Slot<T>)>,
}

/// A typed, single-threaded event source
pub struct Signal<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Connect a slot, returning the handle that keeps it connected
    #[must_use = "dropping the Subscription disconnects the slot immediately"]
    pub fn connect(&self, slot: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Rc::new(slot)));
            id
        };

        let weak: Weak<RefCell<Slots<T>>> = Rc::downgrade(&self.slots);
        Subscription {
            disconnect: Some(Box::new(move || {
                if let Some(slots) = weak.upgrade() {
                    slots.borrow_mut().entries.retain(|(slot_id, _)| *slot_id != id);
                }
            })),
        }
    }

    /// Invoke every connected slot with `payload`
    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<Slot<T>> = self
            .slots
            .borrow()
            .entries
            .iter()
            .map(|(_, slot)| Rc::clone(slot))
            .collect();

        for slot in snapshot {
            slot(payload);
        }
    }

    /// Number of currently connected slots
    pub fn slot_count(&self) -> usize {
        self.slots.borrow().entries.len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.borrow().entries.len())
            .finish()
    }
}

/// Handle for a connected slot
///
/// The slot stays connected for as long as the handle lives.
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Disconnect now instead of at drop
    pub fn disconnect(mut self) {
        self.run_disconnect();
    }

    fn run_disconnect(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_disconnect();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}
