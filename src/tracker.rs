//! Tracking of open editor instances
//!
//! The host owns editor lifetimes and reports them here; the tracker keeps
//! the set in insertion order, remembers which one is current, and fires
//! typed signals the plugin subscribes to.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::editor::{EditorWidget, InstanceId};
use crate::signal::Signal;

/// Payload of [`InstanceTracker::added`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceAdded {
    pub id: InstanceId,
    /// Number of tracked instances after the addition
    pub count: usize,
}

/// Payload of [`InstanceTracker::removed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceRemoved {
    pub id: InstanceId,
    /// Number of tracked instances after the removal
    pub count: usize,
}

/// Payload of [`InstanceTracker::current_changed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentChanged {
    pub previous: Option<InstanceId>,
    pub current: Option<InstanceId>,
    pub count: usize,
}

/// The set of open editor instances
#[derive(Default)]
pub struct InstanceTracker {
    instances: RefCell<Vec<Rc<dyn EditorWidget>>>,
    current: Cell<Option<InstanceId>>,
    added: Signal<InstanceAdded>,
    removed: Signal<InstanceRemoved>,
    current_changed: Signal<CurrentChanged>,
}

impl InstanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `widget`
    ///
    /// The first instance becomes current. Returns `false` if an instance
    /// with the same id is already tracked.
    pub fn add(&self, widget: Rc<dyn EditorWidget>) -> bool {
        let id = widget.id();
        let count = {
            let mut instances = self.instances.borrow_mut();
            if instances.iter().any(|existing| existing.id() == id) {
                tracing::warn!("Ignoring duplicate editor instance {}", id);
                return false;
            }
            instances.push(widget);
            instances.len()
        };

        tracing::debug!("Tracking {} ({} open)", id, count);
        self.added.emit(&InstanceAdded { id, count });

        if self.current.get().is_none() {
            self.set_current(Some(id));
        }
        true
    }

    /// Stop tracking `id`, returning the widget if it was tracked
    ///
    /// When the current instance goes away, the most recently added
    /// remaining instance becomes current.
    pub fn remove(&self, id: InstanceId) -> Option<Rc<dyn EditorWidget>> {
        let (widget, count, fallback) = {
            let mut instances = self.instances.borrow_mut();
            let index = instances.iter().position(|widget| widget.id() == id)?;
            let widget = instances.remove(index);
            let fallback = instances.last().map(|widget| widget.id());
            (widget, instances.len(), fallback)
        };

        tracing::debug!("Stopped tracking {} ({} open)", id, count);
        self.removed.emit(&InstanceRemoved { id, count });

        if self.current.get() == Some(id) {
            self.set_current(fallback);
        }
        Some(widget)
    }

    /// Make `id` current; ids that are not tracked are ignored
    pub fn set_current(&self, id: Option<InstanceId>) {
        if let Some(id) = id {
            if !self.contains(id) {
                tracing::warn!("Cannot focus untracked editor instance {}", id);
                return;
            }
        }

        let previous = self.current.replace(id);
        if previous == id {
            return;
        }
        self.current_changed.emit(&CurrentChanged {
            previous,
            current: id,
            count: self.len(),
        });
    }

    /// The focused instance, if any
    pub fn current(&self) -> Option<Rc<dyn EditorWidget>> {
        let id = self.current.get()?;
        self.get(id)
    }

    pub fn current_id(&self) -> Option<InstanceId> {
        self.current.get()
    }

    pub fn get(&self, id: InstanceId) -> Option<Rc<dyn EditorWidget>> {
        self.instances
            .borrow()
            .iter()
            .find(|widget| widget.id() == id)
            .cloned()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.borrow().iter().any(|widget| widget.id() == id)
    }

    /// Snapshot of every tracked instance, in insertion order
    pub fn instances(&self) -> Vec<Rc<dyn EditorWidget>> {
        self.instances.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }

    pub fn added(&self) -> &Signal<InstanceAdded> {
        &self.added
    }

    pub fn removed(&self) -> &Signal<InstanceRemoved> {
        &self.removed
    }

    pub fn current_changed(&self) -> &Signal<CurrentChanged> {
        &self.current_changed
    }
}

impl std::fmt::Debug for InstanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<InstanceId> = self.instances.borrow().iter().map(|w| w.id()).collect();
        f.debug_struct("InstanceTracker")
            .field("instances", &ids)
            .field("current", &self.current.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::OptionBag;

    struct Plain(u64);

    impl EditorWidget for Plain {
        fn id(&self) -> InstanceId {
            InstanceId(self.0)
        }

        fn native_options(&self) -> Option<&dyn OptionBag> {
            None
        }
    }

    fn plain(id: u64) -> Rc<dyn EditorWidget> {
        Rc::new(Plain(id))
    }

    #[test]
    fn test_first_instance_becomes_current() {
        let tracker = InstanceTracker::new();
        tracker.add(plain(1));
        tracker.add(plain(2));
        assert_eq!(tracker.current_id(), Some(InstanceId(1)));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let tracker = InstanceTracker::new();
        assert!(tracker.add(plain(1)));
        assert!(!tracker.add(plain(1)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_removing_current_falls_back_to_latest() {
        let tracker = InstanceTracker::new();
        tracker.add(plain(1));
        tracker.add(plain(2));
        tracker.add(plain(3));
        tracker.set_current(Some(InstanceId(2)));

        tracker.remove(InstanceId(2));
        assert_eq!(tracker.current_id(), Some(InstanceId(3)));

        tracker.remove(InstanceId(3));
        tracker.remove(InstanceId(1));
        assert_eq!(tracker.current_id(), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let tracker = InstanceTracker::new();
        assert!(tracker.remove(InstanceId(9)).is_none());
    }

    #[test]
    fn test_signals_carry_counts() {
        let tracker = InstanceTracker::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let on_add = Rc::clone(&log);
        let _a = tracker
            .added()
            .connect(move |e| on_add.borrow_mut().push(("added", e.count)));
        let on_remove = Rc::clone(&log);
        let _r = tracker
            .removed()
            .connect(move |e| on_remove.borrow_mut().push(("removed", e.count)));

        tracker.add(plain(1));
        tracker.add(plain(2));
        tracker.remove(InstanceId(1));

        assert_eq!(
            *log.borrow(),
            vec![("added", 1), ("added", 2), ("removed", 1)]
        );
    }

    #[test]
    fn test_set_current_ignores_untracked() {
        let tracker = InstanceTracker::new();
        tracker.add(plain(1));
        tracker.set_current(Some(InstanceId(5)));
        assert_eq!(tracker.current_id(), Some(InstanceId(1)));
    }
}
