//! Resize observation
//!
//! One observer is shared by every scene of a canvas. Hosts push rectangle
//! changes into it and the scene registry drains them once per frame.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::foundation::rect::BoundingBox;

use super::layout::{ElementId, LayoutElement};

/// "Element X's rectangle is now R"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEntry {
    /// Element whose rectangle changed
    pub target: ElementId,
    /// New canvas-local rectangle
    pub rect: BoundingBox,
}

impl ResizeEntry {
    /// Create a new entry
    pub fn new(target: ElementId, rect: BoundingBox) -> Self {
        Self { target, rect }
    }
}

/// Batched rectangle-change notifications for a set of observed elements
pub trait ResizeObserver {
    /// Start reporting changes for `element`
    fn observe(&mut self, element: &LayoutElement);

    /// Stop reporting changes for `element`
    fn unobserve(&mut self, element: ElementId);

    /// Stop reporting changes for every element
    fn disconnect(&mut self);

    /// Take every notification queued since the last call, oldest first
    fn take_records(&mut self) -> Vec<ResizeEntry>;

    /// Whether notifications are waiting to be taken
    fn has_pending_records(&self) -> bool;
}

#[derive(Debug, Default)]
struct ObserverState {
    observed: HashSet<ElementId>,
    pending: Vec<ResizeEntry>,
    disconnected: bool,
}

/// In-process [`ResizeObserver`] fed by the host
///
/// Clones share the same queue, so the host keeps one clone to push
/// notifications while the registry owns another.
#[derive(Debug, Clone, Default)]
pub struct QueuedResizeObserver {
    state: Rc<RefCell<ObserverState>>,
}

impl QueuedResizeObserver {
    /// Create an observer with nothing observed
    pub fn new() -> Self {
        Self::default()
    }

    /// Report that `element` now occupies `rect`
    ///
    /// Dropped when the element is not observed or the observer is
    /// disconnected. Returns whether the notification was queued.
    pub fn notify(&self, element: ElementId, rect: BoundingBox) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disconnected || !state.observed.contains(&element) {
            log::trace!("Dropping resize notification for unobserved {element:?}");
            return false;
        }
        state.pending.push(ResizeEntry::new(element, rect));
        true
    }

    /// Read `element`'s current rectangle and report it
    pub fn notify_element(&self, element: &LayoutElement) -> bool {
        self.notify(element.id(), element.bounding_rect())
    }

    /// Whether `element` is currently observed
    pub fn is_observing(&self, element: ElementId) -> bool {
        self.state.borrow().observed.contains(&element)
    }

    /// Number of observed elements
    pub fn observed_count(&self) -> usize {
        self.state.borrow().observed.len()
    }

    /// Number of queued notifications
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Whether [`ResizeObserver::disconnect`] was called
    pub fn is_disconnected(&self) -> bool {
        self.state.borrow().disconnected
    }
}

impl ResizeObserver for QueuedResizeObserver {
    fn observe(&mut self, element: &LayoutElement) {
        let mut state = self.state.borrow_mut();
        if state.disconnected {
            log::warn!("observe() on a disconnected resize observer");
            return;
        }
        // Observation starts with a notification of the current rectangle.
        if state.observed.insert(element.id()) {
            state
                .pending
                .push(ResizeEntry::new(element.id(), element.bounding_rect()));
        }
    }

    fn unobserve(&mut self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        state.observed.remove(&element);
        state.pending.retain(|entry| entry.target != element);
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.observed.clear();
        state.pending.clear();
        state.disconnected = true;
    }

    fn take_records(&mut self) -> Vec<ResizeEntry> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }

    fn has_pending_records(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(left: f32) -> Rc<LayoutElement> {
        LayoutElement::new(BoundingBox::from_origin_size(left, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_observe_queues_initial_rect() {
        let mut observer = QueuedResizeObserver::new();
        let a = element(3.0);
        observer.observe(&a);
        observer.observe(&a);

        let records = observer.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rect.left, 3.0);
        assert!(observer.take_records().is_empty());
    }

    #[test]
    fn test_unobserved_notifications_are_dropped() {
        let mut observer = QueuedResizeObserver::new();
        let a = element(0.0);
        let b = element(0.0);
        observer.observe(&a);
        observer.take_records();

        assert!(observer.notify(a.id(), BoundingBox::default()));
        assert!(!observer.notify(b.id(), BoundingBox::default()));

        observer.unobserve(a.id());
        assert_eq!(observer.pending_count(), 0);
        assert!(!observer.notify(a.id(), BoundingBox::default()));
    }

    #[test]
    fn test_clones_share_queue() {
        let mut registry_side = QueuedResizeObserver::new();
        let host_side = registry_side.clone();
        let a = element(0.0);
        registry_side.observe(&a);
        registry_side.take_records();

        a.set_bounding_rect(BoundingBox::from_origin_size(50.0, 0.0, 10.0, 10.0));
        host_side.notify_element(&a);

        assert_eq!(registry_side.take_records()[0].rect.left, 50.0);
    }

    #[test]
    fn test_disconnect_stops_everything() {
        let mut observer = QueuedResizeObserver::new();
        let a = element(0.0);
        observer.observe(&a);
        observer.disconnect();

        assert!(observer.is_disconnected());
        assert!(!observer.notify(a.id(), BoundingBox::default()));
        observer.observe(&a);
        assert_eq!(observer.observed_count(), 0);
        assert!(observer.take_records().is_empty());
    }
}
