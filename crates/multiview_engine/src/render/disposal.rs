//! Deferred resource release
//!
//! Releasing resources while a frame is being drawn is unsafe for most
//! backends, so release closures are queued and run at the start of the next
//! frame.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ContextError, ContextKey, ContextTree, ScopeId};

type Release = Box<dyn FnOnce()>;

/// Queue of release closures
#[derive(Default)]
pub struct DisposalQueue {
    pending: RefCell<Vec<Release>>,
}

impl DisposalQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `release` for the next [`dispose`](Self::dispose)
    pub fn defer(&self, release: impl FnOnce() + 'static) {
        self.pending.borrow_mut().push(Box::new(release));
    }

    /// Run every queued closure in queue order, returning how many ran
    ///
    /// Closures queued while draining run on the next call.
    pub fn dispose(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let count = pending.len();
        for release in pending {
            release();
        }
        if count > 0 {
            log::debug!("Disposed {count} deferred resources");
        }
        count
    }

    /// Number of queued closures
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

/// Key of the disposal context
pub const DISPOSAL_KEY: ContextKey<DisposalQueue> =
    ContextKey::new("multiview-disposal", "use_disposal", "<Canvas>");

/// Provide an empty disposal queue in `scope`
pub fn create_disposal_context(
    tree: &mut ContextTree,
    scope: ScopeId,
) -> Result<Rc<DisposalQueue>, ContextError> {
    let queue = Rc::new(DisposalQueue::new());
    tree.provide(scope, &DISPOSAL_KEY, Rc::clone(&queue))?;
    Ok(queue)
}

/// Nearest disposal queue above `scope`
pub fn use_disposal(tree: &ContextTree, scope: ScopeId) -> Result<Rc<DisposalQueue>, ContextError> {
    tree.require(scope, &DISPOSAL_KEY)
}
