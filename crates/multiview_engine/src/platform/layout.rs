//! Layout elements owned by the host

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::rect::BoundingBox;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a layout element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A rectangular region of the page a scene can be bound to
///
/// The host owns elements (usually as `Rc<LayoutElement>`); the engine only
/// keeps weak references and element ids.
#[derive(Debug)]
pub struct LayoutElement {
    id: ElementId,
    rect: Cell<BoundingBox>,
    attributes: RefCell<HashMap<String, String>>,
}

impl LayoutElement {
    /// Create an element with the given canvas-local rectangle
    pub fn new(rect: BoundingBox) -> Rc<Self> {
        Rc::new(Self {
            id: ElementId::next(),
            rect: Cell::new(rect),
            attributes: RefCell::new(HashMap::new()),
        })
    }

    /// Element identifier
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Current rectangle as laid out by the host
    pub fn bounding_rect(&self) -> BoundingBox {
        self.rect.get()
    }

    /// Update the rectangle (host layout pass)
    pub fn set_bounding_rect(&self, rect: BoundingBox) {
        self.rect.set(rect);
    }

    /// Set a string attribute on the element
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.borrow_mut().insert(name.into(), value.into());
    }

    /// Read a string attribute
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = LayoutElement::new(BoundingBox::default());
        let b = LayoutElement::new(BoundingBox::default());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_attributes_and_rect() {
        let element = LayoutElement::new(BoundingBox::from_origin_size(0.0, 0.0, 10.0, 10.0));
        element.set_attribute("data-scene-id", "abc");
        element.set_bounding_rect(BoundingBox::from_origin_size(5.0, 5.0, 10.0, 10.0));

        assert_eq!(element.attribute("data-scene-id").as_deref(), Some("abc"));
        assert_eq!(element.bounding_rect().left, 5.0);
    }
}
