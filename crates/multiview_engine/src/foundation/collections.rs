//! Specialized collection types

pub use slotmap::{DefaultKey, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Typed handle for type-safe resource references
#[derive(Debug)]
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> DefaultKey {
        self.key
    }
}

// Manual impls: derives would require `T: Clone` etc.
impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> std::hash::Hash for TypedHandle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Slot map that hands out [`TypedHandle`]s instead of raw keys
pub struct TypedHandleMap<T> {
    items: HandleMap<T>,
}

impl<T> TypedHandleMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            items: HandleMap::new(),
        }
    }

    /// Insert a value and return its handle
    pub fn insert(&mut self, value: T) -> TypedHandle<T> {
        TypedHandle::new(self.items.insert(value))
    }

    /// Remove a value by handle
    pub fn remove(&mut self, handle: TypedHandle<T>) -> Option<T> {
        self.items.remove(handle.key())
    }

    /// Get a value by handle
    pub fn get(&self, handle: TypedHandle<T>) -> Option<&T> {
        self.items.get(handle.key())
    }

    /// Check whether a handle is still live
    pub fn contains(&self, handle: TypedHandle<T>) -> bool {
        self.items.contains_key(handle.key())
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every value
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Default for TypedHandleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_handle_is_not_reused() {
        let mut map = TypedHandleMap::new();
        let first = map.insert("first");
        map.remove(first);
        let second = map.insert("second");

        assert_ne!(first, second);
        assert!(map.get(first).is_none());
        assert_eq!(map.get(second), Some(&"second"));
        assert_eq!(map.len(), 1);
    }
}
