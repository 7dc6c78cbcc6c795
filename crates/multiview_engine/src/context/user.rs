//! Per-canvas store for application data

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{ContextError, ContextKey, ContextTree, ScopeId};

/// Key of the user context
pub const USER_KEY: ContextKey<UserContext> =
    ContextKey::new("multiview-user-context", "use_user_context", "<Canvas>");

/// Typed key/value store shared by everything below a canvas
#[derive(Default)]
pub struct UserContext {
    values: RefCell<HashMap<String, Rc<dyn Any>>>,
}

impl UserContext {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set<T: 'static>(&self, key: impl Into<String>, value: T) {
        self.values.borrow_mut().insert(key.into(), Rc::new(value));
    }

    /// Get the value under `key` if it has type `T`
    pub fn get<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
        let value = self.values.borrow().get(key).cloned()?;
        Rc::downcast::<T>(value).ok()
    }

    /// Remove the value under `key`, returning whether one existed
    pub fn remove(&self, key: &str) -> bool {
        self.values.borrow_mut().remove(key).is_some()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

/// Provide an empty user context in `scope`
pub fn create_user_context(
    tree: &mut ContextTree,
    scope: ScopeId,
) -> Result<Rc<UserContext>, ContextError> {
    let context = Rc::new(UserContext::new());
    tree.provide(scope, &USER_KEY, Rc::clone(&context))?;
    Ok(context)
}

/// Get the user context visible from `scope`
pub fn use_user_context(tree: &ContextTree, scope: ScopeId) -> Result<Rc<UserContext>, ContextError> {
    tree.require(scope, &USER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_get() {
        let store = UserContext::new();
        store.set("selected", 3_usize);

        assert_eq!(store.get::<usize>("selected").as_deref(), Some(&3));
        assert!(store.get::<String>("selected").is_none());
        assert!(store.remove("selected"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_shared_through_tree() {
        let mut tree = ContextTree::new();
        let canvas = tree.create_scope(tree.root()).unwrap();
        let scene = tree.create_scope(canvas).unwrap();
        create_user_context(&mut tree, canvas).unwrap();

        use_user_context(&tree, scene).unwrap().set("hover", true);

        let from_canvas = use_user_context(&tree, canvas).unwrap();
        assert_eq!(from_canvas.get::<bool>("hover").as_deref(), Some(&true));
        assert_eq!(from_canvas.len(), 1);
    }
}
