//! # Hierarchical Context Propagation
//!
//! A lookup table of values keyed by scope. Scopes form a tree that mirrors
//! the component tree of the host: a canvas scope with one child scope per
//! scene. A value provided in a scope is visible to every descendant scope.
//!
//! Destroying a scope runs its destroy hooks (descendants first, each scope's
//! hooks in reverse registration order) and drops every value it provided.
//!
//! ```
//! use std::rc::Rc;
//! use multiview_engine::context::{ContextKey, ContextTree};
//!
//! const ANSWER: ContextKey<u32> = ContextKey::new("answer", "use_answer", "<Question>");
//!
//! let mut tree = ContextTree::new();
//! let child = tree.create_scope(tree.root()).unwrap();
//! tree.provide(tree.root(), &ANSWER, Rc::new(42)).unwrap();
//! assert_eq!(*tree.require(child, &ANSWER).unwrap(), 42);
//! ```

pub mod user;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use slotmap::SlotMap;
use thiserror::Error;

pub use user::{create_user_context, use_user_context, UserContext, USER_KEY};

slotmap::new_key_type! {
    /// Identifier of one scope in a [`ContextTree`]
    pub struct ScopeId;
}

/// Typed key under which a context value is provided
///
/// `accessor` and `ancestor` only feed the error message produced when the
/// value is required outside of the scope that provides it.
pub struct ContextKey<T> {
    name: &'static str,
    accessor: &'static str,
    ancestor: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Create a new key
    pub const fn new(name: &'static str, accessor: &'static str, ancestor: &'static str) -> Self {
        Self {
            name,
            accessor,
            ancestor,
            _marker: PhantomData,
        }
    }

    /// Unique key name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn missing(&self) -> ContextError {
        ContextError::Missing {
            accessor: self.accessor,
            ancestor: self.ancestor,
        }
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextKey").field("name", &self.name).finish()
    }
}

/// Context lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A context accessor was used outside of its required ancestor
    #[error("{accessor} can only be used in a child component to {ancestor}.")]
    Missing {
        /// Name of the accessor that failed
        accessor: &'static str,
        /// Component that must provide the value
        ancestor: &'static str,
    },

    /// The scope was never created or has been destroyed
    #[error("Unknown context scope: {0:?}")]
    UnknownScope(ScopeId),

    /// A value exists under the key but has a different type
    #[error("Context value '{0}' has an unexpected type")]
    TypeMismatch(&'static str),
}

type DestroyHook = Box<dyn FnOnce()>;

#[derive(Default)]
struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    values: HashMap<&'static str, Rc<dyn Any>>,
    destroy_hooks: Vec<DestroyHook>,
}

/// Tree of scopes holding context values
pub struct ContextTree {
    scopes: SlotMap<ScopeId, Scope>,
    root: ScopeId,
}

impl ContextTree {
    /// Create a tree containing only the root scope
    pub fn new() -> Self {
        let mut scopes = SlotMap::with_key();
        let root = scopes.insert(Scope::default());
        Self { scopes, root }
    }

    /// The root scope, never removed
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Whether the scope is alive
    pub fn contains(&self, scope: ScopeId) -> bool {
        self.scopes.contains_key(scope)
    }

    /// Number of live scopes, root included
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Create a child scope under `parent`
    pub fn create_scope(&mut self, parent: ScopeId) -> Result<ScopeId, ContextError> {
        if !self.scopes.contains_key(parent) {
            return Err(ContextError::UnknownScope(parent));
        }

        let scope = self.scopes.insert(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        if let Some(parent_scope) = self.scopes.get_mut(parent) {
            parent_scope.children.push(scope);
        }
        Ok(scope)
    }

    /// Provide `value` under `key` for `scope` and its descendants
    ///
    /// Providing the same key twice in one scope replaces the earlier value.
    pub fn provide<T: 'static>(
        &mut self,
        scope: ScopeId,
        key: &ContextKey<T>,
        value: Rc<T>,
    ) -> Result<(), ContextError> {
        let entry = self
            .scopes
            .get_mut(scope)
            .ok_or(ContextError::UnknownScope(scope))?;
        if entry.values.insert(key.name, value).is_some() {
            log::debug!("Context '{}' replaced in scope {:?}", key.name, scope);
        }
        Ok(())
    }

    /// Find the nearest value for `key`, starting at `scope`
    pub fn lookup<T: 'static>(&self, scope: ScopeId, key: &ContextKey<T>) -> Option<Rc<T>> {
        self.find(scope, key.name)
            .and_then(|value| Rc::downcast::<T>(value).ok())
    }

    /// Like [`lookup`](Self::lookup) but fails when the value is absent
    pub fn require<T: 'static>(
        &self,
        scope: ScopeId,
        key: &ContextKey<T>,
    ) -> Result<Rc<T>, ContextError> {
        if !self.scopes.contains_key(scope) {
            return Err(ContextError::UnknownScope(scope));
        }
        let value = self.find(scope, key.name).ok_or_else(|| key.missing())?;
        Rc::downcast::<T>(value).map_err(|_| ContextError::TypeMismatch(key.name))
    }

    /// Register a hook that runs when `scope` is destroyed
    pub fn on_destroy(
        &mut self,
        scope: ScopeId,
        hook: impl FnOnce() + 'static,
    ) -> Result<(), ContextError> {
        self.scopes
            .get_mut(scope)
            .ok_or(ContextError::UnknownScope(scope))?
            .destroy_hooks
            .push(Box::new(hook));
        Ok(())
    }

    /// Destroy `scope` and all of its descendants
    ///
    /// Destroying the root runs its hooks and clears its values but keeps the
    /// root scope itself. Unknown scopes are ignored.
    pub fn destroy_scope(&mut self, scope: ScopeId) {
        let Some(entry) = self.scopes.get_mut(scope) else {
            log::trace!("Ignoring destroy of unknown scope {scope:?}");
            return;
        };
        let children = std::mem::take(&mut entry.children);
        for child in children {
            self.destroy_scope(child);
        }

        let hooks = if scope == self.root {
            let Some(root) = self.scopes.get_mut(scope) else {
                return;
            };
            root.values.clear();
            std::mem::take(&mut root.destroy_hooks)
        } else {
            let Some(removed) = self.scopes.remove(scope) else {
                return;
            };
            if let Some(parent) = removed.parent.and_then(|p| self.scopes.get_mut(p)) {
                parent.children.retain(|child| *child != scope);
            }
            removed.destroy_hooks
        };

        for hook in hooks.into_iter().rev() {
            hook();
        }
    }

    fn find(&self, scope: ScopeId, name: &'static str) -> Option<Rc<dyn Any>> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let entry = self.scopes.get(id)?;
            if let Some(value) = entry.values.get(name) {
                return Some(Rc::clone(value));
            }
            current = entry.parent;
        }
        None
    }
}

impl Default for ContextTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const NUMBER: ContextKey<i32> = ContextKey::new("number", "use_number", "<Numbers>");
    const TEXT: ContextKey<String> = ContextKey::new("number", "use_text", "<Numbers>");

    #[test]
    fn test_lookup_walks_ancestors() {
        let mut tree = ContextTree::new();
        let child = tree.create_scope(tree.root()).unwrap();
        let grandchild = tree.create_scope(child).unwrap();
        tree.provide(child, &NUMBER, Rc::new(7)).unwrap();

        assert_eq!(tree.lookup(grandchild, &NUMBER).as_deref(), Some(&7));
        assert!(tree.lookup(tree.root(), &NUMBER).is_none());
    }

    #[test]
    fn test_nearest_value_wins() {
        let mut tree = ContextTree::new();
        let child = tree.create_scope(tree.root()).unwrap();
        tree.provide(tree.root(), &NUMBER, Rc::new(1)).unwrap();
        tree.provide(child, &NUMBER, Rc::new(2)).unwrap();

        assert_eq!(*tree.require(child, &NUMBER).unwrap(), 2);
        assert_eq!(*tree.require(tree.root(), &NUMBER).unwrap(), 1);
    }

    #[test]
    fn test_missing_context_message() {
        let tree = ContextTree::new();
        let err = tree.require(tree.root(), &NUMBER).unwrap_err();

        assert_eq!(
            err.to_string(),
            "use_number can only be used in a child component to <Numbers>."
        );
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let mut tree = ContextTree::new();
        tree.provide(tree.root(), &NUMBER, Rc::new(3)).unwrap();

        assert_eq!(
            tree.require(tree.root(), &TEXT).unwrap_err(),
            ContextError::TypeMismatch("number")
        );
    }

    #[test]
    fn test_destroy_runs_hooks_children_first() {
        let mut tree = ContextTree::new();
        let parent = tree.create_scope(tree.root()).unwrap();
        let child = tree.create_scope(parent).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (scope, label) in [(parent, "parent-a"), (parent, "parent-b"), (child, "child")] {
            let log = Rc::clone(&log);
            tree.on_destroy(scope, move || log.borrow_mut().push(label)).unwrap();
        }

        tree.destroy_scope(parent);

        assert_eq!(*log.borrow(), vec!["child", "parent-b", "parent-a"]);
        assert!(!tree.contains(parent));
        assert!(!tree.contains(child));
        assert_eq!(tree.scope_count(), 1);
    }

    #[test]
    fn test_destroyed_scope_is_unknown() {
        let mut tree = ContextTree::new();
        let scope = tree.create_scope(tree.root()).unwrap();
        tree.destroy_scope(scope);
        tree.destroy_scope(scope);

        assert_eq!(tree.create_scope(scope), Err(ContextError::UnknownScope(scope)));
        assert_eq!(
            tree.require(scope, &NUMBER).unwrap_err(),
            ContextError::UnknownScope(scope)
        );
    }

    #[test]
    fn test_destroying_root_keeps_tree_usable() {
        let mut tree = ContextTree::new();
        tree.provide(tree.root(), &NUMBER, Rc::new(5)).unwrap();
        tree.destroy_scope(tree.root());

        assert!(tree.contains(tree.root()));
        assert!(tree.lookup(tree.root(), &NUMBER).is_none());
    }
}
