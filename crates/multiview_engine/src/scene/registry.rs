//! Scene registry
//!
//! Tracks the scenes of one canvas in insertion order (which is also render
//! order) and keeps their bounds current through a single resize observer
//! shared by every container.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use super::record::{SceneId, SceneRecord, SharedSceneRecord};
use crate::context::{ContextError, ContextKey, ContextTree, ScopeId};
use crate::platform::{ElementId, LayoutElement, ResizeEntry, ResizeObserver};

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A scene with this id is already registered
    #[error("Scene '{0}' is already registered")]
    DuplicateId(SceneId),

    /// The container is not the element the scene was created for
    #[error("Scene '{0}' was created for a different container")]
    ContainerMismatch(SceneId),
}

/// Scenes of one canvas
pub struct SceneRegistry {
    order: Vec<SceneId>,
    scenes: HashMap<SceneId, SharedSceneRecord>,
    observer: Box<dyn ResizeObserver>,
    connected: bool,
}

impl SceneRegistry {
    /// Create an empty registry reporting through `observer`
    pub fn new(observer: impl ResizeObserver + 'static) -> Self {
        Self::with_observer(Box::new(observer))
    }

    /// Create an empty registry from a boxed observer
    pub fn with_observer(observer: Box<dyn ResizeObserver>) -> Self {
        Self {
            order: Vec::new(),
            scenes: HashMap::new(),
            observer,
            connected: true,
        }
    }

    /// Register `record` and start observing `container`
    ///
    /// `container` must be the element `record` was created for; resize
    /// matching and unobserving go through the record's container id.
    ///
    /// # Panics
    /// After [`destroy`](Self::destroy); the registry cannot be reused.
    pub fn add_scene(
        &mut self,
        record: SceneRecord,
        container: &LayoutElement,
    ) -> Result<SharedSceneRecord, RegistryError> {
        assert!(self.connected, "add_scene called on a destroyed scene registry");

        let id = record.id().clone();
        if self.scenes.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        if record.container_id() != container.id() {
            return Err(RegistryError::ContainerMismatch(id));
        }

        let shared = Rc::new(RefCell::new(record));
        self.scenes.insert(id.clone(), Rc::clone(&shared));
        self.order.push(id.clone());
        self.observer.observe(container);
        log::debug!("Registered scene {id} ({} total)", self.order.len());
        Ok(shared)
    }

    /// Look up a scene
    pub fn get_scene(&self, id: &SceneId) -> Option<SharedSceneRecord> {
        self.scenes.get(id).cloned()
    }

    /// Unregister a scene, returning whether it was registered
    ///
    /// The container stays observed while another scene is bound to it.
    pub fn destroy_scene(&mut self, id: &SceneId) -> bool {
        let Some(record) = self.scenes.remove(id) else {
            log::trace!("destroy_scene: {id} not registered");
            return false;
        };
        self.order.retain(|other| other != id);

        let container = record.borrow().container_id();
        if self.connected && !self.is_bound(container) {
            self.observer.unobserve(container);
        }
        log::debug!("Destroyed scene {id}");
        true
    }

    fn is_bound(&self, container: ElementId) -> bool {
        self.scenes
            .values()
            .any(|record| record.borrow().container_id() == container)
    }

    /// Disconnect the resize observer; idempotent
    pub fn destroy(&mut self) {
        if self.connected {
            self.observer.disconnect();
            self.connected = false;
            log::debug!("Scene registry destroyed with {} scenes", self.order.len());
        }
    }

    /// Apply one batch of resize notifications, returning the number of
    /// records updated
    ///
    /// Entries for elements without a scene are ignored.
    pub fn apply_resize_batch(&mut self, entries: &[ResizeEntry]) -> usize {
        let mut updated = 0;
        for entry in entries {
            let mut matched = false;
            for id in &self.order {
                let Some(record) = self.scenes.get(id) else {
                    continue;
                };
                let mut record = record.borrow_mut();
                if record.container_id() == entry.target {
                    record.apply_bounds(entry.rect);
                    matched = true;
                    updated += 1;
                }
            }
            if !matched {
                log::trace!("Resize entry for unbound element {:?}", entry.target);
            }
        }
        updated
    }

    /// Drain the observer and apply what it queued
    pub fn process_resize_notifications(&mut self) -> usize {
        if !self.connected {
            return 0;
        }
        let entries = self.observer.take_records();
        if entries.is_empty() {
            return 0;
        }
        self.apply_resize_batch(&entries)
    }

    /// Whether the observer holds notifications not applied yet
    pub fn has_pending_notifications(&self) -> bool {
        self.connected && self.observer.has_pending_records()
    }

    /// Scene ids in render order
    pub fn scene_ids(&self) -> Vec<SceneId> {
        self.order.clone()
    }

    /// Records in render order
    pub fn snapshot(&self) -> Vec<SharedSceneRecord> {
        self.order
            .iter()
            .filter_map(|id| self.scenes.get(id).cloned())
            .collect()
    }

    /// Number of registered scenes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no scene is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether [`destroy`](Self::destroy) has not been called yet
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Registry shared by everything below a canvas
pub type SharedRegistry = Rc<RefCell<SceneRegistry>>;

/// Key of the scene registry context
pub const SCENES_KEY: ContextKey<RefCell<SceneRegistry>> =
    ContextKey::new("multiview-scenes", "use_scenes", "<Canvas>");

/// Provide a new registry in `scope`, destroyed together with the scope
pub fn create_scenes_context(
    tree: &mut ContextTree,
    scope: ScopeId,
    observer: Box<dyn ResizeObserver>,
) -> Result<SharedRegistry, ContextError> {
    let registry = Rc::new(RefCell::new(SceneRegistry::with_observer(observer)));
    tree.provide(scope, &SCENES_KEY, Rc::clone(&registry))?;

    let hook = Rc::clone(&registry);
    tree.on_destroy(scope, move || hook.borrow_mut().destroy())?;
    Ok(registry)
}

/// Nearest registry above `scope`
pub fn use_scenes(tree: &ContextTree, scope: ScopeId) -> Result<SharedRegistry, ContextError> {
    tree.require(scope, &SCENES_KEY)
}
