//! Scene creation inside a canvas

use std::cell::RefCell;
use std::rc::Rc;

use super::record::{SceneId, SceneRecord, SharedSceneRecord};
use super::registry::use_scenes;
use crate::context::{ContextError, ContextKey, ContextTree, ScopeId};
use crate::error::EngineError;
use crate::platform::LayoutElement;
use crate::render::{use_camera, use_renderer, SceneGraphDescriptor};
use crate::scheduler::use_scheduler;

/// Attribute carrying the scene id on its container
pub const SCENE_ID_ATTRIBUTE: &str = "data-scene-id";

/// Key of the scene context
pub const SCENE_KEY: ContextKey<RefCell<SceneRecord>> =
    ContextKey::new("multiview-scene", "use_scene", "<Scene>");

/// Create a scene bound to `container` and provide it in `scope`
///
/// The scene gets a fresh id, a white scene graph and the canvas' default
/// camera. It is registered with the canvas' registry and unregistered when
/// `scope` is destroyed.
pub fn create_scene_context(
    tree: &mut ContextTree,
    scope: ScopeId,
    container: &Rc<LayoutElement>,
) -> Result<SharedSceneRecord, EngineError> {
    let registry = use_scenes(tree, scope)?;
    let renderer = use_renderer(tree, scope)?;
    let camera = use_camera(tree, scope)?;
    let scheduler = use_scheduler(tree, scope)?;

    let id = SceneId::generate();
    container.set_attribute(SCENE_ID_ATTRIBUTE, id.as_str());

    let scene_graph = renderer
        .borrow_mut()
        .create_scene_graph(SceneGraphDescriptor::default().labeled(id.as_str()))?;
    let record = SceneRecord::new(id.clone(), container)
        .with_camera(camera)
        .with_scene_graph(scene_graph);
    let shared = registry.borrow_mut().add_scene(record, container)?;

    tree.provide(scope, &SCENE_KEY, Rc::clone(&shared))?;
    tree.on_destroy(scope, move || {
        registry.borrow_mut().destroy_scene(&id);
    })?;

    scheduler.borrow_mut().invalidate();
    Ok(shared)
}

/// Nearest scene above `scope`
pub fn use_scene(tree: &ContextTree, scope: ScopeId) -> Result<SharedSceneRecord, ContextError> {
    tree.require(scope, &SCENE_KEY)
}
