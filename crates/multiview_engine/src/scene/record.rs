//! Scene records
//!
//! One record per logical scene on a canvas: where the scene sits on the
//! canvas, what to draw and through which camera.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::foundation::rect::BoundingBox;
use crate::platform::{ElementId, LayoutElement};
use crate::render::{SceneGraphHandle, SharedCamera};

/// Opaque scene identifier, unique within a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(String);

impl SceneId {
    /// Generate a random (v4 UUID) identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use an existing string as identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// State of one scene bound to a layout element
#[derive(Debug)]
pub struct SceneRecord {
    id: SceneId,
    bounding_box: BoundingBox,
    camera: Option<SharedCamera>,
    scene_graph: Option<SceneGraphHandle>,
    container: Weak<LayoutElement>,
    container_id: ElementId,
    visibility_counter: u32,
}

impl SceneRecord {
    /// Record bound to `container`, with the container's current rectangle
    pub fn new(id: SceneId, container: &Rc<LayoutElement>) -> Self {
        Self {
            id,
            bounding_box: container.bounding_rect(),
            camera: None,
            scene_graph: None,
            container: Rc::downgrade(container),
            container_id: container.id(),
            visibility_counter: 0,
        }
    }

    /// Set the camera the scene is drawn through
    #[must_use]
    pub fn with_camera(mut self, camera: SharedCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Set the scene graph; it cannot be replaced afterwards
    #[must_use]
    pub fn with_scene_graph(mut self, scene_graph: SceneGraphHandle) -> Self {
        self.scene_graph = Some(scene_graph);
        self
    }

    /// Override the initial bounds
    #[must_use]
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Scene identifier
    pub fn id(&self) -> &SceneId {
        &self.id
    }

    /// Canvas-local bounds, as last reported for the container
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Active camera
    pub fn camera(&self) -> Option<&SharedCamera> {
        self.camera.as_ref()
    }

    /// Replace the active camera
    pub fn set_camera(&mut self, camera: Option<SharedCamera>) {
        self.camera = camera;
    }

    /// Scene graph to draw
    pub fn scene_graph(&self) -> Option<SceneGraphHandle> {
        self.scene_graph
    }

    /// The container, if the host still holds it
    pub fn container(&self) -> Option<Rc<LayoutElement>> {
        self.container.upgrade()
    }

    /// Id of the container, valid after the container is dropped
    pub fn container_id(&self) -> ElementId {
        self.container_id
    }

    /// Reserved counter, reset whenever the bounds change
    pub fn visibility_counter(&self) -> u32 {
        self.visibility_counter
    }

    /// Whether the record has everything needed to be drawn
    pub fn is_renderable(&self) -> bool {
        self.camera.is_some() && self.scene_graph.is_some()
    }

    pub(crate) fn apply_bounds(&mut self, bounding_box: BoundingBox) {
        self.bounding_box = bounding_box;
        self.visibility_counter = 0;
    }
}

/// Record shared between the registry, its scope and the render pass
pub type SharedSceneRecord = Rc<RefCell<SceneRecord>>;
