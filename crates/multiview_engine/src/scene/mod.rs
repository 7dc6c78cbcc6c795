//! Scenes
//!
//! A scene is a scene graph drawn through a camera into the rectangle of a
//! layout element. Every scene of a canvas lives in the canvas' registry.

pub mod context;
pub mod record;
pub mod registry;

pub use context::{create_scene_context, use_scene, SCENE_ID_ATTRIBUTE, SCENE_KEY};
pub use record::{SceneId, SceneRecord, SharedSceneRecord};
pub use registry::{
    create_scenes_context, use_scenes, RegistryError, SceneRegistry, SharedRegistry, SCENES_KEY,
};
