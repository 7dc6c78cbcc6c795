//! Headless backend recording every call
//!
//! Used when no renderer factory is supplied, by the demo and as the test
//! double of the coordinator. The command log is shared, so a caller can keep
//! a [`CommandLog`] after handing the backend to a coordinator.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::foundation::collections::TypedHandleMap;
use crate::foundation::math::Vec3;
use crate::foundation::rect::ViewportRect;
use crate::render::backend::{
    BackendCapabilities, RenderBackend, SceneGraphDescriptor, SceneGraphHandle,
};
use crate::render::camera::Camera;
use crate::render::settings::OutputSettings;
use crate::render::{RenderError, RenderResult};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// A scene graph was created
    CreateSceneGraph {
        /// Handle returned to the caller
        handle: SceneGraphHandle,
        /// Descriptor it was created from
        descriptor: SceneGraphDescriptor,
    },
    /// Viewport set
    SetViewport(ViewportRect),
    /// Scissor set
    SetScissor(ViewportRect),
    /// Scene drawn
    Render {
        /// Scene graph drawn
        scene: SceneGraphHandle,
        /// Camera position at draw time
        camera_position: Vec3,
    },
    /// Surface resized
    SetSize {
        /// New width
        width: f32,
        /// New height
        height: f32,
    },
    /// Color management toggled
    SetColorManagement(bool),
    /// Output settings applied
    ApplyOutputSettings(OutputSettings),
    /// Backend disposed
    Dispose,
}

/// Shared, inspectable list of recorded commands
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<BackendCommand>>>,
}

impl CommandLog {
    fn push(&self, command: BackendCommand) {
        self.commands.borrow_mut().push(command);
    }

    /// Copy of every command recorded so far
    pub fn commands(&self) -> Vec<BackendCommand> {
        self.commands.borrow().clone()
    }

    /// Forget recorded commands
    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    /// Scene graphs drawn, in draw order
    pub fn draws(&self) -> Vec<SceneGraphHandle> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|c| match c {
                BackendCommand::Render { scene, .. } => Some(*scene),
                _ => None,
            })
            .collect()
    }

    /// Viewports set, in order
    pub fn viewports(&self) -> Vec<ViewportRect> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|c| match c {
                BackendCommand::SetViewport(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Number of commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&BackendCommand) -> bool) -> usize {
        self.commands.borrow().iter().filter(|c| predicate(c)).count()
    }
}

/// Backend that records calls instead of drawing
pub struct RecordingBackend {
    capabilities: BackendCapabilities,
    scene_graphs: TypedHandleMap<SceneGraphDescriptor>,
    failing: HashSet<SceneGraphHandle>,
    log: CommandLog,
    disposed: bool,
}

impl RecordingBackend {
    /// Backend with every capability
    pub fn new() -> Self {
        Self::with_capabilities(BackendCapabilities::all())
    }

    /// Backend advertising only `capabilities`
    pub fn with_capabilities(capabilities: BackendCapabilities) -> Self {
        Self {
            capabilities,
            scene_graphs: TypedHandleMap::new(),
            failing: HashSet::new(),
            log: CommandLog::default(),
            disposed: false,
        }
    }

    /// Handle to the command log
    pub fn command_log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Make draws of `scene` fail
    pub fn fail_renders_of(&mut self, scene: SceneGraphHandle) {
        self.failing.insert(scene);
    }

    /// Descriptor of a created scene graph
    pub fn scene_graph(&self, handle: SceneGraphHandle) -> Option<&SceneGraphDescriptor> {
        self.scene_graphs.get(handle)
    }

    /// Whether [`dispose`](RenderBackend::dispose) was called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn create_scene_graph(
        &mut self,
        descriptor: SceneGraphDescriptor,
    ) -> RenderResult<SceneGraphHandle> {
        if self.disposed {
            return Err(RenderError::ResourceCreationFailed(
                "backend already disposed".to_string(),
            ));
        }
        let handle = self.scene_graphs.insert(descriptor.clone());
        self.log.push(BackendCommand::CreateSceneGraph { handle, descriptor });
        Ok(handle)
    }

    fn render(&mut self, scene: SceneGraphHandle, camera: &Camera) -> RenderResult<()> {
        if !self.scene_graphs.contains(scene) {
            return Err(RenderError::RenderingFailed(format!(
                "unknown scene graph {:?}",
                scene.key()
            )));
        }
        if self.failing.contains(&scene) {
            return Err(RenderError::BackendError(format!(
                "draw of {:?} rejected",
                scene.key()
            )));
        }
        self.log.push(BackendCommand::Render {
            scene,
            camera_position: camera.position,
        });
        Ok(())
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.log.push(BackendCommand::SetViewport(rect));
    }

    fn set_scissor(&mut self, rect: ViewportRect) {
        self.log.push(BackendCommand::SetScissor(rect));
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.log.push(BackendCommand::SetSize { width, height });
    }

    fn set_color_management(&mut self, enabled: bool) {
        self.log.push(BackendCommand::SetColorManagement(enabled));
    }

    fn apply_output_settings(&mut self, settings: &OutputSettings) {
        self.log.push(BackendCommand::ApplyOutputSettings(*settings));
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.scene_graphs.clear();
        self.log.push(BackendCommand::Dispose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_survives_boxing() {
        let backend = RecordingBackend::new();
        let log = backend.command_log();
        let mut boxed: Box<dyn RenderBackend> = Box::new(backend);

        boxed.set_size(800.0, 600.0);
        assert_eq!(
            log.commands(),
            vec![BackendCommand::SetSize {
                width: 800.0,
                height: 600.0
            }]
        );
    }

    #[test]
    fn test_render_unknown_scene_fails() {
        let mut backend = RecordingBackend::new();
        let mut other = RecordingBackend::new();
        let foreign = other
            .create_scene_graph(SceneGraphDescriptor::default())
            .unwrap();
        let own = backend
            .create_scene_graph(SceneGraphDescriptor::default())
            .unwrap();
        backend.scene_graphs.remove(own);

        let result = backend.render(foreign, &Camera::default());
        assert!(matches!(result, Err(RenderError::RenderingFailed(_))));
    }

    #[test]
    fn test_injected_failure() {
        let mut backend = RecordingBackend::new();
        let scene = backend
            .create_scene_graph(SceneGraphDescriptor::default())
            .unwrap();
        backend.fail_renders_of(scene);

        assert!(backend.render(scene, &Camera::default()).is_err());
        assert!(backend.command_log().draws().is_empty());
    }

    #[test]
    fn test_dispose_releases_scene_graphs() {
        let mut backend = RecordingBackend::new();
        let scene = backend
            .create_scene_graph(SceneGraphDescriptor::default().labeled("a"))
            .unwrap();
        assert_eq!(backend.scene_graph(scene).unwrap().label.as_deref(), Some("a"));

        backend.dispose();
        assert!(backend.is_disposed());
        assert!(backend.scene_graph(scene).is_none());
        assert!(backend
            .create_scene_graph(SceneGraphDescriptor::default())
            .is_err());
    }
}
