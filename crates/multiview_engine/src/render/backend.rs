//! Backend abstraction
//!
//! The narrow set of renderer capabilities the coordinator relies on. Every
//! scene on a canvas draws through one backend instance.

use bitflags::bitflags;

use super::camera::Camera;
use super::settings::OutputSettings;
use super::RenderResult;
use crate::foundation::collections::TypedHandle;
use crate::foundation::rect::ViewportRect;

bitflags! {
    /// Optional features a backend may provide
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BackendCapabilities: u32 {
        /// Per-draw viewport and scissor rectangles
        const VIEWPORT_SCISSOR = 1 << 0;
        /// Color space, tone mapping, pixel ratio and shadow settings
        const OUTPUT_SETTINGS = 1 << 1;
        /// The backend drives frames from its own animation loop
        const ANIMATION_LOOP = 1 << 2;
        /// Explicit release of backend resources
        const DISPOSE = 1 << 3;
    }
}

/// Description of a scene graph to create
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraphDescriptor {
    /// Background color (RGBA)
    pub background: [f32; 4],
    /// Debug label
    pub label: Option<String>,
}

impl SceneGraphDescriptor {
    /// White background, no label
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    /// Descriptor with the given background
    pub fn with_background(background: [f32; 4]) -> Self {
        Self {
            background,
            label: None,
        }
    }

    /// Attach a debug label
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Default for SceneGraphDescriptor {
    fn default() -> Self {
        Self::with_background(Self::WHITE)
    }
}

/// Handle to a scene graph owned by a backend
pub type SceneGraphHandle = TypedHandle<SceneGraphDescriptor>;

/// Renderer seam used by the coordinator
///
/// Backends that advertise [`BackendCapabilities::VIEWPORT_SCISSOR`] enable
/// their scissor test when [`set_scissor`](RenderBackend::set_scissor) is
/// first called.
pub trait RenderBackend {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Features this backend provides
    fn capabilities(&self) -> BackendCapabilities;

    /// Create a scene graph
    fn create_scene_graph(
        &mut self,
        descriptor: SceneGraphDescriptor,
    ) -> RenderResult<SceneGraphHandle>;

    /// Draw `scene` with `camera`'s view and projection matrices
    fn render(&mut self, scene: SceneGraphHandle, camera: &Camera) -> RenderResult<()>;

    /// Set the viewport rectangle in canvas pixels, origin bottom-left
    fn set_viewport(&mut self, rect: ViewportRect);

    /// Set the scissor rectangle in canvas pixels, origin bottom-left
    fn set_scissor(&mut self, rect: ViewportRect);

    /// Resize the drawing surface
    fn set_size(&mut self, width: f32, height: f32);

    /// Enable or disable color management
    fn set_color_management(&mut self, enabled: bool);

    /// Apply output settings; only called with `OUTPUT_SETTINGS`
    fn apply_output_settings(&mut self, settings: &OutputSettings);

    /// Release backend resources; only called with `DISPOSE`
    fn dispose(&mut self) {}
}
