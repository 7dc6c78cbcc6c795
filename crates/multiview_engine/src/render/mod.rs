//! Rendering
//!
//! The renderer coordinator and everything it draws through: the backend
//! seam, output settings, cameras and the viewport mapping of scenes.

pub mod backend;
pub mod backends;
pub mod camera;
pub mod coordinator;
pub mod disposal;
pub mod mask;
pub mod pass;
pub mod settings;
pub mod viewport;

use thiserror::Error;

pub use backend::{BackendCapabilities, RenderBackend, SceneGraphDescriptor, SceneGraphHandle};
pub use backends::{BackendCommand, CommandLog, RecordingBackend};
pub use camera::{create_camera_context, use_camera, Camera, SharedCamera, CAMERA_KEY};
pub use coordinator::{
    create_renderer_context, use_renderer, FrameMode, RendererCoordinator, RendererFactory,
    RendererOptions, SharedRenderer, RENDERER_KEY,
};
pub use disposal::{create_disposal_context, use_disposal, DisposalQueue, DISPOSAL_KEY};
pub use mask::{use_mask, StencilFunc, StencilMask, StencilOp, DEFAULT_MASK_ID};
pub use pass::{render_scenes, RenderPassSummary};
pub use settings::{
    ColorSpace, OutputSettings, RendererSettings, ShadowMapType, ShadowsConfig, ToneMapping,
};
pub use viewport::{classify, compute_viewport, is_out_of_bounds, Visibility};

/// High-level rendering error types
///
/// Backend-specific failures are reported through these variants so the
/// coordinator can log them without knowing the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    ///
    /// Logged by the render pass, which then continues with the next scene.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
