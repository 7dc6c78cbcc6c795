//! # Multiview Engine
//!
//! Renders several independent 3D scenes on one canvas. Every scene is bound
//! to a rectangle of the page layout; each frame, the scenes that are on
//! screen are drawn into their own viewport of the shared renderer and the
//! others are skipped.
//!
//! ## Features
//!
//! - **One surface, many scenes**: a single backend shared by every scene
//! - **Layout tracking**: one resize observer keeps every scene's bounds
//!   current
//! - **Culling**: scenes scrolled off the canvas cost nothing
//! - **On-demand rendering**: frames are drawn only when something changed
//!
//! ## Quick Start
//!
//! ```rust
//! use multiview_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let observer = QueuedResizeObserver::new();
//!     let mut canvas = MultiViewCanvas::mount(
//!         CanvasOptions::new(CanvasSize::new(800.0, 600.0)),
//!         observer.clone(),
//!     )?;
//!
//!     let container = LayoutElement::new(BoundingBox::from_origin_size(0.0, 0.0, 400.0, 300.0));
//!     canvas.add_scene(&container)?;
//!
//!     while canvas.needs_frame() {
//!         canvas.frame(0.0);
//!     }
//!     canvas.unmount();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod canvas;
pub mod config;
pub mod context;
pub mod foundation;
pub mod platform;
pub mod render;
pub mod scene;
pub mod scheduler;

mod error;

pub use error::{EngineError, EngineResult};

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        canvas::{CanvasOptions, CanvasState, MultiViewCanvas},
        config::{Config, MultiViewConfig},
        context::{ContextTree, ScopeId},
        foundation::{
            math::Vec3,
            rect::{BoundingBox, CanvasSize, ViewportRect},
        },
        platform::{LayoutElement, QueuedResizeObserver, ResizeObserver},
        render::{
            BackendCapabilities, Camera, FrameMode, RecordingBackend, RenderBackend,
            RendererCoordinator, RendererOptions, RendererSettings, ShadowMapType, ToneMapping,
        },
        scene::{SceneId, SceneRecord, SceneRegistry},
        scheduler::{FrameScheduler, RenderMode, Stage, TaskOptions},
        EngineError,
    };
}
