//! Multi-viewport render pass
//!
//! Draws every visible scene of a canvas into its own rectangle, in the order
//! the scenes were registered. Later scenes paint over earlier ones where
//! their rectangles overlap.

use super::backend::{BackendCapabilities, RenderBackend};
use super::viewport::{classify, Visibility};
use crate::foundation::rect::CanvasSize;
use crate::scene::SharedSceneRecord;

/// What one pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPassSummary {
    /// Scenes drawn
    pub drawn: usize,
    /// Scenes entirely off the canvas
    pub culled: usize,
    /// Scenes without a camera or a scene graph
    pub skipped: usize,
    /// Draws the backend rejected
    pub failed: usize,
}

/// Draw `scenes` through `backend`
///
/// `scenes` is a snapshot: records are not borrowed while the backend draws,
/// so a draw may destroy or add scenes without disturbing the pass. Backend
/// errors are logged and the pass continues with the next scene.
pub fn render_scenes(
    scenes: &[SharedSceneRecord],
    backend: &mut dyn RenderBackend,
    canvas: CanvasSize,
) -> RenderPassSummary {
    let use_scissor = backend
        .capabilities()
        .contains(BackendCapabilities::VIEWPORT_SCISSOR);
    let mut summary = RenderPassSummary::default();

    for shared in scenes {
        let (id, visibility, scene_graph, camera) = {
            let record = shared.borrow();
            (
                record.id().clone(),
                classify(&record, canvas),
                record.scene_graph(),
                record.camera().cloned(),
            )
        };

        let rect = match visibility {
            Visibility::Visible(rect) => rect,
            Visibility::OutOfBounds => {
                log::trace!("Scene {id} culled");
                summary.culled += 1;
                continue;
            }
            Visibility::NotRenderable => {
                log::trace!("Scene {id} has no camera or scene graph");
                summary.skipped += 1;
                continue;
            }
        };
        let (Some(scene_graph), Some(camera)) = (scene_graph, camera) else {
            summary.skipped += 1;
            continue;
        };

        if use_scissor {
            backend.set_viewport(rect);
            backend.set_scissor(rect);
        }

        let result = backend.render(scene_graph, &camera.borrow());
        match result {
            Ok(()) => summary.drawn += 1,
            Err(err) => {
                log::error!("Failed to render scene {id}: {err}");
                summary.failed += 1;
            }
        }
    }

    summary
}
