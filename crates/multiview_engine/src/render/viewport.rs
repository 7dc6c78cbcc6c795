//! Viewport culling and mapping
//!
//! Scenes are laid out in top-left-origin canvas pixels while the renderer's
//! viewport and scissor use a bottom-left origin.

use crate::foundation::rect::{BoundingBox, CanvasSize, ViewportRect};
use crate::scene::SceneRecord;

/// Whether `bbox` lies entirely outside the canvas
///
/// Boxes touching a canvas edge are in bounds.
pub fn is_out_of_bounds(bbox: &BoundingBox, canvas: CanvasSize) -> bool {
    bbox.bottom < 0.0 || bbox.top > canvas.height || bbox.right < 0.0 || bbox.left > canvas.width
}

/// Map a layout rectangle to a renderer viewport
///
/// The rectangle is not clamped to the canvas.
pub fn compute_viewport(bbox: &BoundingBox, canvas: CanvasSize) -> ViewportRect {
    ViewportRect::new(bbox.left, canvas.height - bbox.bottom, bbox.width, bbox.height)
}

/// Outcome of testing one scene against the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    /// Draw into the given rectangle
    Visible(ViewportRect),
    /// Entirely off the canvas
    OutOfBounds,
    /// Missing a camera or a scene graph
    NotRenderable,
}

/// Classify a record for the current frame
pub fn classify(record: &SceneRecord, canvas: CanvasSize) -> Visibility {
    if !record.is_renderable() {
        return Visibility::NotRenderable;
    }

    let bbox = record.bounding_box();
    if is_out_of_bounds(&bbox, canvas) {
        Visibility::OutOfBounds
    } else {
        Visibility::Visible(compute_viewport(&bbox, canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CANVAS: CanvasSize = CanvasSize::new(800.0, 600.0);

    #[test]
    fn test_box_inside_canvas() {
        let bbox = BoundingBox::from_edges(0.0, 100.0, 100.0, 0.0);
        assert!(!is_out_of_bounds(&bbox, CANVAS));
    }

    #[test]
    fn test_box_below_canvas() {
        let bbox = BoundingBox::from_edges(700.0, 100.0, 900.0, 0.0);
        assert!(is_out_of_bounds(&bbox, CANVAS));
    }

    #[test]
    fn test_partially_visible_box() {
        let bbox = BoundingBox::from_edges(-50.0, 100.0, 50.0, 0.0);
        assert!(!is_out_of_bounds(&bbox, CANVAS));
    }

    #[test]
    fn test_edge_touching_boxes_are_in_bounds() {
        let above = BoundingBox::from_edges(-100.0, 100.0, 0.0, 0.0);
        let below = BoundingBox::from_edges(600.0, 100.0, 700.0, 0.0);
        let left = BoundingBox::from_edges(0.0, 0.0, 100.0, -100.0);
        let right = BoundingBox::from_edges(0.0, 900.0, 100.0, 800.0);
        for bbox in [above, below, left, right] {
            assert!(!is_out_of_bounds(&bbox, CANVAS), "{bbox:?}");
        }
    }

    #[test]
    fn test_outside_on_each_side() {
        let above = BoundingBox::from_edges(-200.0, 100.0, -1.0, 0.0);
        let left = BoundingBox::from_edges(0.0, -1.0, 100.0, -100.0);
        let right = BoundingBox::from_edges(0.0, 900.0, 100.0, 801.0);
        for bbox in [above, left, right] {
            assert!(is_out_of_bounds(&bbox, CANVAS), "{bbox:?}");
        }
    }

    #[test]
    fn test_viewport_flips_y_axis() {
        let bbox = BoundingBox::from_edges(50.0, 110.0, 150.0, 10.0);
        assert_eq!(
            compute_viewport(&bbox, CANVAS),
            ViewportRect::new(10.0, 450.0, 100.0, 100.0)
        );
    }

    #[test]
    fn test_viewport_is_not_clamped() {
        let bbox = BoundingBox::from_edges(-50.0, 100.0, 50.0, -20.0);
        assert_eq!(
            compute_viewport(&bbox, CANVAS),
            ViewportRect::new(-20.0, 550.0, 120.0, 100.0)
        );
    }

    proptest! {
        #[test]
        fn prop_boxes_overlapping_canvas_are_in_bounds(
            left in -500.0f32..800.0,
            top in -500.0f32..600.0,
            width in 0.0f32..500.0,
            height in 0.0f32..500.0,
        ) {
            let bbox = BoundingBox::from_origin_size(left, top, width, height);
            let overlaps = bbox.right >= 0.0 && bbox.bottom >= 0.0;
            prop_assert_eq!(is_out_of_bounds(&bbox, CANVAS), !overlaps);
        }

        #[test]
        fn prop_viewport_preserves_size_and_left(
            left in -1000.0f32..1000.0,
            top in -1000.0f32..1000.0,
            width in 0.0f32..1000.0,
            height in 0.0f32..1000.0,
        ) {
            let bbox = BoundingBox::from_origin_size(left, top, width, height);
            let rect = compute_viewport(&bbox, CANVAS);
            prop_assert_eq!(rect.x, bbox.left);
            prop_assert_eq!(rect.width, bbox.width);
            prop_assert_eq!(rect.height, bbox.height);
            prop_assert_eq!(rect.y, CANVAS.height - bbox.bottom);
        }

        #[test]
        fn prop_translating_far_away_culls(
            left in 0.0f32..800.0,
            top in 0.0f32..600.0,
            size in 1.0f32..200.0,
        ) {
            let bbox = BoundingBox::from_origin_size(left, top, size, size);
            prop_assert!(!is_out_of_bounds(&bbox, CANVAS));
            prop_assert!(is_out_of_bounds(&bbox.translated(0.0, 1000.0), CANVAS));
            prop_assert!(is_out_of_bounds(&bbox.translated(0.0, -1000.0), CANVAS));
        }
    }
}
