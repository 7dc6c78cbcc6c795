//! Screen-space rectangle types
//!
//! All values are canvas-local pixels. Layout rectangles ([`BoundingBox`]) use a
//! top-left origin; renderer rectangles ([`ViewportRect`]) use a bottom-left
//! origin.

use serde::{Deserialize, Serialize};

/// Layout rectangle of an element, relative to the canvas' top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Distance from the canvas top edge to the rectangle's top edge
    pub top: f32,
    /// Distance from the canvas left edge to the rectangle's right edge
    pub right: f32,
    /// Distance from the canvas top edge to the rectangle's bottom edge
    pub bottom: f32,
    /// Distance from the canvas left edge to the rectangle's left edge
    pub left: f32,
    /// Rectangle width
    pub width: f32,
    /// Rectangle height
    pub height: f32,
}

impl BoundingBox {
    /// Create a bounding box from its top-left corner and size
    pub fn from_origin_size(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            right: left + width,
            bottom: top + height,
            left,
            width,
            height,
        }
    }

    /// Create a bounding box from its four edges
    pub fn from_edges(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Move the rectangle by the given offset, keeping its size
    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::from_origin_size(self.left + dx, self.top + dy, self.width, self.height)
    }
}

/// Size of the shared drawing surface in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Canvas width
    pub width: f32,
    /// Canvas height
    pub height: f32,
}

impl CanvasSize {
    /// Create a new canvas size
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, 1.0 for a degenerate canvas
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Renderer viewport/scissor rectangle (bottom-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportRect {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl ViewportRect {
    /// Create a new viewport rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_origin_size_derives_edges() {
        let bbox = BoundingBox::from_origin_size(10.0, 50.0, 100.0, 80.0);
        assert_eq!(bbox.right, 110.0);
        assert_eq!(bbox.bottom, 130.0);
        assert_eq!(bbox, BoundingBox::from_edges(50.0, 110.0, 130.0, 10.0));
    }

    #[test]
    fn test_translated_keeps_size() {
        let bbox = BoundingBox::from_origin_size(0.0, 0.0, 40.0, 30.0).translated(5.0, -10.0);
        assert_eq!(bbox.left, 5.0);
        assert_eq!(bbox.top, -10.0);
        assert_eq!(bbox.bottom, 20.0);
        assert_eq!(bbox.width, 40.0);
    }

    #[test]
    fn test_aspect_ratio_handles_zero_height() {
        assert_eq!(CanvasSize::new(800.0, 400.0).aspect_ratio(), 2.0);
        assert_eq!(CanvasSize::new(800.0, 0.0).aspect_ratio(), 1.0);
    }
}
