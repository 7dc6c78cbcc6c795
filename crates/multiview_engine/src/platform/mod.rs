//! Platform-facing abstractions
//!
//! The layout elements scenes are bound to, and the resize observation that
//! reports their rectangles.

pub mod layout;
pub mod resize;

pub use layout::{ElementId, LayoutElement};
pub use resize::{QueuedResizeObserver, ResizeEntry, ResizeObserver};
