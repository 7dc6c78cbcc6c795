//! # Cameras
//!
//! Perspective camera used to draw a scene, and the canvas-wide default camera
//! every new scene starts with.
//!
//! ## Design Principles
//! - **Backend-agnostic**: the camera only carries parameters and matrices
//! - **Shared**: scenes hold the camera through [`SharedCamera`], so one
//!   camera may be used by several scenes

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ContextError, ContextKey, ContextTree, ScopeId};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::foundation::rect::CanvasSize;

/// Field of view of the default camera, in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 75.0;

/// Near plane of the default camera
pub const DEFAULT_NEAR: f32 = 0.1;

/// Far plane of the default camera
pub const DEFAULT_FAR: f32 = 1000.0;

/// 3D perspective camera
///
/// # Coordinate System
/// Right-handed, Y-up view space. Projection matrices use the OpenGL clip
/// space convention; backends convert as they need.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use multiview_engine::foundation::math::Vec3;
    /// use multiview_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(0.0, 2.0, 5.0), 75.0, 16.0 / 9.0, 0.1, 100.0);
    /// assert_eq!(camera.target, Vec3::zeros());
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Default camera of a canvas
    ///
    /// 75° field of view, positioned at (10, 10, 10) looking at the origin,
    /// aspect ratio taken from the canvas.
    pub fn default_for(canvas: CanvasSize) -> Self {
        Self::perspective(
            Vec3::new(10.0, 10.0, 10.0),
            DEFAULT_FOV_DEGREES,
            canvas.aspect_ratio(),
            DEFAULT_NEAR,
            DEFAULT_FAR,
        )
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update the aspect ratio after a viewport change
    ///
    /// Changes below 0.01 are applied without logging to keep resize storms
    /// quiet.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// World-to-camera transformation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::default_for(CanvasSize::new(1.0, 1.0))
    }
}

/// Camera shared between scenes and the code that moves it
pub type SharedCamera = Rc<RefCell<Camera>>;

/// Key of the default camera context
pub const CAMERA_KEY: ContextKey<RefCell<Camera>> =
    ContextKey::new("multiview-camera", "use_camera", "<Canvas>");

/// Provide the default camera for `canvas` in `scope`
pub fn create_camera_context(
    tree: &mut ContextTree,
    scope: ScopeId,
    canvas: CanvasSize,
) -> Result<SharedCamera, ContextError> {
    let camera = Rc::new(RefCell::new(Camera::default_for(canvas)));
    tree.provide(scope, &CAMERA_KEY, Rc::clone(&camera))?;
    Ok(camera)
}

/// Nearest default camera above `scope`
pub fn use_camera(tree: &ContextTree, scope: ScopeId) -> Result<SharedCamera, ContextError> {
    tree.require(scope, &CAMERA_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_camera_parameters() {
        let camera = Camera::default_for(CanvasSize::new(800.0, 400.0));
        assert_relative_eq!(camera.fov, utils::deg_to_rad(75.0));
        assert_relative_eq!(camera.aspect, 2.0);
        assert_relative_eq!(camera.near, 0.1);
        assert_relative_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(camera.target, Vec3::zeros());
    }

    #[test]
    fn test_view_matrix_moves_position_to_origin() {
        let camera = Camera::default_for(CanvasSize::new(1.0, 1.0));
        let eye = camera.view_matrix() * camera.position.push(1.0);
        assert_relative_eq!(eye.xyz().norm(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_target_lies_on_negative_z() {
        let camera = Camera::default_for(CanvasSize::new(1.0, 1.0));
        let target = camera.view_matrix() * camera.target.push(1.0);
        assert_relative_eq!(target.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(target.y, 0.0, epsilon = 1e-4);
        assert!(target.z < 0.0);
    }

    #[test]
    fn test_camera_context_is_shared() {
        let mut tree = ContextTree::new();
        let root = tree.root();
        let child = tree.create_scope(root).unwrap();
        let camera = create_camera_context(&mut tree, root, CanvasSize::new(2.0, 1.0)).unwrap();

        let found = use_camera(&tree, child).unwrap();
        found.borrow_mut().set_position(Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 5.0));
    }
}
