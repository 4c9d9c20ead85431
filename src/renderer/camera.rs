//! Camera abstraction
//!
//! A camera caches its view and projection matrices. Both the eye and the light
//! are cameras; they share the same near/far planes and aspect policy so the
//! shadow map covers the same frustum shape as the visible image.

use super::transform::{look_at, viewport_projection};
use crate::error::Result;
use glam::{Mat4, Vec3};

/// Viewport information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Get the aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A perspective camera with cached matrices.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    near: f32,
    far: f32,
    viewport: Viewport,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// Create a camera looking from `position` at `target`.
    pub fn new(position: Vec3, target: Vec3, up: Vec3, near: f32, far: f32) -> Result<Self> {
        let viewport = Viewport::new(1, 1);
        Ok(Self {
            position,
            target,
            up,
            near,
            far,
            viewport,
            view: look_at(position, target, up)?,
            projection: viewport_projection(viewport.width, viewport.height, near, far),
        })
    }

    /// Set the viewport and recompute the projection.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.projection = viewport_projection(viewport.width, viewport.height, self.near, self.far);
    }

    /// Move the camera and recompute the view.
    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        self.view = look_at(position, self.target, self.up)?;
        self.position = position;
        Ok(())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::transform::frustum;

    #[test]
    fn test_set_viewport_updates_projection() {
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 4.0), Vec3::ZERO, Vec3::Y, 1.0, 20.0)
            .unwrap();
        camera.set_viewport(Viewport::new(800, 600));
        let expected = frustum(-1.0, 1.0, -0.75, 0.75, 1.0, 20.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_set_position_updates_view() {
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 4.0), Vec3::ZERO, Vec3::Y, 1.0, 20.0)
            .unwrap();
        camera.set_position(Vec3::new(3.0, 6.0, 3.0)).unwrap();
        let eye_in_view = camera.view_matrix().transform_point3(Vec3::new(3.0, 6.0, 3.0));
        assert!(eye_in_view.length() < 1e-4);
    }

    #[test]
    fn test_rejected_position_keeps_previous_view() {
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 4.0), Vec3::ZERO, Vec3::Y, 1.0, 20.0)
            .unwrap();
        let before = camera.view_matrix();
        assert!(camera.set_position(Vec3::ZERO).is_err());
        assert_eq!(camera.view_matrix(), before);
        assert_eq!(camera.position(), Vec3::new(0.0, 5.0, 4.0));
    }
}
