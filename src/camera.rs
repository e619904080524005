//! Perspective camera on the +Z axis looking at the origin.

use crate::input::Viewport;
use glam::{Mat4, Vec2, Vec3};

/// Fixed camera for backdrop scenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Distance from the origin along +Z.
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(distance: f32, fov_degrees: f32) -> Self {
        Self {
            distance,
            fov_degrees,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn with_far(mut self, far: f32) -> Self {
        self.far = far;
        self
    }

    /// Adopt the aspect ratio of `viewport`. Empty viewports are ignored.
    pub fn fit(&mut self, viewport: Viewport) {
        if !viewport.is_empty() {
            self.aspect = viewport.aspect();
        }
    }

    /// Camera's world position.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Width and height of the visible rectangle on the z = 0 plane.
    pub fn visible_extent(&self) -> Vec2 {
        let height = 2.0 * (self.fov_degrees.to_radians() * 0.5).tan() * self.distance;
        Vec2::new(height * self.aspect, height)
    }
}
