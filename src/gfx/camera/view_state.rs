use cgmath::*;

use super::trackball::{identity, trackball_rotation};
use crate::gfx::scene::DisplayFit;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Interaction state of the canvas: trackball orientation, mouse tracking and zoom.
///
/// Only mouse events and resizes mutate it; loading a model leaves it untouched.
#[derive(Debug, Clone, Copy)]
pub struct ViewState {
    pub orientation: Quaternion<f32>,
    /// Last mouse position in window pixels
    pub last_mouse: Vector2<f32>,
    /// Vertical field of view
    pub zoom: Deg<f32>,
    pub viewport: (u32, u32),
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Deg(45.0))
    }
}

impl ViewState {
    pub fn new(zoom: Deg<f32>) -> Self {
        Self {
            orientation: identity(),
            last_mouse: Vector2::zero(),
            zoom,
            viewport: (1, 1),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Width over height, 1.0 while either dimension is zero
    pub fn aspect(&self) -> f32 {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    /// Window pixels to [-1, 1] with y pointing up
    pub fn normalize(&self, position: Vector2<f32>) -> Vector2<f32> {
        let w = self.viewport.0.max(1) as f32;
        let h = self.viewport.1.max(1) as f32;
        Vector2::new((2.0 * position.x - w) / w, (h - 2.0 * position.y) / h)
    }

    /// Handles a mouse-move event.
    ///
    /// While dragging, the drag from the last position to `(x, y)` is turned into
    /// an incremental rotation applied on top of the current orientation. The last
    /// position is updated either way. Returns true when the orientation changed.
    pub fn mouse_move(&mut self, x: f32, y: f32, dragging: bool) -> bool {
        let current = Vector2::new(x, y);
        let mut rotated = false;

        if dragging && current != self.last_mouse {
            let spin = trackball_rotation(self.normalize(self.last_mouse), self.normalize(current));
            self.orientation = (spin * self.orientation).normalize();
            rotated = true;
        }

        self.last_mouse = current;
        rotated
    }

    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Matrix4::from(self.orientation)
    }

    /// `T(0, 0, -distance) · R · S(scale) · T(-center)`
    pub fn view_matrix(&self, camera_distance: f32, fit: &DisplayFit) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(0.0, 0.0, -camera_distance))
            * self.rotation_matrix()
            * fit.model_matrix()
    }

    pub fn projection_matrix(&self, znear: f32, zfar: f32) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.zoom, self.aspect(), znear, zfar)
    }
}
