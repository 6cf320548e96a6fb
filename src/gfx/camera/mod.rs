pub mod trackball;
pub mod view_state;

// Re-export main types
pub use trackball::{trackball_rotation, TRACKBALL_RADIUS};
pub use view_state::{ViewState, OPENGL_TO_WGPU_MATRIX};
