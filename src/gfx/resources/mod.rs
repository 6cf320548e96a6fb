// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles the depth buffer and the uniform bind groups used for rendering.

pub mod frame_bindings;
pub mod surface_bindings;
pub mod texture_resource;

// Re-export main types
pub use frame_bindings::{FrameBindings, FrameUniform, LightRig};
pub use surface_bindings::{SurfaceBindings, SurfaceLayout, SurfaceUniform};
pub use texture_resource::TextureResource;
