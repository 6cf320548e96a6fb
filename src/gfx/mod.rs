// src/gfx/mod.rs
//! Graphics: scene data, camera interaction, GPU resources and rendering

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;
