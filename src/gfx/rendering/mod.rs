// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Turns a scene graph into a retained display list and replays it on the GPU.

pub mod display_list;
pub mod gpu_model;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use display_list::{DisplayList, DrawItem, FaceBatch, FaceKind, Topology};
pub use pipeline_manager::{PipelineConfig, PipelineKey, PipelineManager};
pub use render_engine::RenderEngine;
