// src/lib.rs
//! Model View
//!
//! A minimal 3D model viewer built on wgpu and winit. A model file is imported
//! into a scene graph, fitted into a fixed view volume and drawn with two
//! directional lights while the mouse rotates it through a virtual trackball.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod import;
pub mod viewer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::{ReloadPolicy, ViewerConfig};
pub use error::{ImportError, ViewerError};
pub use import::{FileImporter, Importer};
pub use viewer::{FrameData, LoadSummary, LoadedModel, ModelViewer};
