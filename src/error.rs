//! Error types for model import and viewer operations

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning a model file into a [`Scene`](crate::gfx::scene::Scene)
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported model format: {0:?}")]
    UnsupportedFormat(String),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("STL error: {message}")]
    Stl { message: String },

    #[error("Model contains no vertices")]
    EmptyScene,
}

impl ImportError {
    pub(crate) fn stl(message: impl Into<String>) -> Self {
        ImportError::Stl {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the viewer to its host
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to open {}: {source}", path.display())]
    ImportFailed {
        path: PathBuf,
        #[source]
        source: ImportError,
    },

    #[error("Window error: {0}")]
    Window(String),

    #[error("GPU error: {0}")]
    Gpu(String),
}
