//! # Scene Module
//!
//! In-memory representation of an imported model and the tree walks over it.
//!
//! ## Key Components
//!
//! - [`Scene`] - Node arena plus the meshes and materials nodes refer to
//! - [`Material`] - Sparse material properties, resolved to a [`SurfaceState`]
//! - [`Aabb`] / [`DisplayFit`] - Model bounds and the scale/centering derived from them
//! - [`Vertex3D`] - GPU vertex layout used by the display list
//!
//! ## Usage
//!
//! ```no_run
//! use modelview::gfx::scene::{scene_bounds, DisplayFit, Scene};
//!
//! let scene = Scene::new();
//! let bounds = scene_bounds(&scene);
//! // An empty scene has no valid fit
//! assert!(DisplayFit::from_bounds(&bounds, 10.0).is_none());
//! ```

pub mod bounds;
pub mod material;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use bounds::{scene_bounds, Aabb, DisplayFit};
pub use material::{FillMode, Material, MaterialKey, MaterialValue, SurfaceState};
pub use scene::{Face, Mesh, Node, NodeId, NodeVisit, Scene, SceneVisitor};
pub use vertex::Vertex3D;
