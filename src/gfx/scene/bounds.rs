//! Model-space bounding box of a scene and the display fit derived from it

use cgmath::{Matrix4, Vector3};

use super::scene::{transform_position, NodeVisit, Scene, SceneVisitor};

/// Axis-aligned bounding box
///
/// [`Aabb::empty`] starts inverted (min > max) so that folding the first point
/// makes it a valid, zero-sized box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// True once at least one point has been included
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn include(&mut self, p: [f32; 3]) {
        self.min.x = self.min.x.min(p[0]);
        self.min.y = self.min.y.min(p[1]);
        self.min.z = self.min.z.min(p[2]);

        self.max.x = self.max.x.max(p[0]);
        self.max.y = self.max.y.max(p[1]);
        self.max.z = self.max.z.max(p[2]);
    }

    pub fn contains(&self, p: [f32; 3]) -> bool {
        (self.min.x..=self.max.x).contains(&p[0])
            && (self.min.y..=self.max.y).contains(&p[1])
            && (self.min.z..=self.max.z).contains(&p[2])
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) / 2.0
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest side length
    pub fn max_extent(&self) -> f32 {
        let e = self.extent();
        e.x.max(e.y).max(e.z)
    }
}

struct BoundsVisitor {
    bounds: Aabb,
}

impl SceneVisitor for BoundsVisitor {
    fn enter_node(&mut self, scene: &Scene, visit: &NodeVisit<'_>) {
        for mesh in visit.node.meshes.iter().filter_map(|&i| scene.mesh(i)) {
            for &p in &mesh.positions {
                self.bounds.include(transform_position(&visit.world, p));
            }
        }
    }
}

/// Bounds of every vertex reachable from the root, in model space.
///
/// A scene without vertices yields [`Aabb::empty`].
pub fn scene_bounds(scene: &Scene) -> Aabb {
    let mut visitor = BoundsVisitor {
        bounds: Aabb::empty(),
    };
    scene.walk(&mut visitor);
    visitor.bounds
}

/// Uniform scale and re-centering that fit a model into the view volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFit {
    pub center: Vector3<f32>,
    pub scale: f32,
}

impl DisplayFit {
    /// Scales the largest side of `bounds` to `display_extent`.
    ///
    /// Returns `None` for an empty box. A box with no extent (a single point)
    /// gets a scale of 1.
    pub fn from_bounds(bounds: &Aabb, display_extent: f32) -> Option<Self> {
        if !bounds.is_valid() {
            return None;
        }
        let max_extent = bounds.max_extent();
        let scale = if max_extent > 0.0 {
            display_extent / max_extent
        } else {
            1.0
        };
        Some(Self {
            center: bounds.center(),
            scale,
        })
    }

    /// `S(scale) · T(-center)`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_scale(self.scale) * Matrix4::from_translation(-self.center)
    }
}
