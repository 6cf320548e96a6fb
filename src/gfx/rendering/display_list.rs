//! Retained draw geometry built from a scene graph
//!
//! The scene is immutable after load, so walking it once and recording the
//! result is equivalent to walking it every frame. A [`DisplayList`] holds, for
//! every mesh reachable from the root, world-space vertices plus index batches
//! grouped by face size. It is rebuilt as a whole whenever a model is loaded and
//! never patched in place.

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};

use crate::gfx::scene::{
    scene::transform_position, FillMode, Mesh, NodeId, NodeVisit, Scene, SceneVisitor,
    SurfaceState, Vertex3D,
};

/// Face grouping by number of indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaceKind {
    Points,
    Lines,
    Triangles,
    Polygons,
}

impl FaceKind {
    pub const ALL: [FaceKind; 4] = [
        FaceKind::Points,
        FaceKind::Lines,
        FaceKind::Triangles,
        FaceKind::Polygons,
    ];

    /// `None` for faces without indices
    pub fn from_index_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(FaceKind::Points),
            2 => Some(FaceKind::Lines),
            3 => Some(FaceKind::Triangles),
            _ => Some(FaceKind::Polygons),
        }
    }
}

/// Primitive topology a batch is submitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    PointList,
    LineList,
    TriangleList,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::PointList => wgpu::PrimitiveTopology::PointList,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        }
    }

    fn for_face(kind: FaceKind, fill_mode: FillMode) -> Self {
        match (kind, fill_mode) {
            (FaceKind::Points, _) => Topology::PointList,
            (FaceKind::Lines, _) => Topology::LineList,
            (_, FillMode::Wireframe) => Topology::LineList,
            (_, FillMode::Fill) => Topology::TriangleList,
        }
    }
}

/// Indices of all faces of one kind within a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBatch {
    pub kind: FaceKind,
    pub topology: Topology,
    pub indices: Vec<u32>,
    pub face_count: usize,
}

impl FaceBatch {
    fn new(kind: FaceKind, fill_mode: FillMode) -> Self {
        Self {
            kind,
            topology: Topology::for_face(kind, fill_mode),
            indices: Vec::new(),
            face_count: 0,
        }
    }

    fn push_face(&mut self, face: &[u32]) {
        match self.topology {
            Topology::PointList | Topology::LineList if self.kind <= FaceKind::Lines => {
                self.indices.extend_from_slice(face);
            }
            Topology::LineList => {
                // polygon outline
                for (k, &index) in face.iter().enumerate() {
                    self.indices.push(index);
                    self.indices.push(face[(k + 1) % face.len()]);
                }
            }
            Topology::TriangleList => {
                // triangle fan around the first vertex
                for k in 1..face.len() - 1 {
                    self.indices.extend_from_slice(&[face[0], face[k], face[k + 1]]);
                }
            }
            Topology::PointList => self.indices.extend_from_slice(face),
        }
        self.face_count += 1;
    }
}

/// Everything needed to draw one mesh instance
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh_index: usize,
    pub surface: SurfaceState,
    /// Lighting is only applied to meshes carrying normals
    pub lit: bool,
    pub vertices: Vec<Vertex3D>,
    /// Non-empty batches, ordered points, lines, triangles, polygons
    pub batches: Vec<FaceBatch>,
}

/// Retained geometry for a whole scene
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub items: Vec<DrawItem>,
    /// Faces dropped because they referenced missing vertices
    pub skipped_faces: usize,
}

impl DisplayList {
    pub fn build(scene: &Scene) -> Self {
        let mut builder = DisplayListBuilder::default();
        scene.walk(&mut builder);

        if builder.list.skipped_faces > 0 {
            log::warn!(
                "Skipped {} face(s) with out-of-range vertex indices",
                builder.list.skipped_faces
            );
        }
        log::debug!(
            "Display list built: {} item(s), {} batch(es), {} vertices",
            builder.list.items.len(),
            builder.list.batch_count(),
            builder.list.vertex_count()
        );
        builder.list
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn batch_count(&self) -> usize {
        self.items.iter().map(|item| item.batches.len()).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.items.iter().map(|item| item.vertices.len()).sum()
    }

    /// Faces that made it into a batch, counted once per drawing node
    pub fn face_count(&self) -> usize {
        self.items
            .iter()
            .flat_map(|item| item.batches.iter())
            .map(|batch| batch.face_count)
            .sum()
    }

    pub fn index_count(&self) -> usize {
        self.items
            .iter()
            .flat_map(|item| item.batches.iter())
            .map(|batch| batch.indices.len())
            .sum()
    }
}

#[derive(Default)]
struct DisplayListBuilder {
    list: DisplayList,
}

impl SceneVisitor for DisplayListBuilder {
    fn enter_node(&mut self, scene: &Scene, visit: &NodeVisit<'_>) {
        for &mesh_index in &visit.node.meshes {
            let Some(mesh) = scene.mesh(mesh_index) else {
                log::warn!("Node {} references missing mesh {}", visit.id, mesh_index);
                continue;
            };

            let surface = scene
                .material(mesh.material_index)
                .map(|m| m.surface_state())
                .unwrap_or_default();

            let (batches, skipped) = group_faces(mesh, surface.fill_mode);
            self.list.skipped_faces += skipped;

            self.list.items.push(DrawItem {
                node: visit.id,
                mesh_index,
                surface,
                lit: mesh.has_normals(),
                vertices: world_vertices(mesh, &visit.world, &surface),
                batches,
            });
        }
    }
}

/// Assembles color, then normal, then position for every vertex of `mesh`
fn world_vertices(mesh: &Mesh, world: &Matrix4<f32>, surface: &SurfaceState) -> Vec<Vertex3D> {
    let normal_matrix = normal_matrix(world);

    (0..mesh.positions.len())
        .map(|i| {
            let color = mesh
                .colors
                .as_ref()
                .and_then(|colors| colors.get(i))
                .copied()
                .unwrap_or(surface.diffuse);

            let normal: [f32; 3] = mesh
                .normals
                .as_ref()
                .and_then(|normals| normals.get(i))
                .map(|n| {
                    let n = normal_matrix * Vector3::new(n[0], n[1], n[2]);
                    if n.magnitude2() > 0.0 {
                        n.normalize().into()
                    } else {
                        [0.0; 3]
                    }
                })
                .unwrap_or([0.0; 3]);

            Vertex3D {
                position: transform_position(world, mesh.positions[i]),
                normal,
                color,
            }
        })
        .collect()
}

/// Inverse transpose of the upper 3x3, so normals stay perpendicular under
/// non-uniform scale
fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

fn group_faces(mesh: &Mesh, fill_mode: FillMode) -> (Vec<FaceBatch>, usize) {
    let vertex_count = mesh.positions.len();
    let mut groups: Vec<FaceBatch> = FaceKind::ALL
        .iter()
        .map(|&kind| FaceBatch::new(kind, fill_mode))
        .collect();
    let mut skipped = 0;

    for face in &mesh.faces {
        let Some(kind) = FaceKind::from_index_count(face.len()) else {
            continue;
        };
        if face.indices.iter().any(|&i| i as usize >= vertex_count) {
            skipped += 1;
            continue;
        }
        groups[kind as usize].push_face(&face.indices);
    }

    groups.retain(|batch| batch.face_count > 0);
    (groups, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{Face, Material, MaterialKey, MaterialValue, Node};

    fn quad_positions() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
    }

    fn single_mesh_scene(mesh: Mesh) -> Scene {
        let mut scene = Scene::new();
        let index = scene.add_mesh(mesh);
        let root = scene.root();
        scene.attach_mesh(root, index);
        scene
    }

    #[test]
    fn test_faces_grouped_by_vertex_count() {
        let mesh = Mesh::new(
            "mixed",
            quad_positions(),
            vec![
                Face::new(vec![0]),
                Face::new(vec![0, 1]),
                Face::new(vec![0, 1, 2]),
                Face::new(vec![0, 1, 2, 3]),
                Face::new(vec![2]),
                Face::new(Vec::new()),
            ],
        );
        let list = DisplayList::build(&single_mesh_scene(mesh));

        assert_eq!(list.items.len(), 1);
        let batches = &list.items[0].batches;
        let kinds: Vec<FaceKind> = batches.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![FaceKind::Points, FaceKind::Lines, FaceKind::Triangles, FaceKind::Polygons]
        );

        assert_eq!(batches[0].topology, Topology::PointList);
        assert_eq!(batches[0].indices, vec![0, 2]);
        assert_eq!(batches[0].face_count, 2);
        assert_eq!(batches[1].topology, Topology::LineList);
        assert_eq!(batches[1].indices, vec![0, 1]);
        assert_eq!(batches[2].indices, vec![0, 1, 2]);
        // quad split as a fan around vertex 0
        assert_eq!(batches[3].topology, Topology::TriangleList);
        assert_eq!(batches[3].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_wireframe_emits_outlines() {
        let mut scene = Scene::new();
        let material =
            scene.add_material(Material::new("wire").with(MaterialKey::Wireframe, MaterialValue::Int(1)));
        let mesh = scene.add_mesh(
            Mesh::new("quad", quad_positions(), vec![Face::new(vec![0, 1]), Face::new(vec![0, 1, 2, 3])])
                .with_material(material),
        );
        let root = scene.root();
        scene.attach_mesh(root, mesh);

        let list = DisplayList::build(&scene);
        let batches = &list.items[0].batches;

        assert_eq!(batches[0].kind, FaceKind::Lines);
        assert_eq!(batches[0].indices, vec![0, 1]);
        assert_eq!(batches[1].kind, FaceKind::Polygons);
        assert_eq!(batches[1].topology, Topology::LineList);
        assert_eq!(batches[1].indices, vec![0, 1, 1, 2, 2, 3, 3, 0]);
    }

    #[test]
    fn test_out_of_range_faces_are_skipped() {
        let mesh = Mesh::new(
            "broken",
            quad_positions(),
            vec![Face::new(vec![0, 1, 9]), Face::new(vec![0, 1, 2])],
        );
        let list = DisplayList::build(&single_mesh_scene(mesh));

        assert_eq!(list.skipped_faces, 1);
        assert_eq!(list.items[0].batches.len(), 1);
        assert_eq!(list.items[0].batches[0].face_count, 1);
    }

    #[test]
    fn test_vertex_colors_override_diffuse() {
        let colors = vec![[1.0, 0.0, 0.0, 1.0]; 4];
        let colored = Mesh::new("colored", quad_positions(), vec![Face::new(vec![0, 1, 2])])
            .with_colors(colors.clone());
        let list = DisplayList::build(&single_mesh_scene(colored));
        assert!(list.items[0].vertices.iter().all(|v| v.color == colors[0]));

        let plain = Mesh::new("plain", quad_positions(), vec![Face::new(vec![0, 1, 2])]);
        let list = DisplayList::build(&single_mesh_scene(plain));
        // no material at index 0, so the default diffuse applies
        assert!(list.items[0]
            .vertices
            .iter()
            .all(|v| v.color == SurfaceState::DEFAULT_DIFFUSE));
    }

    #[test]
    fn test_lighting_follows_normals() {
        let without = Mesh::new("flat", quad_positions(), vec![Face::new(vec![0, 1, 2])]);
        let list = DisplayList::build(&single_mesh_scene(without));
        assert!(!list.items[0].lit);
        assert!(list.items[0].vertices.iter().all(|v| v.normal == [0.0; 3]));

        let with = Mesh::new("lit", quad_positions(), vec![Face::new(vec![0, 1, 2])])
            .with_normals(vec![[0.0, 0.0, 1.0]; 4]);
        let list = DisplayList::build(&single_mesh_scene(with));
        assert!(list.items[0].lit);
        assert!(list.items[0].vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_world_transform_is_baked_per_node() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(
            Mesh::new("point", vec![[0.0, 0.0, 0.0]], vec![Face::new(vec![0])])
                .with_normals(vec![[1.0, 0.0, 0.0]]),
        );
        let root = scene.root();
        let moved = scene
            .add_node(
                root,
                Node::new("moved").with_transform(
                    Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0))
                        * Matrix4::from_nonuniform_scale(4.0, 1.0, 1.0),
                ),
            )
            .unwrap();
        scene.attach_mesh(root, mesh);
        scene.attach_mesh(moved, mesh);

        let list = DisplayList::build(&scene);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].node, root);
        assert_eq!(list.items[0].vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(list.items[1].node, moved);
        assert_eq!(list.items[1].vertices[0].position, [0.0, 3.0, 0.0]);
        // normals are renormalised after the inverse-transpose
        assert_eq!(list.items[1].vertices[0].normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_counts() {
        let mesh = Mesh::new("quad", quad_positions(), vec![Face::new(vec![0, 1, 2, 3])]);
        let list = DisplayList::build(&single_mesh_scene(mesh));
        assert_eq!(list.vertex_count(), 4);
        assert_eq!(list.index_count(), 6);
        assert_eq!(list.face_count(), 1);
        assert_eq!(list.batch_count(), 1);
        assert!(!list.is_empty());
        assert!(DisplayList::build(&Scene::new()).is_empty());
    }
}
