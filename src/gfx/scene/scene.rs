//! Scene graph storage
//!
//! Nodes live in an arena owned by the [`Scene`] and refer to their children by
//! [`NodeId`]. Nodes can only be created as children of an existing node, so the
//! graph is always a tree rooted at [`Scene::root`].

use cgmath::{Matrix4, SquareMatrix, Vector4};

use super::material::Material;

/// Index of a node inside its scene's arena
pub type NodeId = usize;

/// A node of the scene graph
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Matrix4<f32>,
    /// Indices into [`Scene::meshes`]
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }
}

/// A polygon, line or point given as an ordered list of vertex indices
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Mesh geometry as delivered by an importer. Immutable once the scene is built.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub material_index: usize,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            positions,
            faces,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_material(mut self, material_index: usize) -> Self {
        self.material_index = material_index;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }
}

/// One node as seen during a depth-first walk
#[derive(Debug, Clone, Copy)]
pub struct NodeVisit<'a> {
    pub id: NodeId,
    pub node: &'a Node,
    /// Parent world transform composed with the node's local transform
    pub world: Matrix4<f32>,
    /// Number of transforms on the stack while this node is active (root = 1)
    pub depth: usize,
}

/// Callbacks for [`Scene::walk`]
pub trait SceneVisitor {
    fn enter_node(&mut self, scene: &Scene, visit: &NodeVisit<'_>);

    fn leave_node(&mut self, _scene: &Scene, _id: NodeId, _depth: usize) {}
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Hierarchy of nodes plus the meshes and materials they reference
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    root: NodeId,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene containing only an identity root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("root")],
            root: 0,
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Appends `node` as the last child of `parent`.
    ///
    /// Returns `None` when `parent` does not exist.
    pub fn add_node(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        if parent >= self.nodes.len() {
            return None;
        }
        // children must be attached through add_node so the arena stays a tree
        node.children.clear();
        let id = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        Some(id)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Attaches an existing mesh to a node. Returns false if either index is invalid.
    pub fn attach_mesh(&mut self, node: NodeId, mesh: usize) -> bool {
        if mesh >= self.meshes.len() {
            return false;
        }
        match self.nodes.get_mut(node) {
            Some(node) => {
                node.meshes.push(mesh);
                true
            }
            None => false,
        }
    }

    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }

    /// Pre-order depth-first walk from the root.
    ///
    /// Each node's world transform is its parent's world transform times its own
    /// local transform. The transform stack is pushed on entering a node and
    /// popped on leaving it, so it always mirrors the path from the root. An
    /// explicit stack is used instead of recursion.
    pub fn walk<V: SceneVisitor>(&self, visitor: &mut V) {
        let mut transforms: Vec<Matrix4<f32>> = Vec::new();
        let mut steps = vec![Step::Enter(self.root)];

        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(id) => {
                    let Some(node) = self.nodes.get(id) else {
                        log::warn!("Skipping dangling node reference {}", id);
                        continue;
                    };
                    let parent = transforms.last().copied().unwrap_or_else(Matrix4::identity);
                    let world = parent * node.transform;
                    transforms.push(world);

                    visitor.enter_node(
                        self,
                        &NodeVisit {
                            id,
                            node,
                            world,
                            depth: transforms.len(),
                        },
                    );

                    steps.push(Step::Leave(id));
                    steps.extend(node.children.iter().rev().map(|&child| Step::Enter(child)));
                }
                Step::Leave(id) => {
                    visitor.leave_node(self, id, transforms.len());
                    transforms.pop();
                }
            }
        }
    }
}

/// Applies an affine transform to a position (w = 1)
pub fn transform_position(matrix: &Matrix4<f32>, p: [f32; 3]) -> [f32; 3] {
    let v = matrix * Vector4::new(p[0], p[1], p[2], 1.0);
    [v.x, v.y, v.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[derive(Default)]
    struct Recorder {
        entered: Vec<(NodeId, usize)>,
        left: Vec<(NodeId, usize)>,
        worlds: Vec<(NodeId, Matrix4<f32>)>,
    }

    impl SceneVisitor for Recorder {
        fn enter_node(&mut self, _scene: &Scene, visit: &NodeVisit<'_>) {
            self.entered.push((visit.id, visit.depth));
            self.worlds.push((visit.id, visit.world));
        }

        fn leave_node(&mut self, _scene: &Scene, id: NodeId, depth: usize) {
            self.left.push((id, depth));
        }
    }

    fn sample_tree() -> (Scene, [NodeId; 4]) {
        // root
        //  ├─ a (translate x+1)
        //  │   └─ b (translate y+2)
        //  └─ c (scale 2)
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene
            .add_node(
                root,
                Node::new("a").with_transform(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))),
            )
            .unwrap();
        let b = scene
            .add_node(
                a,
                Node::new("b").with_transform(Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();
        let c = scene
            .add_node(root, Node::new("c").with_transform(Matrix4::from_scale(2.0)))
            .unwrap();
        (scene, [root, a, b, c])
    }

    #[test]
    fn test_walk_is_preorder() {
        let (scene, [root, a, b, c]) = sample_tree();
        let mut recorder = Recorder::default();
        scene.walk(&mut recorder);

        let order: Vec<NodeId> = recorder.entered.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![root, a, b, c]);
    }

    #[test]
    fn test_transform_stack_is_balanced_per_subtree() {
        let (scene, _) = sample_tree();
        let mut recorder = Recorder::default();
        scene.walk(&mut recorder);

        assert_eq!(recorder.entered.len(), recorder.left.len());
        for (id, depth) in &recorder.entered {
            let (_, leave_depth) = recorder.left.iter().find(|(l, _)| l == id).unwrap();
            assert_eq!(depth, leave_depth, "node {} left at a different depth", id);
        }
    }

    #[test]
    fn test_sibling_does_not_inherit_previous_subtree_transform() {
        let (scene, [_, _, b, c]) = sample_tree();
        let mut recorder = Recorder::default();
        scene.walk(&mut recorder);

        let world_of = |id| recorder.worlds.iter().find(|(n, _)| *n == id).unwrap().1;

        assert_eq!(transform_position(&world_of(b), [0.0, 0.0, 0.0]), [1.0, 2.0, 0.0]);
        // c only sees the root's identity and its own scale
        assert_eq!(transform_position(&world_of(c), [1.0, 1.0, 1.0]), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_add_node_rejects_unknown_parent() {
        let mut scene = Scene::new();
        assert!(scene.add_node(42, Node::new("orphan")).is_none());
        assert_eq!(scene.nodes().len(), 1);
    }

    #[test]
    fn test_attach_mesh_validates_indices() {
        let mut scene = Scene::new();
        let root = scene.root();
        assert!(!scene.attach_mesh(root, 0));

        let mesh = scene.add_mesh(Mesh::new("m", vec![[0.0; 3]], vec![Face::new(vec![0])]));
        assert!(scene.attach_mesh(root, mesh));
        assert!(!scene.attach_mesh(7, mesh));
        assert_eq!(scene.vertex_count(), 1);
        assert_eq!(scene.face_count(), 1);
    }
}
