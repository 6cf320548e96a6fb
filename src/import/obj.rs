//! Wavefront OBJ import through `tobj`
//!
//! Each OBJ object becomes one child node of the root holding a single mesh.
//! Faces are kept at their original arity; the display list decides how to
//! draw them.

use std::path::Path;

use super::FormatImporter;
use crate::{
    error::ImportError,
    gfx::scene::{Face, Material, MaterialKey, MaterialValue, Mesh, Node, Scene},
};

pub struct ObjImporter;

impl FormatImporter for ObjImporter {
    fn format_name(&self) -> &'static str {
        "Wavefront OBJ"
    }

    fn extensions(&self) -> &[&'static str] {
        &["obj"]
    }

    fn import(&self, path: &Path) -> Result<Scene, ImportError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: false,
                ignore_points: false,
                ignore_lines: false,
                ..Default::default()
            },
        )?;

        let materials = materials.unwrap_or_else(|e| {
            log::warn!("Ignoring materials of {}: {}", path.display(), e);
            Vec::new()
        });

        let mut scene = Scene::new();
        for material in &materials {
            scene.add_material(convert_material(material));
        }
        let mut fallback_material = None;

        let root = scene.root();
        for model in &models {
            let material_index = match model.mesh.material_id {
                Some(id) if id < materials.len() => id,
                _ => *fallback_material.get_or_insert_with(|| scene.add_material(Material::new("default"))),
            };

            let mesh = scene.add_mesh(convert_mesh(&model.name, &model.mesh).with_material(material_index));
            if let Some(node) = scene.add_node(root, Node::new(model.name.clone())) {
                scene.attach_mesh(node, mesh);
            }
        }

        log::debug!(
            "OBJ {}: {} object(s), {} material(s)",
            path.display(),
            models.len(),
            materials.len()
        );
        Ok(scene)
    }
}

fn convert_mesh(name: &str, mesh: &tobj::Mesh) -> Mesh {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let mut converted = Mesh::new(name, positions, faces(mesh));

    // with single_index every attribute stream is indexed like the positions
    if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
        converted = converted.with_normals(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect());
    }
    if !mesh.vertex_color.is_empty() && mesh.vertex_color.len() == mesh.positions.len() {
        converted = converted
            .with_colors(mesh.vertex_color.chunks_exact(3).map(|c| [c[0], c[1], c[2], 1.0]).collect());
    }

    converted
}

/// Splits the flat index list by face arity. No arities means all triangles.
fn faces(mesh: &tobj::Mesh) -> Vec<Face> {
    if mesh.face_arities.is_empty() {
        return mesh
            .indices
            .chunks(3)
            .map(|face| Face::new(face.to_vec()))
            .collect();
    }

    let mut start = 0;
    mesh.face_arities
        .iter()
        .map(|&arity| {
            let end = (start + arity as usize).min(mesh.indices.len());
            let face = Face::new(mesh.indices[start..end].to_vec());
            start = end;
            face
        })
        .collect()
}

fn convert_material(material: &tobj::Material) -> Material {
    let mut converted = Material::new(material.name.clone());
    let alpha = material.dissolve.unwrap_or(1.0);

    if let Some([r, g, b]) = material.diffuse {
        converted.set(MaterialKey::DiffuseColor, MaterialValue::Color([r, g, b, alpha]));
    }
    if let Some([r, g, b]) = material.specular {
        converted.set(MaterialKey::SpecularColor, MaterialValue::Color([r, g, b, 1.0]));
    }
    if let Some([r, g, b]) = material.ambient {
        converted.set(MaterialKey::AmbientColor, MaterialValue::Color([r, g, b, 1.0]));
    }
    if let Some([r, g, b]) = material.unknown_param.get("Ke").and_then(|value| parse_rgb(value)) {
        converted.set(MaterialKey::EmissiveColor, MaterialValue::Color([r, g, b, 1.0]));
    }
    if let Some(shininess) = material.shininess {
        converted.set(MaterialKey::Shininess, MaterialValue::Float(shininess));
    }

    converted
}

fn parse_rgb(value: &str) -> Option<[f32; 3]> {
    let mut components = value.split_whitespace().map(|c| c.parse::<f32>());
    match (components.next(), components.next(), components.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => Some([r, g, b]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::SurfaceState;
    use std::fs;

    const CUBE_SIDE: &str = "\
mtllib side.mtl
o side
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
usemtl red
f 1 2 3 4
f 2 5 3
";

    const SIDE_MTL: &str = "\
newmtl red
Kd 1.0 0.0 0.0
Ks 0.5 0.5 0.5
Ns 32
";

    #[test]
    fn test_polygons_keep_their_arity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("side.obj");
        fs::write(&path, CUBE_SIDE).unwrap();
        fs::write(dir.path().join("side.mtl"), SIDE_MTL).unwrap();

        let scene = ObjImporter.import(&path).unwrap();
        assert_eq!(scene.meshes.len(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 5);
        let arities: Vec<usize> = mesh.faces.iter().map(Face::len).collect();
        assert_eq!(arities, vec![4, 3]);

        // one child per object, attached under the root
        let root = scene.node(scene.root()).unwrap();
        assert_eq!(root.children.len(), 1);
        let child = scene.node(root.children[0]).unwrap();
        assert_eq!(child.meshes, vec![0]);
    }

    #[test]
    fn test_material_properties_are_carried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("side.obj");
        fs::write(&path, CUBE_SIDE).unwrap();
        fs::write(dir.path().join("side.mtl"), SIDE_MTL).unwrap();

        let scene = ObjImporter.import(&path).unwrap();
        let material = scene.material(scene.meshes[0].material_index).unwrap();
        let surface = material.surface_state();
        assert_eq!(surface.diffuse, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(surface.specular, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(surface.shininess, 32.0);
    }

    #[test]
    fn test_missing_mtl_falls_back_to_default_material() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("side.obj");
        fs::write(&path, CUBE_SIDE).unwrap();

        let scene = ObjImporter.import(&path).unwrap();
        let surface = scene
            .material(scene.meshes[0].material_index)
            .map(Material::surface_state)
            .unwrap();
        assert_eq!(surface.diffuse, SurfaceState::DEFAULT_DIFFUSE);
    }

    #[test]
    fn test_triangles_only_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();

        let scene = ObjImporter.import(&path).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.faces, vec![Face::new(vec![0, 1, 2])]);
        assert!(mesh.has_normals());
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("0.1 0.2 0.3"), Some([0.1, 0.2, 0.3]));
        assert_eq!(parse_rgb("0.1 0.2"), None);
        assert_eq!(parse_rgb("a b c"), None);
    }
}
