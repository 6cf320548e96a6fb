//! STL import, binary and ASCII
//!
//! All facets end up in one triangle mesh attached to the root node. Vertices
//! are not shared between facets, each carries its facet normal.
//!
//! Binary files written by Materialise tools may carry a `COLOR=` tag in the
//! header followed by a default RGBA color. In that case each facet's attribute
//! word holds a 15-bit color (5 bits each, red in the low bits) that is valid
//! while bit 15 is clear.

use std::{
    io::{Cursor, Read},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt};
use cgmath::{InnerSpace, Vector3};

use super::FormatImporter;
use crate::{
    error::ImportError,
    gfx::scene::{Face, Material, MaterialKey, MaterialValue, Mesh, Scene},
};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;
const COLOR_TAG: &[u8] = b"COLOR=";

/// Surface color used when the file does not define one
const DEFAULT_GRAY: [f32; 4] = [0.6, 0.6, 0.6, 1.0];
const DEFAULT_AMBIENT: [f32; 4] = [0.05, 0.05, 0.05, 1.0];

pub struct StlImporter;

impl FormatImporter for StlImporter {
    fn format_name(&self) -> &'static str {
        "STL"
    }

    fn extensions(&self) -> &[&'static str] {
        &["stl"]
    }

    fn import(&self, path: &Path) -> Result<Scene, ImportError> {
        let bytes = std::fs::read(path)?;
        let solid = parse(&bytes)?;
        log::debug!(
            "STL {}: {} facet(s), {}",
            path.display(),
            solid.positions.len() / 3,
            if solid.colors.is_some() { "colored" } else { "uncolored" }
        );
        Ok(solid.into_scene())
    }
}

/// Decoded STL contents before conversion into a scene
#[derive(Debug, Default)]
struct Solid {
    name: String,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Option<Vec<[f32; 4]>>,
    base_color: Option<[f32; 4]>,
}

impl Solid {
    fn push_facet(&mut self, normal: [f32; 3], vertices: [[f32; 3]; 3]) {
        let normal = facet_normal(normal, &vertices);
        for vertex in vertices {
            self.positions.push(vertex);
            self.normals.push(normal);
        }
    }

    fn into_scene(self) -> Scene {
        let mut scene = Scene::new();

        let diffuse = self.base_color.unwrap_or(DEFAULT_GRAY);
        let material = scene.add_material(
            Material::new("stl")
                .with(MaterialKey::DiffuseColor, MaterialValue::Color(diffuse))
                .with(MaterialKey::SpecularColor, MaterialValue::Color(diffuse))
                .with(MaterialKey::AmbientColor, MaterialValue::Color(DEFAULT_AMBIENT)),
        );

        let faces = (0..self.positions.len() as u32 / 3)
            .map(|i| Face::new(vec![3 * i, 3 * i + 1, 3 * i + 2]))
            .collect();
        let mut mesh = Mesh::new(self.name, self.positions, faces)
            .with_normals(self.normals)
            .with_material(material);
        if let Some(colors) = self.colors {
            mesh = mesh.with_colors(colors);
        }

        let mesh = scene.add_mesh(mesh);
        let root = scene.root();
        scene.attach_mesh(root, mesh);
        scene
    }
}

/// Uses the stored normal unless it is degenerate, then derives one from the winding
fn facet_normal(stored: [f32; 3], vertices: &[[f32; 3]; 3]) -> [f32; 3] {
    let stored = Vector3::from(stored);
    if stored.magnitude2() > f32::EPSILON {
        return stored.normalize().into();
    }

    let [a, b, c] = (*vertices).map(Vector3::from);
    let n = (b - a).cross(c - a);
    if n.magnitude2() > 0.0 {
        n.normalize().into()
    } else {
        [0.0; 3]
    }
}

fn parse(bytes: &[u8]) -> Result<Solid, ImportError> {
    if is_binary(bytes) {
        return parse_binary(bytes);
    }
    if starts_with_solid(bytes) {
        let text = std::str::from_utf8(bytes).map_err(|_| ImportError::stl("ASCII STL is not valid UTF-8"))?;
        return parse_ascii(text);
    }
    if bytes.len() < HEADER_LEN + 4 {
        return Err(ImportError::stl(format!("file too short ({} bytes)", bytes.len())));
    }
    Err(ImportError::stl("binary facet count does not match file size"))
}

/// Binary files may also start with "solid", so the size check decides first
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    count
        .checked_mul(FACET_LEN)
        .and_then(|len| len.checked_add(HEADER_LEN + 4))
        .is_some_and(|len| len == bytes.len())
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}

fn parse_binary(bytes: &[u8]) -> Result<Solid, ImportError> {
    let mut reader = Cursor::new(bytes);
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let count = reader.read_u32::<LittleEndian>()? as usize;

    let mut solid = Solid {
        base_color: header_color(&header),
        ..Default::default()
    };
    let mut colors = solid.base_color.map(|_| Vec::with_capacity(count * 3));

    for _ in 0..count {
        let normal = read_vec3(&mut reader)?;
        let vertices = [read_vec3(&mut reader)?, read_vec3(&mut reader)?, read_vec3(&mut reader)?];
        let attribute = reader.read_u16::<LittleEndian>()?;
        solid.push_facet(normal, vertices);

        if let (Some(colors), Some(base)) = (colors.as_mut(), solid.base_color) {
            let color = facet_color(attribute).unwrap_or(base);
            colors.extend_from_slice(&[color; 3]);
        }
    }

    solid.colors = colors;
    Ok(solid)
}

fn read_vec3(reader: &mut Cursor<&[u8]>) -> Result<[f32; 3], ImportError> {
    Ok([
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ])
}

/// Default color following a `COLOR=` tag in the header
fn header_color(header: &[u8; HEADER_LEN]) -> Option<[f32; 4]> {
    let at = header.windows(COLOR_TAG.len()).position(|w| w == COLOR_TAG)?;
    let rgba = header.get(at + COLOR_TAG.len()..at + COLOR_TAG.len() + 4)?;
    Some([
        rgba[0] as f32 / 255.0,
        rgba[1] as f32 / 255.0,
        rgba[2] as f32 / 255.0,
        rgba[3] as f32 / 255.0,
    ])
}

fn facet_color(attribute: u16) -> Option<[f32; 4]> {
    if attribute & 0x8000 != 0 {
        return None;
    }
    let channel = |shift: u16| ((attribute >> shift) & 0x1f) as f32 / 31.0;
    Some([channel(0), channel(5), channel(10), 1.0])
}

fn parse_ascii(text: &str) -> Result<Solid, ImportError> {
    let mut tokens = text.split_whitespace().peekable();
    let mut solid = Solid::default();

    // "solid" followed by an optional name up to the first facet
    tokens.next();
    let mut name = Vec::new();
    while let Some(&token) = tokens.peek() {
        if token == "facet" || token == "endsolid" {
            break;
        }
        name.push(token);
        tokens.next();
    }
    solid.name = name.join(" ");

    let mut normal = [0.0; 3];
    let mut vertices: Vec<[f32; 3]> = Vec::with_capacity(3);

    while let Some(token) = tokens.next() {
        match token {
            "facet" => {
                if tokens.next() != Some("normal") {
                    return Err(ImportError::stl("expected 'normal' after 'facet'"));
                }
                normal = read_ascii_vec3(&mut tokens)?;
                vertices.clear();
            }
            "vertex" => vertices.push(read_ascii_vec3(&mut tokens)?),
            "endfacet" => {
                let facet: [[f32; 3]; 3] = vertices
                    .as_slice()
                    .try_into()
                    .map_err(|_| ImportError::stl(format!("facet with {} vertices", vertices.len())))?;
                solid.push_facet(normal, facet);
                vertices.clear();
            }
            // structure keywords and trailing solid names carry no geometry
            _ => {}
        }
    }

    Ok(solid)
}

fn read_ascii_vec3<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<[f32; 3], ImportError> {
    let mut next = || -> Result<f32, ImportError> {
        let token = tokens
            .next()
            .ok_or_else(|| ImportError::stl("unexpected end of file"))?;
        token
            .parse::<f32>()
            .map_err(|_| ImportError::stl(format!("invalid number {:?}", token)))
    };
    Ok([next()?, next()?, next()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    fn binary_stl(header: &[u8], facets: &[([f32; 3], [[f32; 3]; 3], u16)]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[..header.len()].copy_from_slice(header);
        bytes.write_u32::<LittleEndian>(facets.len() as u32).unwrap();
        for (normal, vertices, attribute) in facets {
            for v in std::iter::once(normal).chain(vertices.iter()) {
                for c in v {
                    bytes.write_f32::<LittleEndian>(*c).unwrap();
                }
            }
            bytes.write_u16::<LittleEndian>(*attribute).unwrap();
        }
        bytes
    }

    fn single_mesh(scene: &Scene) -> &Mesh {
        assert_eq!(scene.nodes().len(), 1);
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.node(scene.root()).unwrap().meshes, vec![0]);
        &scene.meshes[0]
    }

    #[test]
    fn test_binary_triangle() {
        let bytes = binary_stl(b"solid but actually binary", &[([0.0, 0.0, 1.0], TRIANGLE, 0)]);
        let scene = parse(&bytes).unwrap().into_scene();
        let mesh = single_mesh(&scene);

        assert_eq!(mesh.positions, TRIANGLE.to_vec());
        assert_eq!(mesh.faces, vec![Face::new(vec![0, 1, 2])]);
        assert_eq!(mesh.normals.as_ref().unwrap(), &vec![[0.0, 0.0, 1.0]; 3]);
        assert!(mesh.colors.is_none());

        let surface = scene.materials[0].surface_state();
        assert_eq!(surface.diffuse, DEFAULT_GRAY);
    }

    #[test]
    fn test_ascii_triangle() {
        let text = "solid demo part
  facet normal 0 0 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid demo part
";
        let scene = parse(text.as_bytes()).unwrap().into_scene();
        let mesh = single_mesh(&scene);

        assert_eq!(mesh.name, "demo part");
        assert_eq!(mesh.positions, TRIANGLE.to_vec());
        // zero normal is replaced by the winding normal
        assert_eq!(mesh.normals.as_ref().unwrap()[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_materialise_colors() {
        let mut header = b"COLOR=".to_vec();
        header.extend_from_slice(&[0, 255, 0, 255]);
        let bytes = binary_stl(
            &header,
            &[
                ([0.0, 0.0, 1.0], TRIANGLE, 31),
                ([0.0, 0.0, 1.0], TRIANGLE, 0x8000),
                ([0.0, 0.0, 1.0], TRIANGLE, 31 << 10 | 16 << 5),
            ],
        );
        let solid = parse(&bytes).unwrap();
        assert_eq!(solid.base_color, Some([0.0, 1.0, 0.0, 1.0]));

        let colors = solid.colors.as_ref().unwrap();
        assert_eq!(colors.len(), 9);
        assert_eq!(colors[0], [1.0, 0.0, 0.0, 1.0]);
        // bit 15 set falls back to the header color
        assert_eq!(colors[3], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(colors[6], [0.0, 16.0 / 31.0, 1.0, 1.0]);
    }

    #[test]
    fn test_truncated_binary_is_an_error() {
        let mut bytes = binary_stl(b"", &[([0.0; 3], TRIANGLE, 0)]);
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(parse(&bytes), Err(ImportError::Stl { .. })));
        assert!(matches!(parse(b"tiny"), Err(ImportError::Stl { .. })));
    }

    #[test]
    fn test_ascii_facet_with_wrong_vertex_count() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid\n";
        assert!(matches!(parse(text.as_bytes()), Err(ImportError::Stl { .. })));
    }

    #[test]
    fn test_import_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.stl");
        std::fs::write(&path, binary_stl(b"", &[([0.0, 0.0, 1.0], TRIANGLE, 0)])).unwrap();

        let scene = StlImporter.import(&path).unwrap();
        assert_eq!(scene.vertex_count(), 3);
        assert_eq!(scene.face_count(), 1);
    }
}
