//! Sparse material properties and their resolution into surface state
//!
//! Importers only record the properties a file actually specifies. The renderer
//! resolves a [`Material`] into a fully populated [`SurfaceState`], substituting
//! fixed defaults for anything that is absent.

use std::collections::HashMap;

/// Property keys understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    DiffuseColor,
    SpecularColor,
    AmbientColor,
    EmissiveColor,
    Shininess,
    ShininessStrength,
    TwoSided,
    Wireframe,
}

/// Value stored for a material property
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialValue {
    Color([f32; 4]),
    Float(f32),
    Int(i32),
}

/// Material as a sparse key/value set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: String,
    properties: HashMap<MaterialKey, MaterialValue>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Sets a property (builder pattern)
    pub fn with(mut self, key: MaterialKey, value: MaterialValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: MaterialKey, value: MaterialValue) {
        self.properties.insert(key, value);
    }

    pub fn get(&self, key: MaterialKey) -> Option<MaterialValue> {
        self.properties.get(&key).copied()
    }

    pub fn contains(&self, key: MaterialKey) -> bool {
        self.properties.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn color(&self, key: MaterialKey) -> Option<[f32; 4]> {
        match self.get(key)? {
            MaterialValue::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn float(&self, key: MaterialKey) -> Option<f32> {
        match self.get(key)? {
            MaterialValue::Float(f) => Some(f),
            MaterialValue::Int(i) => Some(i as f32),
            MaterialValue::Color(_) => None,
        }
    }

    pub fn int(&self, key: MaterialKey) -> Option<i32> {
        match self.get(key)? {
            MaterialValue::Int(i) => Some(i),
            MaterialValue::Float(f) => Some(f as i32),
            MaterialValue::Color(_) => None,
        }
    }

    /// Resolves this material into the state used to draw a mesh
    pub fn surface_state(&self) -> SurfaceState {
        let mut state = SurfaceState {
            diffuse: self
                .color(MaterialKey::DiffuseColor)
                .unwrap_or(SurfaceState::DEFAULT_DIFFUSE),
            specular: self
                .color(MaterialKey::SpecularColor)
                .unwrap_or(SurfaceState::DEFAULT_SPECULAR),
            ambient: self
                .color(MaterialKey::AmbientColor)
                .unwrap_or(SurfaceState::DEFAULT_AMBIENT),
            emissive: self
                .color(MaterialKey::EmissiveColor)
                .unwrap_or(SurfaceState::DEFAULT_EMISSIVE),
            shininess: 0.0,
            fill_mode: FillMode::Fill,
            two_sided: false,
        };

        match self.float(MaterialKey::Shininess) {
            Some(shininess) => {
                state.shininess = match self.float(MaterialKey::ShininessStrength) {
                    Some(strength) => shininess * strength,
                    None => shininess,
                };
            }
            None => {
                // no highlight at all without a shininess exponent
                state.specular = [0.0; 4];
            }
        }

        if self.int(MaterialKey::Wireframe).is_some_and(|w| w != 0) {
            state.fill_mode = FillMode::Wireframe;
        }
        state.two_sided = self.int(MaterialKey::TwoSided).is_some_and(|t| t != 0);

        state
    }
}

/// How polygons are rasterised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    Fill,
    Wireframe,
}

/// Fully resolved drawing state for one mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
    pub fill_mode: FillMode,
    /// Disables back-face culling
    pub two_sided: bool,
}

impl SurfaceState {
    pub const DEFAULT_DIFFUSE: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
    pub const DEFAULT_SPECULAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const DEFAULT_AMBIENT: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
    pub const DEFAULT_EMISSIVE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
}

impl Default for SurfaceState {
    /// State of a mesh whose material is missing entirely
    fn default() -> Self {
        Material::default().surface_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_material_uses_defaults() {
        let state = Material::new("empty").surface_state();

        assert_eq!(state.diffuse, SurfaceState::DEFAULT_DIFFUSE);
        assert_eq!(state.ambient, SurfaceState::DEFAULT_AMBIENT);
        assert_eq!(state.emissive, SurfaceState::DEFAULT_EMISSIVE);
        assert_eq!(state.shininess, 0.0);
        // specular is cleared, alpha included, when shininess is absent
        assert_eq!(state.specular, [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(state.fill_mode, FillMode::Fill);
        assert!(!state.two_sided);
        assert_eq!(SurfaceState::default(), state);
    }

    #[test]
    fn test_shininess_is_scaled_by_strength() {
        let material = Material::new("shiny")
            .with(MaterialKey::SpecularColor, MaterialValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with(MaterialKey::Shininess, MaterialValue::Float(20.0))
            .with(MaterialKey::ShininessStrength, MaterialValue::Float(0.5));

        let state = material.surface_state();
        assert_eq!(state.shininess, 10.0);
        assert_eq!(state.specular, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_shininess_without_strength() {
        let material = Material::new("plain").with(MaterialKey::Shininess, MaterialValue::Int(32));
        let state = material.surface_state();
        assert_eq!(state.shininess, 32.0);
        assert_eq!(state.specular, SurfaceState::DEFAULT_SPECULAR);
    }

    #[test]
    fn test_flags() {
        let material = Material::new("flags")
            .with(MaterialKey::Wireframe, MaterialValue::Int(1))
            .with(MaterialKey::TwoSided, MaterialValue::Int(1));
        let state = material.surface_state();
        assert_eq!(state.fill_mode, FillMode::Wireframe);
        assert!(state.two_sided);

        let off = Material::new("off")
            .with(MaterialKey::Wireframe, MaterialValue::Int(0))
            .with(MaterialKey::TwoSided, MaterialValue::Int(0));
        let state = off.surface_state();
        assert_eq!(state.fill_mode, FillMode::Fill);
        assert!(!state.two_sided);
    }

    #[test]
    fn test_mistyped_color_falls_back() {
        let material = Material::new("odd").with(MaterialKey::DiffuseColor, MaterialValue::Float(1.0));
        assert_eq!(material.color(MaterialKey::DiffuseColor), None);
        assert_eq!(material.surface_state().diffuse, SurfaceState::DEFAULT_DIFFUSE);
    }
}
