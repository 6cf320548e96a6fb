//! Per-draw surface uniforms
//!
//! Each draw item of the display list gets its own small uniform buffer holding
//! the material terms that are not baked into the vertex colors.

use crate::{
    gfx::scene::SurfaceState,
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// GPU copy of a [`SurfaceState`]. MUST match `SurfaceUniform` in viewer.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SurfaceUniform {
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
    /// 1.0 when lighting applies, 0.0 for unlit geometry
    pub lit: f32,
    _padding: [f32; 2],
}

impl SurfaceUniform {
    pub fn new(surface: &SurfaceState, lit: bool) -> Self {
        Self {
            ambient: surface.ambient,
            specular: surface.specular,
            emissive: surface.emissive,
            shininess: surface.shininess,
            lit: if lit { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        }
    }
}

type SurfaceUBO = UniformBuffer<SurfaceUniform>;

/// Shared layout for surface bind groups
pub struct SurfaceLayout {
    layout: wgpu::BindGroupLayout,
}

impl SurfaceLayout {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            layout: binding_types::single_uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "Surface Bind Group Layout",
            ),
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Uploads `uniform` and returns the bind group referencing it
    pub fn create_bindings(&self, device: &wgpu::Device, uniform: &SurfaceUniform) -> SurfaceBindings {
        let ubo = SurfaceUBO::new(device, "Surface Uniforms", uniform);
        let bind_group = binding_types::single_uniform_bind_group(
            device,
            &self.layout,
            ubo.binding_resource(),
            "Surface Bind Group",
        );
        SurfaceBindings {
            _ubo: ubo,
            bind_group,
        }
    }
}

/// Uniform buffer plus bind group of one draw item
pub struct SurfaceBindings {
    _ubo: SurfaceUBO,
    pub bind_group: wgpu::BindGroup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{Material, MaterialKey, MaterialValue};

    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SurfaceUniform>() % 16, 0);
    }

    #[test]
    fn test_uniform_copies_resolved_state() {
        let surface = Material::new("m")
            .with(MaterialKey::Shininess, MaterialValue::Float(8.0))
            .with(MaterialKey::EmissiveColor, MaterialValue::Color([0.1, 0.2, 0.3, 1.0]))
            .surface_state();

        let uniform = SurfaceUniform::new(&surface, true);
        assert_eq!(uniform.shininess, 8.0);
        assert_eq!(uniform.emissive, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(uniform.lit, 1.0);
        assert_eq!(SurfaceUniform::new(&surface, false).lit, 0.0);
    }
}
