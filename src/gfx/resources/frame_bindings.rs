//! Per-frame uniform bindings
//!
//! Camera matrices and the fixed light rig, shared by every draw call of a frame
//! and bound to slot 0 in all pipelines.

use cgmath::{InnerSpace, Matrix4, Vector3};

use crate::wgpu_utils::{binding_types, uniform_buffer::UniformBuffer};

/// Directional light given in eye space
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Direction pointing towards the light
    pub direction: [f32; 3],
    pub color: [f32; 3],
}

/// The two lights the viewer uses: a grey key light from the upper left and a
/// cold blue fill light from the upper right. Both stay fixed relative to the
/// camera while the model rotates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightRig {
    pub lights: [DirectionalLight; 2],
    pub ambient: [f32; 3],
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            lights: [
                DirectionalLight {
                    direction: [-50.0, 50.0, 0.0],
                    color: [0.6, 0.6, 0.6],
                },
                DirectionalLight {
                    direction: [50.0, 50.0, 0.0],
                    color: [0.4, 0.4, 1.0],
                },
            ],
            ambient: [0.2, 0.2, 0.2],
        }
    }
}

/// Uniform content. MUST match `FrameUniform` in viewer.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub light_directions: [[f32; 4]; 2],
    pub light_colors: [[f32; 4]; 2],
    pub ambient: [f32; 4],
}

impl FrameUniform {
    pub fn new(model_view: Matrix4<f32>, projection: Matrix4<f32>, rig: &LightRig) -> Self {
        let direction = |light: &DirectionalLight| {
            let d = Vector3::from(light.direction);
            let d = if d.magnitude2() > 0.0 { d.normalize() } else { d };
            [d.x, d.y, d.z, 0.0]
        };
        let color = |light: &DirectionalLight| [light.color[0], light.color[1], light.color[2], 1.0];

        Self {
            view_proj: (projection * model_view).into(),
            model_view: model_view.into(),
            light_directions: [direction(&rig.lights[0]), direction(&rig.lights[1])],
            light_colors: [color(&rig.lights[0]), color(&rig.lights[1])],
            ambient: [rig.ambient[0], rig.ambient[1], rig.ambient[2], 1.0],
        }
    }
}

pub type FrameUBO = UniformBuffer<FrameUniform>;

/// Layout, buffer and bind group for [`FrameUniform`]
pub struct FrameBindings {
    layout: wgpu::BindGroupLayout,
    ubo: FrameUBO,
    bind_group: wgpu::BindGroup,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = binding_types::single_uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "Frame Bind Group Layout",
        );
        let ubo = FrameUBO::new(device, "Frame Uniforms", &bytemuck::Zeroable::zeroed());
        let bind_group = binding_types::single_uniform_bind_group(
            device,
            &layout,
            ubo.binding_resource(),
            "Frame Bind Group",
        );

        Self {
            layout,
            ubo,
            bind_group,
        }
    }

    /// Uploads `content`, skipping the write when the camera and lights did not change
    pub fn update(&mut self, queue: &wgpu::Queue, content: FrameUniform) {
        if self.ubo.write(queue, content) {
            log::trace!("Frame uniforms updated");
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
    }

    #[test]
    fn test_light_directions_are_normalized() {
        let uniform = FrameUniform::new(
            Matrix4::identity(),
            Matrix4::identity(),
            &LightRig::default(),
        );
        for d in uniform.light_directions {
            let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-6);
            assert_eq!(d[3], 0.0);
        }
    }
}
