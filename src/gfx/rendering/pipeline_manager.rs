//! Render pipeline management for the viewer
//!
//! All pipelines share one shader and one layout and differ only in primitive
//! topology and face culling, so every variant is created up front.

use std::collections::HashMap;
use wgpu::*;

use super::display_list::Topology;
use crate::gfx::scene::vertex::Vertex3D;

/// Identifies one pipeline variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub topology: Topology,
    /// Disables back-face culling
    pub two_sided: bool,
}

impl PipelineKey {
    pub fn new(topology: Topology, two_sided: bool) -> Self {
        Self {
            topology,
            two_sided,
        }
    }

    pub fn all() -> impl Iterator<Item = PipelineKey> {
        [Topology::PointList, Topology::LineList, Topology::TriangleList]
            .into_iter()
            .flat_map(|topology| [false, true].map(|two_sided| PipelineKey::new(topology, two_sided)))
    }

    fn label(&self) -> String {
        format!(
            "{:?} {} Pipeline",
            self.topology,
            if self.two_sided { "Two-Sided" } else { "Culled" }
        )
    }
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub color_format: TextureFormat,
    pub depth_format: Option<TextureFormat>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            color_format: TextureFormat::Bgra8Unorm,
            depth_format: None,
        }
    }
}

impl PipelineConfig {
    pub fn for_key(key: PipelineKey) -> Self {
        Self {
            label: key.label(),
            primitive_topology: key.topology.to_wgpu(),
            // culling only affects triangles, points and lines pass regardless
            cull_mode: if key.two_sided { None } else { Some(Face::Back) },
            ..Default::default()
        }
    }

    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_format = format;
        self
    }

    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }
}

/// Owns the viewer shader and one pipeline per [`PipelineKey`]
pub struct PipelineManager {
    shader: ShaderModule,
    layout: PipelineLayout,
    pipelines: HashMap<PipelineKey, RenderPipeline>,
}

impl PipelineManager {
    /// Compiles `shader_source` and builds every pipeline variant.
    ///
    /// `bind_group_layouts` are bound in order: frame bindings at group 0, surface
    /// bindings at group 1.
    pub fn new(
        device: &Device,
        shader_source: &str,
        bind_group_layouts: &[&BindGroupLayout],
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Viewer Shader"),
            source: ShaderSource::Wgsl(shader_source.into()),
        });

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Viewer Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        let mut manager = Self {
            shader,
            layout,
            pipelines: HashMap::new(),
        };

        for key in PipelineKey::all() {
            let config = PipelineConfig::for_key(key)
                .with_color_format(color_format)
                .with_depth_format(depth_format);
            let pipeline = manager.create_pipeline_from_config(device, &config);
            manager.pipelines.insert(key, pipeline);
        }
        log::debug!("Created {} render pipelines", manager.pipelines.len());

        manager
    }

    pub fn pipeline(&self, key: PipelineKey) -> Option<&RenderPipeline> {
        self.pipelines.get(&key)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    fn create_pipeline_from_config(&self, device: &Device, config: &PipelineConfig) -> RenderPipeline {
        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&self.layout),
            vertex: VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: config.color_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: config.primitive_topology,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: config.cull_mode,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
