//! GPU copy of a display list
//!
//! Buffers are created once per load and replayed every frame until the next
//! successful load replaces them.

use wgpu::util::DeviceExt;

use super::{
    display_list::{DisplayList, DrawItem},
    pipeline_manager::PipelineKey,
};
use crate::gfx::resources::{SurfaceBindings, SurfaceLayout, SurfaceUniform};

pub struct GpuBatch {
    pub key: PipelineKey,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

pub struct GpuDrawItem {
    pub vertex_buffer: wgpu::Buffer,
    pub surface: SurfaceBindings,
    pub batches: Vec<GpuBatch>,
}

/// Uploaded geometry for one model generation
pub struct GpuModel {
    pub generation: u64,
    pub items: Vec<GpuDrawItem>,
}

impl GpuModel {
    pub fn upload(
        device: &wgpu::Device,
        surface_layout: &SurfaceLayout,
        list: &DisplayList,
        generation: u64,
    ) -> Self {
        let items: Vec<GpuDrawItem> = list
            .items
            .iter()
            .filter(|item| !item.vertices.is_empty() && !item.batches.is_empty())
            .map(|item| upload_item(device, surface_layout, item))
            .collect();

        log::debug!(
            "Uploaded model generation {}: {} draw item(s)",
            generation,
            items.len()
        );
        Self { generation, items }
    }
}

fn upload_item(device: &wgpu::Device, surface_layout: &SurfaceLayout, item: &DrawItem) -> GpuDrawItem {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex Buffer"),
        contents: bytemuck::cast_slice(&item.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let batches = item
        .batches
        .iter()
        .filter(|batch| !batch.indices.is_empty())
        .map(|batch| GpuBatch {
            key: PipelineKey::new(batch.topology, item.surface.two_sided),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&batch.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: batch.indices.len() as u32,
        })
        .collect();

    GpuDrawItem {
        vertex_buffer,
        surface: surface_layout.create_bindings(device, &SurfaceUniform::new(&item.surface, item.lit)),
        batches,
    }
}

/// Issues the draw call of one batch; the pipeline must already be set
pub trait DrawBatch<'a> {
    fn draw_batch(&mut self, item: &'a GpuDrawItem, batch: &'a GpuBatch);
}

impl<'a, 'b> DrawBatch<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_batch(&mut self, item: &'b GpuDrawItem, batch: &'b GpuBatch) {
        self.set_bind_group(1, &item.surface.bind_group, &[]);
        self.set_vertex_buffer(0, item.vertex_buffer.slice(..));
        self.set_index_buffer(batch.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..batch.index_count, 0, 0..1);
    }
}
