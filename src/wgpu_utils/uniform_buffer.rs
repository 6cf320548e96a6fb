//! Uniform buffers backing the frame and surface bind groups

use wgpu::util::DeviceExt;

/// Single-value uniform buffer.
///
/// Keeps a copy of the value last written so that per-frame updates with an
/// unchanged camera and window do not queue a write.
pub struct UniformBuffer<T> {
    buffer: wgpu::Buffer,
    written: T,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, content: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(content),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            written: *content,
        }
    }

    /// Queues a write of `content`. Returns false when the buffer already holds it.
    pub fn write(&mut self, queue: &wgpu::Queue, content: T) -> bool {
        if !differs(&self.written, &content) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&content));
        self.written = content;
        true
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

fn differs<T: bytemuck::Pod>(a: &T, b: &T) -> bool {
    bytemuck::bytes_of(a) != bytemuck::bytes_of(b)
}
