//! WGPU-based rendering engine for the model viewer
//!
//! Owns the surface, device and every GPU resource. The model itself arrives as
//! a [`DisplayList`](super::display_list::DisplayList) and is uploaded once per
//! load generation, then replayed each frame.

use std::sync::Arc;

use super::{
    gpu_model::{DrawBatch, GpuModel},
    pipeline_manager::PipelineManager,
};
use crate::{
    config::ViewerConfig,
    error::ViewerError,
    gfx::resources::{FrameBindings, SurfaceLayout, TextureResource},
    viewer::FrameData,
};

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    frame_bindings: FrameBindings,
    surface_layout: SurfaceLayout,
    clear_color: wgpu::Color,
    gpu_model: Option<GpuModel>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `viewer_config` - Clear color and presentation settings
    ///
    /// # Errors
    /// Returns [`ViewerError::Gpu`] when no surface, adapter or device is available
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        viewer_config: &ViewerConfig,
    ) -> Result<RenderEngine, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| ViewerError::Gpu(format!("failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::Gpu(format!("failed to request adapter: {}", e)))?;

        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| ViewerError::Gpu(format!("failed to request device: {}", e)))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| ViewerError::Gpu("surface reports no texture formats".to_string()))?;

        let present_mode = if !viewer_config.vsync
            && surface_capabilities
                .present_modes
                .contains(&wgpu::PresentMode::Immediate)
        {
            wgpu::PresentMode::Immediate
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let frame_bindings = FrameBindings::new(&device);
        let surface_layout = SurfaceLayout::new(&device);
        let pipeline_manager = PipelineManager::new(
            &device,
            include_str!("viewer.wgsl"),
            &[frame_bindings.layout(), surface_layout.layout()],
            format,
            TextureResource::DEPTH_FORMAT,
        );

        let [r, g, b, a] = viewer_config.clear_color;

        Ok(Self {
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            depth_texture,
            pipeline_manager,
            frame_bindings,
            surface_layout,
            clear_color: wgpu::Color { r, g, b, a },
            gpu_model: None,
        })
    }

    /// Draws one frame.
    ///
    /// With no frame data only the background is cleared. The GPU copy of the
    /// model is rebuilt whenever the frame's model generation differs from the
    /// uploaded one; the old buffers are released first.
    ///
    /// Returns false when no frame could be presented and another redraw is needed.
    pub fn render(&mut self, frame: Option<FrameData<'_>>) -> Result<bool, ViewerError> {
        match &frame {
            Some(frame) => {
                let stale = self
                    .gpu_model
                    .as_ref()
                    .is_none_or(|gpu| gpu.generation != frame.model.generation);
                if stale {
                    self.gpu_model = None;
                    self.gpu_model = Some(GpuModel::upload(
                        &self.device,
                        &self.surface_layout,
                        &frame.model.display_list,
                        frame.model.generation,
                    ));
                }
                self.frame_bindings.update(&self.queue, frame.uniform);
            }
            None => self.gpu_model = None,
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(false);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(ViewerError::Gpu("out of memory acquiring surface texture".to_string()));
            }
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                return Ok(false);
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Model Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(gpu_model) = &self.gpu_model {
                render_pass.set_bind_group(0, self.frame_bindings.bind_group(), &[]);

                for item in &gpu_model.items {
                    for batch in &item.batches {
                        let Some(pipeline) = self.pipeline_manager.pipeline(batch.key) else {
                            log::warn!("No pipeline for {:?}", batch.key);
                            continue;
                        };
                        render_pass.set_pipeline(pipeline);
                        render_pass.draw_batch(item, batch);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(true)
    }

    /// Resizes the surface and recreates the depth buffer.
    ///
    /// Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }
}
