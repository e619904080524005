//! wgpu backend: one shared device, one surface per display region, and
//! one canvas per engine.

mod capsules;
mod points;
mod starfield;

use std::sync::Arc;

use winit::window::Window;

use crate::error::{GpuError, RenderError};
use crate::input::Viewport;

pub use capsules::{CapsuleCanvas, CapsuleInstance, CapsuleUniforms, CAPSULE_SHADER};
pub use points::{point_shader, PointCanvas, PointInstance, PointUniforms};
pub use starfield::{starfield_shader, StarfieldCanvas};

/// Consecutive `Lost` surface errors tolerated before giving up.
const MAX_LOST_FRAMES: u32 = 3;

/// Device and queue shared by every canvas.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create the device, picking an adapter that can present to `window`.
    ///
    /// Returns the context together with the window's surface.
    pub async fn new(window: Arc<Window>) -> Result<(Self, wgpu::Surface<'static>), GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Backdrop Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        log::info!("Using adapter {}", adapter.get_info().name);

        Ok((
            Self {
                instance,
                adapter,
                device,
                queue,
            },
            surface,
        ))
    }

    pub fn create_surface(&self, window: Arc<Window>) -> Result<wgpu::Surface<'static>, GpuError> {
        Ok(self.instance.create_surface(window)?)
    }

    pub(crate) fn uniform_layout(
        &self,
        label: &str,
        visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayout {
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
    }

    pub(crate) fn uniform_bind_group(
        &self,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

/// An acquired swapchain image and the encoder recording into it.
pub struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl Frame {
    /// Begin a render pass that clears to transparent black.
    pub fn clear_pass(&mut self, label: &str) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// A window surface, configured and resized with the region.
pub struct SurfaceTarget {
    gpu: Arc<GpuContext>,
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    lost_frames: u32,
}

impl SurfaceTarget {
    pub fn new(
        gpu: Arc<GpuContext>,
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let caps = surface.get_capabilities(&gpu.adapter);

        // Colours are authored as display values, so write them unconverted
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        Ok(Self {
            gpu,
            window,
            surface,
            config,
            lost_frames: 0,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.config.width = viewport.width;
        self.config.height = viewport.height;
        self.surface.configure(&self.gpu.device, &self.config);
    }

    /// Acquire the next image.
    ///
    /// Returns `Ok(None)` when this frame should be skipped (timeout, or the
    /// surface had to be reconfigured).
    pub fn begin_frame(&mut self, label: &str) -> Result<Option<Frame>, RenderError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Timeout) => return Ok(None),
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Lost) => {
                self.lost_frames += 1;
                if self.lost_frames > MAX_LOST_FRAMES {
                    return Err(RenderError::SurfaceLost(wgpu::SurfaceError::Lost));
                }
                self.surface.configure(&self.gpu.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(err) => return Err(RenderError::SurfaceLost(err)),
        };
        self.lost_frames = 0;

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        Ok(Some(Frame {
            surface_texture,
            view,
            encoder,
        }))
    }

    /// Submit the recorded work and present the image.
    pub fn finish_frame(&self, frame: Frame) {
        self.gpu.queue.submit(std::iter::once(frame.encoder.finish()));
        self.window.pre_present_notify();
        frame.surface_texture.present();
    }
}

/// Size in bytes of `count` instances of `T`, never zero.
pub(crate) fn instance_buffer_size<T>(count: u32) -> wgpu::BufferAddress {
    (std::mem::size_of::<T>() * count.max(1) as usize) as wgpu::BufferAddress
}
