//! Point-sprite canvas for the particle field.
//!
//! Particles never change after spawn, so the instance buffer is written
//! once. All motion happens in the vertex shader, driven by the uniforms.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{instance_buffer_size, SurfaceTarget};
use crate::effect::{Canvas, DrawStats, Effect};
use crate::error::RenderError;
use crate::input::Viewport;
use crate::particles::{Particle, ParticleField};
use crate::shader_utils::STEP_WGSL;

/// Per-particle vertex data.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointInstance {
    pub home: [f32; 3],
    pub seeds: [f32; 4],
    pub color: [f32; 3],
}

impl From<&Particle> for PointInstance {
    fn from(p: &Particle) -> Self {
        Self {
            home: p.home.to_array(),
            seeds: p.seeds.to_array(),
            color: p.color.to_array(),
        }
    }
}

/// Uniform block shared by both shader stages.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub spread: f32,
    /// Base sprite size already multiplied by the pixel ratio.
    pub base_size: f32,
    pub size_randomness: f32,
    pub intensity: f32,
    /// 1.0 for glow sprites, 0.0 for solid discs.
    pub glow: f32,
}

impl PointUniforms {
    pub fn new(field: &ParticleField, resolution: Viewport) -> Self {
        let config = field.config();
        Self {
            model: field.model_matrix().to_cols_array_2d(),
            view: field.view_matrix().to_cols_array_2d(),
            projection: field.projection_matrix().to_cols_array_2d(),
            resolution: resolution.size().to_array(),
            time: field.time().elapsed(),
            spread: config.particle_spread,
            base_size: config.particle_base_size * config.pixel_ratio,
            size_randomness: config.size_randomness,
            intensity: config.intensity,
            glow: config.render_mode().as_uniform(),
        }
    }
}

const POINT_BODY_WGSL: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    resolution: vec2<f32>,
    time: f32,
    spread: f32,
    base_size: f32,
    size_randomness: f32,
    intensity: f32,
    glow: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) home: vec3<f32>,
    @location(1) seeds: vec4<f32>,
    @location(2) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) quad: vec2<f32>,
    @location(1) color: vec3<f32>,
    @location(2) seeds: vec4<f32>,
};

const SEED_PHASE: f32 = 6.28;
const WAVE_SPEED: f32 = 0.003;

@vertex
fn vs_main(in: VertexInput, @builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let quad = corners[vertex_index];

    let r = in.seeds;
    let t = uniforms.time * 1.5;
    let k = 3.0 * uniforms.intensity;

    var m = uniforms.model * vec4<f32>(in.home * uniforms.spread, 1.0);
    m.x += sin(t * WAVE_SPEED * r.z + SEED_PHASE * r.w) * mix(1.5, 6.0, r.x) * k;
    m.y += sin(t * WAVE_SPEED * 1.2 * r.y + SEED_PHASE * r.x) * mix(1.5, 6.0, r.w) * k;
    m.z += sin(t * WAVE_SPEED * 0.8 * r.w + SEED_PHASE * r.y) * mix(1.5, 6.0, r.z) * k;

    let pulse = sin(t * 0.002 + r.x * SEED_PHASE) * 0.4 + 1.0;
    m = vec4<f32>(m.xyz * pulse, m.w);

    m.x += sin(t * 0.0005 + r.y * SEED_PHASE) * 3.0;
    m.y += cos(t * 0.0007 + r.z * SEED_PHASE) * 3.0;

    let mv = uniforms.view * m;
    let distance_factor = 1.0 / max(length(mv.xyz) * 0.25, 1e-6);
    let variation = 1.0 + uniforms.size_randomness * (r.y - 0.5);
    let intensity_size = 1.0 + uniforms.intensity * 0.7;
    let size_px = max(
        uniforms.base_size * variation * distance_factor * intensity_size * pulse * 1.2,
        0.0,
    );

    // Expand the sprite in screen space
    let clip = uniforms.projection * mv;
    let offset = quad * size_px / uniforms.resolution * clip.w;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.zw);
    out.quad = quad;
    out.color = in.color;
    out.seeds = in.seeds;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let d = length(in.quad) * 0.5;

    let time_glow = sin(uniforms.time * 0.003 + in.seeds.x * 12.56) * 0.35;
    let intensity_glow = uniforms.intensity * 0.4;

    if (uniforms.glow < 0.5) {
        if (d > 0.5) {
            discard;
        }
        let center_glow = 1.0 - smooth_step(0.0, 0.4, d);
        let alpha = 1.0 - smooth_step(0.4, 0.5, d);
        let glow = 0.4 + time_glow + intensity_glow + center_glow * 0.7;
        let core = 1.0 - smooth_step(0.0, 0.15, d);
        let rgb = in.color * (1.0 + glow) + vec3<f32>(core * 0.8);
        return vec4<f32>(rgb, alpha * 0.95);
    }

    let circle = smooth_step(0.5, 0.2, d) * (1.0 + time_glow * 0.7 + intensity_glow * 0.5);
    let halo = smooth_step(0.7, 0.3, d) * 0.6;
    let outer = smooth_step(0.8, 0.6, d) * 0.3;
    let alpha = max(max(circle, halo), outer);

    let core = 1.0 - smooth_step(0.0, 0.1, d);
    let rgb = in.color * (1.0 + intensity_glow + time_glow * 0.4) + vec3<f32>(core * 1.2);
    return vec4<f32>(rgb, alpha * 0.9);
}
"#;

/// Complete WGSL source of the point-sprite pipeline.
pub fn point_shader() -> String {
    format!("{}\n{}", STEP_WGSL, POINT_BODY_WGSL)
}

/// Draws a [`ParticleField`] as instanced screen-facing quads.
pub struct PointCanvas {
    target: SurfaceTarget,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

impl PointCanvas {
    pub fn new(target: SurfaceTarget, field: &ParticleField) -> Self {
        let gpu = target.gpu();
        let device = &gpu.device;

        let instances: Vec<PointInstance> = field.particles().iter().map(PointInstance::from).collect();
        let instance_count = instances.len() as u32;

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: instance_buffer_size::<PointInstance>(instance_count),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if !instances.is_empty() {
            gpu.queue
                .write_buffer(&instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let uniforms = PointUniforms::new(field, target.viewport());
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = gpu.uniform_layout(
            "Particle Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let bind_group = gpu.uniform_bind_group("Particle Bind Group", &layout, &uniform_buffer);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(point_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3, // home
                        },
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x4, // seeds
                        },
                        wgpu::VertexAttribute {
                            offset: 28,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x3, // color
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            target,
            pipeline,
            uniform_buffer,
            bind_group,
            instance_buffer,
            instance_count,
        }
    }
}

impl Canvas<ParticleField> for PointCanvas {
    fn viewport(&self) -> Viewport {
        self.target.viewport()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.target.resize(viewport);
    }

    fn draw(&mut self, field: &ParticleField) -> Result<DrawStats, RenderError> {
        let uniforms = PointUniforms::new(field, self.target.viewport());
        self.target
            .gpu()
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let Some(mut frame) = self.target.begin_frame("Particle Encoder")? else {
            return Ok(DrawStats::default());
        };

        let instances = self.instance_count.min(field.instance_count());
        {
            let mut pass = frame.clear_pass("Particle Pass");
            if instances > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
                pass.draw(0..6, 0..instances);
            }
        }
        self.target.finish_frame(frame);

        Ok(DrawStats { instances })
    }

    fn release(&mut self) {
        self.instance_buffer.destroy();
        self.uniform_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 40);
        assert_eq!(std::mem::size_of::<PointUniforms>(), 224);
    }
}
