//! Full-screen canvas for the starfield.

use super::SurfaceTarget;
use crate::effect::{Canvas, DrawStats};
use crate::error::RenderError;
use crate::input::Viewport;
use crate::shader_utils::all_utils_wgsl;
use crate::starfield::{StarUniforms, Starfield, StarfieldConfig, LAYERS};

const STARFIELD_BODY_WGSL: &str = r#"
@group(0) @binding(0)
var<uniform> u: Uniforms;

const SIN_45: f32 = 0.7071;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    // One oversized triangle covers the whole region
    let x = f32((vertex_index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(vertex_index & 2u) * 2.0 - 1.0;
    var out: VertexOutput;
    out.clip_position = vec4<f32>(x, y, 0.0, 1.0);
    return out;
}

fn star(uv: vec2<f32>, flare: f32) -> f32 {
    let d = length(uv);
    var m = (0.05 * u.glow_intensity) / d;

    var rays = smooth_step(0.0, 1.0, 1.0 - abs(uv.x * uv.y * 1000.0));
    m += rays * flare * u.glow_intensity;

    let diagonal = vec2<f32>(SIN_45 * uv.x - SIN_45 * uv.y, SIN_45 * uv.x + SIN_45 * uv.y);
    rays = smooth_step(0.0, 1.0, 1.0 - abs(diagonal.x * diagonal.y * 1000.0));
    m += rays * 0.3 * flare * u.glow_intensity;

    return m * smooth_step(1.0, 0.2, d);
}

fn star_layer(uv: vec2<f32>) -> vec3<f32> {
    var col = vec3<f32>(0.0);
    let gv = fract(uv) - 0.5;
    let id = floor(uv);

    for (var y: i32 = -1; y <= 1; y++) {
        for (var x: i32 = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y));
            let seed = hash21(id + offset);
            let size = fract(seed * 345.32);
            let flare = smooth_step(0.9, 1.0, size);

            let base = hsv2rgb(vec3<f32>(fract(seed + u.hue_shift / 360.0), u.saturation, 1.0));
            let pad = vec2<f32>(
                tris(seed * 34.0 + u.time * u.speed * 0.1),
                tris(seed * 38.0 + u.time * u.speed * 0.05),
            ) - 0.5;

            col += star(gv - offset - pad, flare) * size * base;
        }
    }
    return col;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let res = u.resolution.xy;
    let uv = vec2<f32>(in.clip_position.x / res.x, 1.0 - in.clip_position.y / res.y);
    let focal_px = u.focal * res;
    var p = (uv * res - focal_px) / res.y;

    if (u.mouse_repulsion != 0u) {
        let mouse = (u.mouse * res - focal_px) / res.y;
        let away = p - mouse;
        let dist = length(away);
        let force = (u.repulsion_strength * 0.1) / (dist + 0.15);
        var dir = vec2<f32>(0.0);
        if (dist > 0.0) {
            dir = away / dist;
        }
        p += dir * force * u.mouse_active_factor;
    }

    let angle = u.time * u.rotation_speed;
    let s = sin(angle);
    let c = cos(angle);
    p = vec2<f32>(c * p.x - s * p.y, s * p.x + c * p.y);

    var col = vec3<f32>(0.0);
    for (var layer: u32 = 0u; layer < LAYERS; layer++) {
        let i = f32(layer) / f32(LAYERS);
        let depth = fract(i + u.time * u.star_speed * 0.1);
        let scale = mix(20.0 * u.density, 0.5 * u.density, depth);
        col += star_layer(p * scale + i * 453.32) * depth;
    }

    var alpha = 1.0;
    if (u.transparent != 0u) {
        alpha = length(col);
    }
    return vec4<f32>(col, alpha);
}
"#;

/// Complete WGSL source of the starfield pipeline.
///
/// The uniform struct is generated from the same [`StarUniforms::to_set`]
/// layout the canvas uploads each frame.
pub fn starfield_shader() -> String {
    let set = StarUniforms::new(&StarfieldConfig::default(), Viewport::default()).to_set();
    format!(
        "{}\nconst LAYERS: u32 = {}u;\n{}\n{}",
        set.to_wgsl_struct("Uniforms"),
        LAYERS,
        all_utils_wgsl(),
        STARFIELD_BODY_WGSL
    )
}

/// Draws a [`Starfield`] with a single full-screen triangle.
pub struct StarfieldCanvas {
    target: SurfaceTarget,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl StarfieldCanvas {
    pub fn new(target: SurfaceTarget, field: &Starfield) -> Self {
        let gpu = target.gpu();
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Starfield Uniform Buffer"),
            size: field.uniform_set().byte_size() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = gpu.uniform_layout("Starfield Bind Group Layout", wgpu::ShaderStages::FRAGMENT);
        let bind_group = gpu.uniform_bind_group("Starfield Bind Group", &layout, &uniform_buffer);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Starfield Shader"),
            source: wgpu::ShaderSource::Wgsl(starfield_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Starfield Pipeline Layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let blend = if field.config().transparent {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Starfield Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.format(),
                    blend: Some(blend),
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
        }
    }
}

impl Canvas<Starfield> for StarfieldCanvas {
    fn viewport(&self) -> Viewport {
        self.target.viewport()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.target.resize(viewport);
    }

    fn draw(&mut self, field: &Starfield) -> Result<DrawStats, RenderError> {
        self.target
            .gpu()
            .queue
            .write_buffer(&self.uniform_buffer, 0, &field.uniform_set().to_bytes());

        let Some(mut frame) = self.target.begin_frame("Starfield Encoder")? else {
            return Ok(DrawStats::default());
        };
        {
            let mut pass = frame.clear_pass("Starfield Pass");
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.target.finish_frame(frame);

        Ok(DrawStats { instances: 1 })
    }

    fn release(&mut self) {
        self.uniform_buffer.destroy();
    }
}
