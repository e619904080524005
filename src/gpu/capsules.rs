//! Instanced capsule canvas for the pointer-attraction field.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::{instance_buffer_size, SurfaceTarget};
use crate::attraction::{AttractionField, CapsuleMesh};
use crate::effect::{Canvas, DrawStats, Effect};
use crate::error::RenderError;
use crate::input::Viewport;

/// Model matrix of one capsule, column-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CapsuleInstance {
    pub model: [[f32; 4]; 4],
}

impl From<Mat4> for CapsuleInstance {
    fn from(m: Mat4) -> Self {
        Self {
            model: m.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CapsuleUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl CapsuleUniforms {
    pub fn new(field: &AttractionField) -> Self {
        Self {
            view_proj: field.view_projection().to_cols_array_2d(),
            color: field.color().to_array(),
        }
    }
}

pub const CAPSULE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct InstanceInput {
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    return uniforms.view_proj * model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return uniforms.color;
}
"#;

/// Draws an [`AttractionField`] as one instanced capsule mesh.
pub struct CapsuleCanvas {
    target: SurfaceTarget,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    capacity: u32,
    instances: Vec<CapsuleInstance>,
}

impl CapsuleCanvas {
    pub fn new(target: SurfaceTarget, field: &AttractionField) -> Self {
        let gpu = target.gpu();
        let device = &gpu.device;

        let mesh = CapsuleMesh::default();
        let positions: Vec<[f32; 3]> = mesh.positions.iter().map(|p| p.to_array()).collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Capsule Vertex Buffer"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Index buffers must be a multiple of four bytes
        let mut indices = mesh.indices.clone();
        if indices.len() % 2 != 0 {
            indices.push(0);
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Capsule Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let capacity = field.instance_count();
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capsule Instance Buffer"),
            size: instance_buffer_size::<CapsuleInstance>(capacity),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Capsule Uniform Buffer"),
            contents: bytemuck::bytes_of(&CapsuleUniforms::new(field)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = gpu.uniform_layout(
            "Capsule Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let bind_group = gpu.uniform_bind_group("Capsule Bind Group", &layout, &uniform_buffer);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Capsule Shader"),
            source: wgpu::ShaderSource::Wgsl(CAPSULE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Capsule Pipeline Layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Capsule Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<CapsuleInstance>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 16,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 32,
                                shader_location: 3,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 48,
                                shader_location: 4,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                        ],
                    },
                ],
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
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            instance_buffer,
            capacity,
            instances: Vec::with_capacity(capacity as usize),
        }
    }
}

impl Canvas<AttractionField> for CapsuleCanvas {
    fn viewport(&self) -> Viewport {
        self.target.viewport()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.target.resize(viewport);
    }

    fn draw(&mut self, field: &AttractionField) -> Result<DrawStats, RenderError> {
        let queue = &self.target.gpu().queue;

        self.instances.clear();
        self.instances.extend(
            field
                .capsules()
                .iter()
                .take(self.capacity as usize)
                .map(|c| CapsuleInstance::from(field.instance_transform(c))),
        );
        let count = self.instances.len() as u32;

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&CapsuleUniforms::new(field)),
        );
        if count > 0 {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }

        let Some(mut frame) = self.target.begin_frame("Capsule Encoder")? else {
            return Ok(DrawStats::default());
        };
        {
            let mut pass = frame.clear_pass("Capsule Pass");
            if count > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.index_count, 0, 0..count);
            }
        }
        self.target.finish_frame(frame);

        Ok(DrawStats { instances: count })
    }

    fn release(&mut self) {
        self.instance_buffer.destroy();
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.uniform_buffer.destroy();
    }
}
