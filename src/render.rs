use std::borrow::Cow;

use glam::Vec2;
use log::{error, warn};
use wgpu::{util::DeviceExt, BindGroupLayoutEntry};

use crate::{gpu::GpuContext, particle::Rgba, surface::Canvas};

const MIN_INSTANCE_CAPACITY: usize = 256;

/// One filled circle, matches the instance inputs of `render.wgsl`
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub color: [f32; 4],
}

/// Instanced circle pipeline that draws whatever was filled since the last clear
pub struct RenderModule {
    screen_size_buffer: wgpu::Buffer,
    corners_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,

    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl RenderModule {
    pub fn new(device: &wgpu::Device, swapchain_format: wgpu::TextureFormat) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("render.wgsl"))),
        });

        let screen_size_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen Size Buffer"),
            size: 2 * 4,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Two triangles covering the unit square around a circle's center
        let corners_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Circle Corners Buffer"),
            contents: bytemuck::cast_slice(&[
                -1.0f32, -1.0, 1.0, -1.0, 1.0, 1.0, //
                -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
            ]),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = create_instance_buffer(device, MIN_INSTANCE_CAPACITY);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_size_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("circles"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<CircleInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32, 2 => Float32x4],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 2 * 4,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![3 => Float32x2],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment",
                targets: &[Some(wgpu::ColorTargetState {
                    format: swapchain_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            screen_size_buffer,
            corners_buffer,
            instance_buffer,
            instance_capacity: MIN_INSTANCE_CAPACITY,

            bind_group,
            pipeline,
        }
    }

    pub fn update_size(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        queue.write_buffer(
            &self.screen_size_buffer,
            0,
            bytemuck::bytes_of(&[width as f32, height as f32]),
        );
    }

    /// Uploads the instances, growing the buffer when they no longer fit
    pub fn update_instances(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        instances: &[CircleInstance],
    ) {
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    pub fn begin_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
        background: wgpu::Color,
        num_instances: u32,
    ) -> wgpu::RenderPass<'a> {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if num_instances > 0 {
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            rpass.set_vertex_buffer(1, self.corners_buffer.slice(..));
            rpass.draw(0..6, 0..num_instances);
        }

        rpass
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Circle Instance Buffer"),
        size: (std::mem::size_of::<CircleInstance>() * capacity) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// The window's drawing context: circles are collected between `clear` and
/// `present`, then drawn in one instanced pass over a cleared frame.
pub struct GpuCanvas {
    gpu: GpuContext<'static>,
    render_module: RenderModule,
    instances: Vec<CircleInstance>,
    background: wgpu::Color,
}

impl GpuCanvas {
    pub fn new(gpu: GpuContext<'static>, background: wgpu::Color) -> Self {
        let render_module = RenderModule::new(&gpu.device, gpu.format());
        render_module.update_size(&gpu.queue, gpu.config.width, gpu.config.height);

        let mut canvas = Self {
            gpu,
            render_module,
            instances: Vec::new(),
            background: wgpu::Color::BLACK,
        };
        canvas.set_background(background);
        canvas
    }

    /// Takes an sRGB colour, the clear value itself is linear
    pub fn set_background(&mut self, color: wgpu::Color) {
        self.background = if self.gpu.format().is_srgb() {
            wgpu::Color {
                r: srgb_to_linear(color.r as f32) as f64,
                g: srgb_to_linear(color.g as f32) as f64,
                b: srgb_to_linear(color.b as f32) as f64,
                a: color.a,
            }
        } else {
            color
        };
    }

    fn instance(&self, center: Vec2, radius: f32, color: Rgba) -> CircleInstance {
        let mut color = color.to_array();
        if self.gpu.format().is_srgb() {
            for channel in &mut color[..3] {
                *channel = srgb_to_linear(*channel);
            }
        }

        CircleInstance {
            center: center.to_array(),
            radius,
            color,
        }
    }
}

impl Canvas for GpuCanvas {
    fn resize_buffer(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.render_module
            .update_size(&self.gpu.queue, self.gpu.config.width, self.gpu.config.height);
    }

    fn clear(&mut self) {
        self.instances.clear();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let instance = self.instance(center, radius, color);
        self.instances.push(instance);
    }

    fn present(&mut self) {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring and skipping the frame");
                self.gpu.reconfigure_surface();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring the next frame");
                return;
            }
            Err(err) => {
                error!("Skipping frame: {err}");
                return;
            }
        };

        self.render_module
            .update_instances(&self.gpu.device, &self.gpu.queue, &self.instances);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let _rpass = self.render_module.begin_pass(
                &mut encoder,
                &view,
                self.background,
                self.instances.len() as u32,
            );
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}
