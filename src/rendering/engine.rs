use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, error, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::light::Light;
use super::proxy::VisualProxy;
use super::shaders::ShaderGenerator;
use super::surface::{RenderFrame, RenderSurface};
use crate::assets::mesh::{Mesh, MeshData, Vertex};
use crate::assets::texture::{Backdrop, Texture};
use crate::assets::GeometryKind;
use crate::config::{RenderSettings, ShadingSettings};
use crate::error::RenderError;
use crate::rendering::camera::CameraUniform;
use crate::rendering::shader_time::TimeUniform;
use crate::utils::logging::{handle_wgpu_result, log_adapter_info};

const INITIAL_INSTANCE_CAPACITY: usize = 1024;

/// Per-proxy data streamed to the GPU every frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: hover highlight, y: noise seed
    pub params: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4, 7 => Float32x4, 8 => Float32x4
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    pub fn from_proxy(proxy: &VisualProxy, hovered: bool) -> Self {
        let seed = (proxy.index() as f32 * 0.618_034).fract() * 10.0;
        Self {
            model: proxy.model_matrix().to_cols_array_2d(),
            color: proxy.attributes().color,
            params: [if hovered { 1.0 } else { 0.0 }, seed, 0.0, 0.0],
        }
    }
}

struct BackdropPass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    time_buffer: wgpu::Buffer,
    texture: Texture,
}

/// wgpu renderer drawing proxies as instanced unit meshes over an optional backdrop.
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    window: Arc<Window>,
    particle_pipeline: wgpu::RenderPipeline,
    uniform_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    time_buffer: wgpu::Buffer,
    meshes: Vec<(GeometryKind, Mesh)>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instances: Vec<InstanceRaw>,
    depth: Texture,
    backdrop: Option<BackdropPass>,
    clear_color: wgpu::Color,
    released: bool,
}

impl GpuRenderer {
    pub async fn new(
        window: Arc<Window>,
        rendering: &RenderSettings,
        shading: &ShadingSettings,
    ) -> Result<Self, RenderError> {
        info!("Initializing WGPU renderer");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = handle_wgpu_result(instance.create_surface(window.clone()), "create_surface")
            .map_err(|e| RenderError::SurfaceUnavailable(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log_adapter_info(&adapter);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Scene Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);
        info!("WGPU device and queue created successfully");

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::SurfaceUnavailable("surface reports no formats".into()))?;
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if rendering.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        info!("Configuring WGPU surface with format: {:?}", config.format);
        surface.configure(&device, &config);

        let camera_buffer = uniform_buffer(&device, "Camera Buffer", std::mem::size_of::<CameraUniform>());
        let time_buffer = uniform_buffer(&device, "Surface Time Buffer", std::mem::size_of::<TimeUniform>());
        let light = Light::default();
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniform Buffer"),
            contents: bytemuck::cast_slice(&[light.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("scene_uniform_layout"),
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: light_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: time_buffer.as_entire_binding() },
            ],
            label: Some("scene_uniform_bind_group"),
        });

        info!("Creating particle shader ({:?})", shading.quality);
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(ShaderGenerator::particle_shader(shading.quality).into()),
        });
        let particle_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&particle_layout),
            vertex: wgpu::VertexState {
                module: &particle_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceRaw::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &particle_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
            cache: None,
        });
        info!("Particle pipeline created successfully");

        let meshes = GeometryKind::ALL
            .iter()
            .map(|&kind| (kind, Mesh::upload(&device, &MeshData::for_kind(kind), &format!("{:?}", kind))))
            .collect();
        let instance_buffer = instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);
        let depth = Texture::depth(&device, config.width, config.height);

        let [r, g, b, a] = rendering.clear_color;
        let clear_color = wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 };
        let backdrop = match Backdrop::load(rendering.background_texture.as_deref(), rendering.clear_color) {
            Backdrop::Image(img) => Some(create_backdrop(&device, &queue, &img, config.format)),
            Backdrop::Color(_) => None,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            window,
            particle_pipeline,
            uniform_bind_group,
            camera_buffer,
            light_buffer,
            time_buffer,
            meshes,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            instances: Vec::with_capacity(INITIAL_INSTANCE_CAPACITY),
            depth,
            backdrop,
            clear_color,
            released: false,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Fill `self.instances` grouped by geometry; returns the instance range per mesh slot.
    fn gather_instances(&mut self, frame: &RenderFrame<'_>) -> Vec<std::ops::Range<u32>> {
        self.instances.clear();
        let mut ranges = Vec::with_capacity(self.meshes.len());
        for (kind, _) in &self.meshes {
            let start = self.instances.len() as u32;
            for proxy in frame.proxies {
                if GeometryKind::from_handle(proxy.attributes().geometry) == Some(*kind) {
                    let hovered = frame.hovered == Some(proxy.index());
                    self.instances.push(InstanceRaw::from_proxy(proxy, hovered));
                }
            }
            ranges.push(start..self.instances.len() as u32);
        }
        ranges
    }

    fn ensure_instance_capacity(&mut self) {
        if self.instances.len() <= self.instance_capacity {
            return;
        }
        let capacity = self.instances.len().next_power_of_two();
        debug!("Growing instance buffer from {} to {}", self.instance_capacity, capacity);
        self.instance_buffer.destroy();
        self.instance_buffer = instance_buffer(&self.device, capacity);
        self.instance_capacity = capacity;
    }
}

impl RenderSurface for GpuRenderer {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        let ranges = self.gather_instances(frame);
        self.ensure_instance_capacity();

        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[frame.camera.to_uniform()]));
        self.queue.write_buffer(&self.time_buffer, 0, bytemuck::cast_slice(&[frame.surface_time]));
        if !self.instances.is_empty() {
            self.queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }
        if let Some(backdrop) = &self.backdrop {
            self.queue.write_buffer(&backdrop.time_buffer, 0, bytemuck::cast_slice(&[frame.backdrop_time]));
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("Surface {:?}, reconfiguring and skipping frame", e);
                self.surface.configure(&self.device, &self.config);
                return Err(e.into());
            }
            Err(e) => {
                error!("Surface error: {:?}, skipping frame", e);
                return Err(e.into());
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(backdrop) = &self.backdrop {
                render_pass.set_pipeline(&backdrop.pipeline);
                render_pass.set_bind_group(0, &backdrop.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_pipeline(&self.particle_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for ((_, mesh), range) in self.meshes.iter().zip(ranges) {
                if range.is_empty() {
                    continue;
                }
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.num_indices, 0, range);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.released {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth.destroy();
        self.depth = Texture::depth(&self.device, width, height);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // Reverse order of creation.
        if let Some(backdrop) = self.backdrop.take() {
            backdrop.time_buffer.destroy();
            backdrop.texture.destroy();
        }
        self.depth.destroy();
        self.instance_buffer.destroy();
        for (_, mesh) in &self.meshes {
            mesh.destroy();
        }
        self.meshes.clear();
        self.time_buffer.destroy();
        self.light_buffer.destroy();
        self.camera_buffer.destroy();
        info!("GPU resources released");
    }
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_backdrop(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    img: &image::RgbaImage,
    format: wgpu::TextureFormat,
) -> BackdropPass {
    let texture = Texture::from_image(device, queue, img, Some("Backdrop Texture"));
    let time_buffer = uniform_buffer(device, "Backdrop Time Buffer", std::mem::size_of::<TimeUniform>());

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
        ],
        label: Some("backdrop_bind_group_layout"),
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&texture.view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&texture.sampler) },
            wgpu::BindGroupEntry { binding: 2, resource: time_buffer.as_entire_binding() },
        ],
        label: Some("backdrop_bind_group"),
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Backdrop Shader"),
        source: wgpu::ShaderSource::Wgsl(ShaderGenerator::backdrop_shader().into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Backdrop Pipeline Layout"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Backdrop Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_backdrop"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_backdrop"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    info!("Backdrop pipeline created successfully");

    BackdropPass { pipeline, bind_group, time_buffer, texture }
}
