use std::collections::BTreeMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use orrery_common::{Light, Material, RenderHandle, Shading, Shape, SurfaceSize};
use orrery_render::{CameraState, RenderError, RenderService};
use wgpu::util::DeviceExt;

use crate::mesh::{self, MeshKey, Vertex};
use crate::shaders;

const MAX_INSTANCES: u32 = 4096;
/// Size of the light array in [`shaders::BODY_SHADER`].
const MAX_LIGHTS: usize = 4;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.005,
    g: 0.005,
    b: 0.02,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    lights: [GpuLight; MAX_LIGHTS],
    /// x: number of used entries in `lights`.
    light_count: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct GpuLight {
    /// Point: position, w = 1. Directional: direction of travel, w = 0.
    vector: [f32; 4],
    /// Color times intensity.
    radiance: [f32; 4],
}

/// Pack scene lights for the uniform buffer. No lights means the star at the
/// origin; lights past [`MAX_LIGHTS`] are dropped.
fn pack_lights(lights: &[Light]) -> ([GpuLight; MAX_LIGHTS], u32) {
    let star = [Light::star()];
    let lights = if lights.is_empty() { &star[..] } else { lights };
    if lights.len() > MAX_LIGHTS {
        tracing::warn!(
            count = lights.len(),
            max = MAX_LIGHTS,
            "too many lights, extra lights ignored"
        );
    }
    let mut packed = [GpuLight::zeroed(); MAX_LIGHTS];
    for (slot, light) in packed.iter_mut().zip(lights) {
        let [r, g, b] = light.radiance();
        let vector = match *light {
            Light::Point { position: [x, y, z], .. } => [x, y, z, 1.0],
            Light::Directional { direction: [x, y, z], .. } => [x, y, z, 0.0],
        };
        *slot = GpuLight {
            vector,
            radiance: [r, g, b, 1.0],
        };
    }
    (packed, lights.len().min(MAX_LIGHTS) as u32)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

/// A render object owned by the GPU service.
#[derive(Debug, Clone)]
struct GpuObject {
    mesh: MeshKey,
    scale: f32,
    material: Material,
    position: Vec3,
    rotation: Vec3,
}

impl GpuObject {
    fn instance(&self) -> InstanceData {
        let r = self.rotation;
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.position,
        );
        let cols = model.to_cols_array_2d();
        let shading = match self.material.shading {
            Shading::Basic => 0.0,
            Shading::Standard => 1.0,
            Shading::Emissive => 2.0,
        };
        InstanceData {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: self.material.base_color,
            params: [shading, 0.0, 0.0, 0.0],
        }
    }
}

/// One instanced draw call.
#[derive(Debug, Clone, PartialEq)]
struct Batch {
    mesh: MeshKey,
    translucent: bool,
    instances: Range<u32>,
}

/// Group the drawn handles into instanced batches: opaque meshes first, then
/// translucent ones so shells and rings blend over what is behind them.
fn plan_frame(
    objects: &BTreeMap<RenderHandle, GpuObject>,
    handles: &[RenderHandle],
    max_instances: usize,
) -> Result<(Vec<InstanceData>, Vec<Batch>), RenderError> {
    let mut groups: BTreeMap<(bool, MeshKey), Vec<InstanceData>> = BTreeMap::new();
    for handle in handles {
        let obj = objects
            .get(handle)
            .ok_or(RenderError::UnknownHandle(*handle))?;
        groups
            .entry((obj.material.is_translucent(), obj.mesh))
            .or_default()
            .push(obj.instance());
    }

    let mut instances = Vec::with_capacity(handles.len().min(max_instances));
    let mut batches = Vec::with_capacity(groups.len());
    for ((translucent, mesh), group) in groups {
        let room = max_instances - instances.len();
        if group.len() > room {
            tracing::warn!(dropped = group.len() - room, "instance buffer full");
        }
        let start = instances.len() as u32;
        instances.extend(group.into_iter().take(room));
        let end = instances.len() as u32;
        if end > start {
            batches.push(Batch {
                mesh,
                translucent,
                instances: start..end,
            });
        }
    }
    Ok((instances, batches))
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// wgpu-backed rendering service drawing into a window surface.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    lights: [GpuLight; MAX_LIGHTS],
    light_count: u32,
    instance_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    meshes: BTreeMap<MeshKey, GpuMesh>,
    objects: BTreeMap<RenderHandle, GpuObject>,
    next_handle: u64,
}

impl WgpuRenderer {
    /// Create the surface for `target`, pick an adapter and device, and build
    /// the pipelines. Blocks until the device is ready.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: SurfaceSize,
    ) -> Result<Self, RenderError> {
        let size = size.at_least_one();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::Backend("no compatible GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orrery_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Backend(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let (lights, light_count) = pack_lights(&[]);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                lights,
                light_count: [light_count, 0, 0, 0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("body_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BODY_SHADER.into()),
        });

        let opaque_pipeline = body_pipeline(&device, &pipeline_layout, &shader, format, false);
        let translucent_pipeline = body_pipeline(&device, &pipeline_layout, &shader, format, true);

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: MAX_INSTANCES as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = create_depth_texture(&device, size);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            opaque_pipeline,
            translucent_pipeline,
            uniform_buffer,
            uniform_bind_group,
            lights,
            light_count,
            instance_buffer,
            depth_texture,
            meshes: BTreeMap::new(),
            objects: BTreeMap::new(),
            next_handle: 0,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn ensure_mesh(&mut self, key: MeshKey) {
        if self.meshes.contains_key(&key) {
            return;
        }
        let data = mesh::build(key);
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertex_buffer"),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_index_buffer"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        tracing::debug!(?key, vertices = data.vertices.len(), "uploaded mesh");
        self.meshes.insert(
            key,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            },
        );
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl RenderService for WgpuRenderer {
    fn create_handle(
        &mut self,
        shape: &Shape,
        material: &Material,
    ) -> Result<RenderHandle, RenderError> {
        let (key, scale) = mesh::mesh_for(shape);
        self.ensure_mesh(key);
        self.next_handle += 1;
        let handle = RenderHandle(self.next_handle);
        self.objects.insert(
            handle,
            GpuObject {
                mesh: key,
                scale,
                material: material.clone(),
                position: Vec3::ZERO,
                rotation: Vec3::ZERO,
            },
        );
        Ok(handle)
    }

    fn set_position(&mut self, handle: RenderHandle, position: Vec3) {
        if let Some(obj) = self.objects.get_mut(&handle) {
            obj.position = position;
        }
    }

    fn set_rotation(&mut self, handle: RenderHandle, rotation: Vec3) {
        if let Some(obj) = self.objects.get_mut(&handle) {
            obj.rotation = rotation;
        }
    }

    fn set_lights(&mut self, lights: &[Light]) {
        (self.lights, self.light_count) = pack_lights(lights);
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        let size = size.at_least_one();
        self.config.width = size.width;
        self.config.height = size.height;
        self.reconfigure();
        self.depth_texture = create_depth_texture(&self.device, size);
        Ok(())
    }

    fn draw(&mut self, handles: &[RenderHandle], camera: &CameraState) -> Result<(), RenderError> {
        let (instances, batches) = plan_frame(&self.objects, handles, MAX_INSTANCES as usize)?;

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                lights: self.lights,
                light_count: [self.light_count, 0, 0, 0],
            }),
        );
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for batch in &batches {
                let Some(mesh) = self.meshes.get(&batch.mesh) else {
                    continue;
                };
                pass.set_pipeline(if batch.translucent {
                    &self.translucent_pipeline
                } else {
                    &self.opaque_pipeline
                });
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn body_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    translucent: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if translucent {
            "translucent_pipeline"
        } else {
            "opaque_pipeline"
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                        7 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(if translucent {
                    wgpu::BlendState::ALPHA_BLENDING
                } else {
                    wgpu::BlendState::REPLACE
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        // Translucent shells test against opaque depth but do not occlude each other.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: !translucent,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(device: &wgpu::Device, size: SurfaceSize) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
