use std::num::NonZeroU64;
use std::sync::Arc;

use slotmap::SlotMap;
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, RenderPipeline, SurfaceConfiguration};
use winit::window::Window;

use super::{GeometryId, Material, MaterialId, RenderSurface};
use crate::core::{GpuContext, Viewport};
use crate::error::{BackdropError, Result};
use crate::scene::{Geometry, Scene, Topology};

const SPRITE_CORNERS: u32 = 6;
const INITIAL_TRANSFORM_SLOTS: usize = 32;
const MSAA_SAMPLES: u32 = 4;

// === GPU Data Structures ===

/// Camera uniform buffer data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

/// Per-object model matrix, one dynamic-offset slot per drawable
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct TransformUniform {
    model: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    color: [f32; 4],
    params: [f32; 4],
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        match *material {
            Material::Sprites { size, opacity } => Self {
                color: [1.0, 1.0, 1.0, opacity],
                params: [size, 0.0, 0.0, 0.0],
            },
            Material::Wireframe { color, opacity } => Self {
                color: [color[0], color[1], color[2], opacity],
                params: [0.0; 4],
            },
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

struct GpuGeometry {
    buffer: Buffer,
    vertex_count: u32,
    topology: Topology,
}

struct GpuMaterial {
    buffer: Buffer,
    bind_group: BindGroup,
}

/// Growable uniform buffer addressed with dynamic offsets
struct TransformSlots {
    buffer: Buffer,
    bind_group: BindGroup,
    capacity: usize,
    stride: u64,
}

/// Multisampled colour target resolved into the swapchain image
struct MsaaTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Renders the scene into a window surface
///
/// Particles are drawn as additive sprites (instanced quads), shapes as
/// alpha-blended line lists. No depth buffer: every object is translucent.
pub struct GpuSurface {
    gpu: GpuContext,
    surface: Option<wgpu::Surface<'static>>,
    surface_config: SurfaceConfiguration,
    clear_color: wgpu::Color,
    sample_count: u32,
    msaa: Option<MsaaTarget>,
    sprite_pipeline: RenderPipeline,
    line_pipeline: RenderPipeline,
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,
    transform_layout: BindGroupLayout,
    material_layout: BindGroupLayout,
    transforms: TransformSlots,
    geometries: SlotMap<GeometryId, GpuGeometry>,
    materials: SlotMap<MaterialId, GpuMaterial>,
}

impl GpuSurface {
    /// Create a surface filling `window`
    ///
    /// Fails when the host has no adapter able to present to the window.
    pub fn new(
        instance: &wgpu::Instance,
        window: Arc<Window>,
        viewport: Viewport,
        clear_color: [f64; 4],
        antialias: bool,
    ) -> Result<Self> {
        let surface = instance.create_surface(window)?;
        let gpu = pollster::block_on(GpuContext::for_surface(instance, &surface))?;
        let surface_config = Self::create_surface_config(&surface, &gpu, viewport)?;
        surface.configure(gpu.device(), &surface_config);

        let features = gpu.adapter().get_texture_format_features(surface_config.format);
        let sample_count = sample_count(antialias, features.flags);

        let device = gpu.device();
        let msaa = create_msaa_target(device, &surface_config, sample_count);
        let camera_layout = uniform_layout(
            device,
            "Camera Bind Group Layout",
            false,
            wgpu::ShaderStages::VERTEX,
        );
        let transform_layout = uniform_layout(
            device,
            "Transform Bind Group Layout",
            true,
            wgpu::ShaderStages::VERTEX,
        );
        let material_layout = uniform_layout(
            device,
            "Material Bind Group Layout",
            false,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let layouts = [&camera_layout, &transform_layout, &material_layout];
        let sprite_pipeline = Self::create_pipeline(
            device,
            &layouts,
            surface_config.format,
            sample_count,
            PipelineKind::Sprites,
        );
        let line_pipeline = Self::create_pipeline(
            device,
            &layouts,
            surface_config.format,
            sample_count,
            PipelineKind::Lines,
        );

        let transforms =
            Self::create_transform_slots(device, &transform_layout, INITIAL_TRANSFORM_SLOTS);

        log::info!(
            "Render surface {}x{} ({:?}, {}x MSAA)",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            sample_count
        );

        let [r, g, b, a] = clear_color;
        Ok(Self {
            gpu,
            surface: Some(surface),
            surface_config,
            clear_color: wgpu::Color { r, g, b, a },
            sample_count,
            msaa,
            sprite_pipeline,
            line_pipeline,
            camera_buffer,
            camera_bind_group,
            transform_layout,
            material_layout,
            transforms,
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
        })
    }

    fn create_surface_config(
        surface: &wgpu::Surface<'_>,
        gpu: &GpuContext,
        viewport: Viewport,
    ) -> Result<SurfaceConfiguration> {
        let caps = surface.get_capabilities(gpu.adapter());
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| BackdropError::Adapter("surface reports no texture formats".into()))?;

        // Let the desktop show through the transparent clear colour when possible
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| caps.alpha_modes.contains(mode))
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        Ok(SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width.max(1),
            height: viewport.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn create_pipeline(
        device: &Device,
        layouts: &[&BindGroupLayout],
        format: wgpu::TextureFormat,
        sample_count: u32,
        kind: PipelineKind,
    ) -> RenderPipeline {
        let (label, source, step_mode, topology, blend) = match kind {
            PipelineKind::Sprites => (
                "Sprite Pipeline",
                include_str!("shaders/sprite.wgsl"),
                wgpu::VertexStepMode::Instance,
                wgpu::PrimitiveTopology::TriangleList,
                additive_blend(),
            ),
            PipelineKind::Lines => (
                "Wireframe Pipeline",
                include_str!("shaders/wireframe.wgsl"),
                wgpu::VertexStepMode::Vertex,
                wgpu::PrimitiveTopology::LineList,
                wgpu::BlendState::ALPHA_BLENDING,
            ),
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout(step_mode)],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_transform_slots(
        device: &Device,
        layout: &BindGroupLayout,
        capacity: usize,
    ) -> TransformSlots {
        let size = std::mem::size_of::<TransformUniform>() as u64;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = size.div_ceil(alignment) * alignment;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(size),
                }),
            }],
        });

        TransformSlots {
            buffer,
            bind_group,
            capacity,
            stride,
        }
    }

    /// Write every model matrix into its slot, growing the buffer if needed
    fn write_transforms(&mut self, models: &[glam::Mat4]) {
        if models.is_empty() {
            return;
        }
        if models.len() > self.transforms.capacity {
            let capacity = models.len().next_power_of_two();
            self.transforms.buffer.destroy();
            self.transforms =
                Self::create_transform_slots(self.gpu.device(), &self.transform_layout, capacity);
            log::debug!("Grew transform buffer to {} slots", capacity);
        }

        let stride = self.transforms.stride as usize;
        let mut bytes = vec![0u8; stride * models.len()];
        for (slot, model) in bytes.chunks_exact_mut(stride).zip(models) {
            let uniform = TransformUniform {
                model: model.to_cols_array_2d(),
            };
            let data = bytemuck::bytes_of(&uniform);
            slot[..data.len()].copy_from_slice(data);
        }
        self.gpu.queue().write_buffer(&self.transforms.buffer, 0, &bytes);
    }

    fn reconfigure(&self) {
        if let Some(surface) = &self.surface {
            surface.configure(self.gpu.device(), &self.surface_config);
        }
    }
}

#[derive(Clone, Copy)]
enum PipelineKind {
    Sprites,
    Lines,
}

/// 4x when requested and the adapter can both render and resolve the format
fn sample_count(antialias: bool, flags: wgpu::TextureFormatFeatureFlags) -> u32 {
    let supported = flags.sample_count_supported(MSAA_SAMPLES)
        && flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE);
    if antialias && supported {
        MSAA_SAMPLES
    } else {
        1
    }
}

fn create_msaa_target(
    device: &Device,
    config: &SurfaceConfiguration,
    sample_count: u32,
) -> Option<MsaaTarget> {
    if sample_count <= 1 {
        return None;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Colour Target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Some(MsaaTarget { texture, view })
}

fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn uniform_layout(
    device: &Device,
    label: &str,
    has_dynamic_offset: bool,
    visibility: wgpu::ShaderStages,
) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

impl RenderSurface for GpuSurface {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.surface_config.width, self.surface_config.height)
    }

    fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }

        self.surface_config.width = viewport.width;
        self.surface_config.height = viewport.height;
        self.reconfigure();

        if let Some(old) = self.msaa.take() {
            old.texture.destroy();
        }
        self.msaa = create_msaa_target(self.gpu.device(), &self.surface_config, self.sample_count);
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId> {
        let vertices: Vec<Vertex> = geometry
            .positions
            .iter()
            .zip(&geometry.colors)
            .map(|(&position, &color)| Vertex { position, color })
            .collect();

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Ok(self.geometries.insert(GpuGeometry {
            buffer,
            vertex_count: vertices.len() as u32,
            topology: geometry.topology,
        }))
    }

    fn create_material(&mut self, material: &Material) -> Result<MaterialId> {
        let device = self.gpu.device();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Buffer"),
            contents: bytemuck::bytes_of(&MaterialUniform::from(material)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Ok(self.materials.insert(GpuMaterial { buffer, bind_group }))
    }

    fn release_geometry(&mut self, id: GeometryId) {
        if let Some(geometry) = self.geometries.remove(id) {
            geometry.buffer.destroy();
        }
    }

    fn release_material(&mut self, id: MaterialId) {
        if let Some(material) = self.materials.remove(id) {
            material.buffer.destroy();
        }
    }

    fn live_resources(&self) -> usize {
        self.geometries.len() + self.materials.len()
    }

    fn render(&mut self, scene: &Scene) -> Result<()> {
        let drawables: Vec<_> = scene.drawables().collect();
        let models: Vec<_> = drawables.iter().map(|d| d.model).collect();
        self.write_transforms(&models);

        let camera = CameraUniform {
            view: scene.camera.view_matrix().to_cols_array_2d(),
            proj: scene.camera.projection_matrix().to_cols_array_2d(),
        };
        self.gpu
            .queue()
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let Some(surface) = &self.surface else {
            return Err(BackdropError::Surface(wgpu::SurfaceError::Lost));
        };

        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::warn!("Surface outdated, reconfiguring and skipping frame");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Backdrop Encoder"),
            });

        // Draw into the multisampled target and resolve into the frame
        let (target, resolve_target, store) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(&view), wgpu::StoreOp::Discard),
            None => (&view, None, wgpu::StoreOp::Store),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Backdrop Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for (slot, drawable) in drawables.iter().enumerate() {
                let (Some(geometry), Some(material)) = (
                    self.geometries.get(drawable.mesh.geometry),
                    self.materials.get(drawable.mesh.material),
                ) else {
                    continue;
                };
                if geometry.vertex_count == 0 {
                    continue;
                }

                let offset = (slot as u64 * self.transforms.stride) as u32;
                render_pass.set_bind_group(1, &self.transforms.bind_group, &[offset]);
                render_pass.set_bind_group(2, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, geometry.buffer.slice(..));

                match geometry.topology {
                    Topology::Points => {
                        render_pass.set_pipeline(&self.sprite_pipeline);
                        render_pass.draw(0..SPRITE_CORNERS, 0..geometry.vertex_count);
                    }
                    Topology::Lines => {
                        render_pass.set_pipeline(&self.line_pipeline);
                        render_pass.draw(0..geometry.vertex_count, 0..1);
                    }
                }
            }
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn dispose(&mut self) {
        for (_, geometry) in self.geometries.drain() {
            geometry.buffer.destroy();
        }
        for (_, material) in self.materials.drain() {
            material.buffer.destroy();
        }
        self.transforms.buffer.destroy();
        self.camera_buffer.destroy();
        if let Some(msaa) = self.msaa.take() {
            msaa.texture.destroy();
        }

        // Dropping the wgpu surface detaches it from the window
        self.surface = None;
    }
}
