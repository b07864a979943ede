//! WGPU implementation of [`RenderBackend`]
//!
//! Draw calls are recorded rather than executed: each one snapshots the bound
//! program's uniform block into a dynamic uniform buffer and remembers its
//! pipeline variant, textures and stencil reference. `present` encodes the
//! main pass into the surface; `read_stencil_pixel` encodes the picking pass
//! into the depth-stencil texture and copies one stencil texel back.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use log::{debug, error, info, warn};
use wgpu::util::DeviceExt;

use crate::error::{ViewerError, ViewerResult};
use crate::gfx::backend::{GeometryId, ProgramId, RenderBackend, TextureId, TextureKind, TEXTURE_SLOTS};
use crate::gfx::resources::texture_resource::{TextureResource, TextureSource};
use crate::gfx::scene::vertex::Vertex3D;
use crate::gfx::shader::{ShaderKind, UniformLayout, UniformLocation, UniformValue};
use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, DynamicUniformBuffer,
    UniformStaging,
};

use super::pipeline_manager::{PassKind, PipelineKey, PipelineManager};

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Bytes per row of the stencil readback copy
const READBACK_ROW: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

struct GpuProgram {
    kind: ShaderKind,
    layout: UniformLayout,
    block: Vec<u8>,
    bind_group_layout: BindGroupLayoutWithDesc,
}

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

struct GpuTexture {
    kind: TextureKind,
    resource: TextureResource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BindGroupKey {
    program: ProgramId,
    textures: [Option<TextureId>; TEXTURE_SLOTS],
}

#[derive(Debug, Clone, Copy)]
struct DrawCommand {
    pipeline: PipelineKey,
    geometry: GeometryId,
    bind_group: BindGroupKey,
    uniform_offset: u32,
    stencil_reference: u32,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    sampler: wgpu::Sampler,
    default_flat: TextureResource,
    default_cube: TextureResource,

    programs: Vec<Option<GpuProgram>>,
    geometries: Vec<GpuGeometry>,
    textures: Vec<GpuTexture>,

    current: Option<usize>,
    bound: [Option<TextureId>; TEXTURE_SLOTS],
    depth_write: bool,
    stencil_write: bool,
    stencil_reference: u32,
    picking: bool,

    staging: UniformStaging,
    uniform_buffer: DynamicUniformBuffer,
    bind_groups: HashMap<BindGroupKey, wgpu::BindGroup>,
    main_draws: Vec<DrawCommand>,
    picking_draws: Vec<DrawCommand>,
    readback: wgpu::Buffer,
}

impl WgpuBackend {
    /// Creates the surface, device and shared resources for `window`
    pub async fn new(window: impl Into<wgpu::SurfaceTarget<'static>>, width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).context("failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to request adapter")?;
        info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to request device")?;

        // Validation errors are logged instead of panicking
        device.on_uncaptured_error(Box::new(|e| error!("wgpu: {}", e)));

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "Depth Stencil Texture");
        let sampler = TextureResource::create_sampler(&device);
        let white = TextureSource::white();
        let default_flat = TextureResource::create_from_source(&device, &queue, &white, "Default Texture");
        let faces: [TextureSource; 6] = std::array::from_fn(|_| TextureSource::white());
        let default_cube = TextureResource::create_cube_from_sources(&device, &queue, &faces, "Default Cube Texture");

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let uniform_buffer = DynamicUniformBuffer::new(&device, "Draw Uniforms");
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Stencil Readback"),
            size: READBACK_ROW as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let pipeline_manager = PipelineManager::new(device.clone(), format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipeline_manager,
            sampler,
            default_flat,
            default_cube,
            programs: Vec::new(),
            geometries: Vec::new(),
            textures: Vec::new(),
            current: None,
            bound: [None; TEXTURE_SLOTS],
            depth_write: true,
            stencil_write: true,
            stencil_reference: 0,
            picking: false,
            staging: UniformStaging::new(alignment),
            uniform_buffer,
            bind_groups: HashMap::new(),
            main_draws: Vec::new(),
            picking_draws: Vec::new(),
            readback,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureResource::create_depth_texture(&self.device, &self.config, "Depth Stencil Texture");
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn program(&self, program: ProgramId) -> Option<&GpuProgram> {
        program.index().and_then(|i| self.programs.get(i)).and_then(Option::as_ref)
    }

    fn current_program_mut(&mut self) -> Option<&mut GpuProgram> {
        self.current.and_then(|i| self.programs.get_mut(i)).and_then(Option::as_mut)
    }

    fn create_bind_group_layout(&self, kind: ShaderKind, uniform_size: u64) -> BindGroupLayoutWithDesc {
        let mut builder = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic(uniform_size))
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering));
        for slot in kind.texture_slots() {
            builder = builder.next_binding_fragment(match slot {
                TextureKind::Flat => binding_types::texture_2d(),
                TextureKind::Cube => binding_types::texture_cube(),
            });
        }
        builder.create(&self.device, &format!("{} Bind Group Layout", kind.label()))
    }

    /// Uploads the uniform snapshots; rebuilds bind groups if the buffer moved
    fn flush_uniforms(&mut self) {
        if self.uniform_buffer.upload(&self.device, &self.queue, &self.staging) {
            debug!("Uniform buffer grew, generation {}", self.uniform_buffer.generation());
            self.bind_groups.clear();
        }
    }

    fn prepare_bind_groups(&mut self, draws: &[DrawCommand]) {
        for draw in draws {
            if self.bind_groups.contains_key(&draw.bind_group) {
                continue;
            }
            let Some(program) = self.program(draw.bind_group.program) else {
                continue;
            };

            let mut builder = BindGroupBuilder::new(&program.bind_group_layout)
                .buffer_window(self.uniform_buffer.buffer(), program.layout.size() as u64)
                .sampler(&self.sampler);
            for (slot, kind) in program.kind.texture_slots().iter().enumerate() {
                let texture = draw.bind_group.textures[slot]
                    .and_then(|id| self.textures.get(id.0 as usize))
                    .filter(|texture| texture.kind == *kind);
                let view = match (texture, kind) {
                    (Some(texture), _) => &texture.resource.view,
                    (None, TextureKind::Flat) => &self.default_flat.view,
                    (None, TextureKind::Cube) => &self.default_cube.view,
                };
                builder = builder.texture(view);
            }
            let group = builder.create(&self.device, &format!("{} Bind Group", program.kind.label()));
            self.bind_groups.insert(draw.bind_group, group);
        }
    }

    fn encode_draws(&mut self, pass: &mut wgpu::RenderPass, draws: &[DrawCommand]) {
        for draw in draws {
            let Some(geometry) = self.geometries.get(draw.geometry.0 as usize) else {
                continue;
            };
            let Some(group) = self.bind_groups.get(&draw.bind_group) else {
                continue;
            };
            let Some(pipeline) = self.pipeline_manager.get_pipeline(draw.pipeline) else {
                continue;
            };
            if geometry.count == 0 {
                continue;
            }

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, group, &[draw.uniform_offset]);
            pass.set_stencil_reference(draw.stencil_reference);
            pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            match &geometry.index_buffer {
                Some(indices) => {
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..geometry.count, 0, 0..1);
                }
                None => pass.draw(0..geometry.count, 0..1),
            }
        }
    }

    /// Depth cleared to the far plane, stencil cleared to "no object"
    fn depth_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(0),
                store: wgpu::StoreOp::Store,
            }),
        }
    }

    fn compile_module(&self, kind: ShaderKind, source: &str) -> ViewerResult<wgpu::ShaderModule> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(e) => Err(ViewerError::ShaderCompile {
                label: kind.label().to_string(),
                message: e.to_string(),
            }),
            None => Ok(module),
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn create_program(&mut self, kind: ShaderKind, source: &str) -> ViewerResult<ProgramId> {
        let module = self.compile_module(kind, source)?;
        let layout = kind.uniform_layout();
        let bind_group_layout = self.create_bind_group_layout(kind, layout.size() as u64);

        let id = ProgramId::from_index(self.programs.len());
        self.pipeline_manager
            .register_program(id, kind.label(), module, &bind_group_layout.layout);
        self.programs.push(Some(GpuProgram {
            kind,
            block: vec![0; layout.size() as usize],
            layout,
            bind_group_layout,
        }));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(slot) = program.index().and_then(|i| self.programs.get_mut(i)) {
            *slot = None;
        }
        if self.current == program.index() {
            self.current = None;
        }
        self.pipeline_manager.remove_program(program);
        self.bind_groups.retain(|key, _| key.program != program);
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        self.program(program)
            .map(|p| p.layout.location(name))
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = self.program(program).and(program.index());
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        if let Some(program) = self.current_program_mut() {
            program.layout.write(&mut program.block, location, &value);
        }
    }

    fn upload_geometry(&mut self, label: &str, vertices: &[Vertex3D], indices: Option<&[u32]>) -> GeometryId {
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = indices.map(|indices| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", label)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let count = indices.map_or(vertices.len(), <[u32]>::len) as u32;

        self.geometries.push(GpuGeometry {
            vertex_buffer,
            index_buffer,
            count,
        });
        GeometryId(self.geometries.len() as u32 - 1)
    }

    fn upload_texture(&mut self, label: &str, source: &TextureSource) -> TextureId {
        let resource = TextureResource::create_from_source(&self.device, &self.queue, source, label);
        self.textures.push(GpuTexture {
            kind: TextureKind::Flat,
            resource,
        });
        TextureId(self.textures.len() as u32 - 1)
    }

    fn upload_cube_texture(&mut self, label: &str, faces: &[TextureSource; 6]) -> TextureId {
        let resource = TextureResource::create_cube_from_sources(&self.device, &self.queue, faces, label);
        self.textures.push(GpuTexture {
            kind: TextureKind::Cube,
            resource,
        });
        TextureId(self.textures.len() as u32 - 1)
    }

    fn bind_texture(&mut self, slot: usize, texture: Option<TextureId>) {
        if let Some(bound) = self.bound.get_mut(slot) {
            *bound = texture;
        }
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_stencil_write(&mut self, enabled: bool) {
        self.stencil_write = enabled;
    }

    fn set_stencil_reference(&mut self, reference: u32) {
        self.stencil_reference = reference;
    }

    fn draw(&mut self, geometry: GeometryId) {
        let Some(index) = self.current else {
            return;
        };
        let program_id = ProgramId::from_index(index);
        let pass = if self.picking { PassKind::Picking } else { PassKind::Main };
        let bound = self.bound;
        let Some(program) = self.programs.get(index).and_then(Option::as_ref) else {
            return;
        };

        let mut textures = [None; TEXTURE_SLOTS];
        let used = program.kind.texture_slots().len();
        textures[..used].copy_from_slice(&bound[..used]);

        let uniform_offset = self.staging.push(&program.block);
        let command = DrawCommand {
            pipeline: PipelineKey {
                program: program_id,
                depth_write: self.depth_write,
                stencil_write: self.stencil_write && pass == PassKind::Picking,
                pass,
            },
            geometry,
            bind_group: BindGroupKey {
                program: program_id,
                textures,
            },
            uniform_offset,
            stencil_reference: self.stencil_reference,
        };
        match pass {
            PassKind::Main => self.main_draws.push(command),
            PassKind::Picking => self.picking_draws.push(command),
        }
    }

    fn begin_picking_pass(&mut self) {
        self.picking = true;
        self.picking_draws.clear();
    }

    fn read_stencil_pixel(&mut self, x: u32, y: u32) -> u8 {
        self.picking = false;
        let draws = std::mem::take(&mut self.picking_draws);
        let (width, height) = self.surface_size();
        if x >= width || y >= height {
            warn!("Pick at ({}, {}) is outside the {}x{} surface", x, y, width, height);
            return 0;
        }

        self.flush_uniforms();
        self.prepare_bind_groups(&draws);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Picking Encoder"),
        });
        {
            let depth_view = self.depth_texture.view.clone();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Picking Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(Self::depth_attachment(&depth_view)),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.encode_draws(&mut pass, &draws);
        }

        // Texture rows run top to bottom
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.depth_texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x,
                    y: height - 1 - y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::StencilOnly,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::MaintainBase::Wait);

        let value = match futures::executor::block_on(rx) {
            Ok(Ok(())) => {
                let value = slice.get_mapped_range()[0];
                self.readback.unmap();
                value
            }
            _ => {
                error!("Failed to read back the stencil buffer");
                0
            }
        };
        debug!("Stencil at ({}, {}) = {}", x, y, value);
        value
    }

    fn present(&mut self) {
        let draws = std::mem::take(&mut self.main_draws);
        self.flush_uniforms();
        self.prepare_bind_groups(&draws);
        self.staging.clear();

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                warn!("Skipping frame: {}", e);
                return;
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let depth_view = self.depth_texture.view.clone();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(Self::depth_attachment(&depth_view)),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.encode_draws(&mut pass, &draws);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        let _ = self.device.poll(wgpu::MaintainBase::Wait);
    }
}
