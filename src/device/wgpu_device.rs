use std::num::NonZeroU64;
use std::ops::Range;

use ahash::{HashMap, HashMapExt};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use super::*;
use crate::util::{align_to, compute_padded_bytes_per_row};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Largest uniform block a program may declare.
const MAX_UNIFORM_BLOCK: u64 = 256;

struct WgpuProgram {
    label: String,
    kind: ProgramKind,
    layout: VertexLayout,
    fields: Vec<UniformField>,
    block: Vec<u8>,
    list_pipeline: wgpu::RenderPipeline,
    strip_pipeline: wgpu::RenderPipeline,
}

struct WgpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Work recorded between `begin_frame` and `end_frame`.
enum FrameCommand {
    Clear {
        color: [f32; 4],
        rect: Option<PixelRect>,
        uniform_offset: u32,
    },
    Draw {
        program: u64,
        buffer: u64,
        texture: Option<u64>,
        strip: bool,
        vertices: Range<u32>,
        indices: Option<Range<u32>>,
        uniform_offset: u32,
    },
}

/// Headless `wgpu` implementation of [`GpuDevice`].
///
/// Renders into an `Rgba8Unorm` texture with premultiplied alpha blending. Draw calls are
/// recorded with a snapshot of the program's uniform block and submitted as one render pass
/// on `end_frame`. Triangle fans are expanded into an index buffer since `wgpu` has no fan
/// topology.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: (u32, u32),
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    clear_pipeline: wgpu::RenderPipeline,
    uniform_slot: u64,

    next_id: u64,
    buffers: HashMap<u64, wgpu::Buffer>,
    programs: HashMap<u64, WgpuProgram>,
    textures: HashMap<u64, WgpuTexture>,
    current_program: Option<u64>,
    bound_buffer: Option<u64>,
    bound_texture: Option<u64>,

    recording: bool,
    commands: Vec<FrameCommand>,
    uniform_staging: Vec<u8>,
    fan_indices: Vec<u32>,

    readback_buffer: Option<wgpu::Buffer>,
    readback_bytes: Vec<u8>,
    stats: DeviceStats,
}

fn copy_padded_readback_rows(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    let output_size = (unpadded_bytes_per_row * height) as usize;
    output.resize(output_size, 0);

    if padded_bytes_per_row == unpadded_bytes_per_row {
        output.copy_from_slice(&data[..output_size]);
        return;
    }

    for row in 0..height {
        let padded_offset = (row * padded_bytes_per_row) as usize;
        let unpadded_offset = (row * unpadded_bytes_per_row) as usize;
        let row_data = &data[padded_offset..padded_offset + unpadded_bytes_per_row as usize];
        output[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize]
            .copy_from_slice(row_data);
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn create_target(device: &wgpu::Device, size: (u32, u32)) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("canvas_target"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn create_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("atlas_bgl"),
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
        ],
    })
}

fn create_clear_pipeline(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("clear_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/clear.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("clear_pipeline_layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("clear_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl WgpuDevice {
    /// Requests an adapter and device and allocates a `width` x `height` render target.
    pub async fn request(width: u32, height: u32) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|error| GpuError::AdapterUnavailable(error.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("canvas_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|error| GpuError::DeviceRequest(error.to_string()))?;

        info!(
            adapter = %adapter.get_info().name,
            width,
            height,
            "created wgpu device"
        );

        let size = (width.max(1), height.max(1));
        let target = create_target(&device, size);
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let uniform_layout = create_uniform_layout(&device);
        let texture_layout = create_texture_layout(&device);
        let clear_pipeline = create_clear_pipeline(&device, &uniform_layout);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let uniform_slot = align_to(
            MAX_UNIFORM_BLOCK,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );

        Ok(Self {
            device,
            queue,
            size,
            target,
            target_view,
            uniform_layout,
            texture_layout,
            sampler,
            clear_pipeline,
            uniform_slot,
            next_id: 1,
            buffers: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            current_program: None,
            bound_buffer: None,
            bound_texture: None,
            recording: false,
            commands: Vec::new(),
            uniform_staging: Vec::new(),
            fan_indices: Vec::new(),
            readback_buffer: None,
            readback_bytes: Vec::new(),
            stats: DeviceStats::default(),
        })
    }

    /// Like [`WgpuDevice::request`], but returns `None` when no adapter is available, so
    /// tests on machines without a GPU can skip.
    pub async fn try_new_headless(width: u32, height: u32) -> Option<Self> {
        match Self::request(width, height).await {
            Ok(device) => Some(device),
            Err(error) => {
                warn!("headless wgpu device unavailable: {error}");
                None
            }
        }
    }

    pub async fn new_headless(width: u32, height: u32) -> Self {
        Self::request(width, height)
            .await
            .expect("Failed to create a headless wgpu device")
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_uniforms(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.uniform_staging.len();
        self.uniform_staging.extend_from_slice(bytes);
        self.uniform_staging
            .resize(offset + self.uniform_slot as usize, 0);
        offset as u32
    }

    fn create_pipeline(
        &self,
        descriptor: &ProgramDescriptor<'_>,
        module: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        attributes: &[wgpu::VertexAttribute],
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        let label = format!("{}_{:?}_pipeline", descriptor.label, topology);
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(descriptor.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: descriptor.vertex_layout.stride as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(descriptor.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn map_readback_buffer_into(
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
        mapped_bytes: &mut Vec<u8>,
    ) -> Result<(), GpuError> {
        mapped_bytes.clear();

        let buffer_slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            if sender.send(result).is_err() {
                warn!("Failed to send map_async result from callback");
            }
        });

        if let Err(error) = device.poll(wgpu::PollType::Wait) {
            warn!("Device poll failed during readback: {error}");
        }

        receiver
            .recv()
            .map_err(|error| GpuError::Readback(error.to_string()))?
            .map_err(|error| GpuError::Readback(error.to_string()))?;

        let mapped_range = buffer_slice.get_mapped_range();
        mapped_bytes.extend_from_slice(&mapped_range);
        drop(mapped_range);
        buffer.unmap();
        Ok(())
    }
}

impl GpuDevice for WgpuDevice {
    fn viewport(&self) -> (u32, u32) {
        self.size
    }

    fn create_vertex_buffer(
        &mut self,
        label: Option<&str>,
        contents: &[u8],
    ) -> Result<BufferHandle, GpuError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = self.allocate_id();
        self.buffers.insert(id, buffer);
        self.stats.buffers_created += 1;
        Ok(BufferHandle(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(removed) = self.buffers.remove(&buffer.0) {
            removed.destroy();
            self.stats.buffers_destroyed += 1;
        }
        if self.bound_buffer == Some(buffer.0) {
            self.bound_buffer = None;
        }
    }

    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor<'_>,
    ) -> Result<ProgramHandle, GpuError> {
        if descriptor.uniform_block_size as u64 > MAX_UNIFORM_BLOCK {
            return Err(GpuError::ProgramCreation {
                label: descriptor.label.to_string(),
                message: format!(
                    "uniform block of {} bytes exceeds {MAX_UNIFORM_BLOCK}",
                    descriptor.uniform_block_size
                ),
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.label),
                source: wgpu::ShaderSource::Wgsl(descriptor.source.into()),
            });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = match descriptor.kind {
            ProgramKind::Solid => vec![&self.uniform_layout],
            ProgramKind::Glyph => vec![&self.uniform_layout, &self.texture_layout],
        };
        let layout_label = format!("{}_layout", descriptor.label);
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&layout_label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let attributes: Vec<wgpu::VertexAttribute> = descriptor
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| wgpu::VertexAttribute {
                format: vertex_format(attribute.components),
                offset: attribute.offset as wgpu::BufferAddress,
                shader_location: attribute.location,
            })
            .collect();

        let list_pipeline = self.create_pipeline(
            descriptor,
            &module,
            &layout,
            &attributes,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let strip_pipeline = self.create_pipeline(
            descriptor,
            &module,
            &layout,
            &attributes,
            wgpu::PrimitiveTopology::TriangleStrip,
        );

        if let Some(error) = futures::executor::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::ProgramCreation {
                label: descriptor.label.to_string(),
                message: error.to_string(),
            });
        }

        let id = self.allocate_id();
        self.programs.insert(
            id,
            WgpuProgram {
                label: descriptor.label.to_string(),
                kind: descriptor.kind,
                layout: descriptor.vertex_layout,
                fields: descriptor.uniforms.to_vec(),
                block: vec![0; descriptor.uniform_block_size as usize],
                list_pipeline,
                strip_pipeline,
            },
        );
        self.stats.programs_created += 1;
        debug!(label = descriptor.label, "created wgpu program");
        Ok(ProgramHandle(id))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
        if self.current_program == Some(program.0) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), GpuError> {
        if !self.programs.contains_key(&program.0) {
            return Err(GpuError::UnknownProgram(program));
        }
        self.current_program = Some(program.0);
        Ok(())
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), GpuError> {
        let state = self
            .programs
            .get_mut(&program.0)
            .ok_or(GpuError::UnknownProgram(program))?;
        let Some(field) = state
            .fields
            .iter()
            .find(|field| field.name == name && field.kind == value.kind())
        else {
            return Err(GpuError::Uniform {
                program: state.label.clone(),
                name: name.to_string(),
                expected: value.kind().name(),
            });
        };
        let bytes = value.to_bytes();
        let start = field.offset as usize;
        state.block[start..start + bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, GpuError> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(GpuError::TextureData {
                expected,
                actual: rgba.len(),
            });
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("font_atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("font_atlas_bind_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = self.allocate_id();
        self.textures.insert(
            id,
            WgpuTexture {
                _texture: texture,
                bind_group,
            },
        );
        self.stats.textures_created += 1;
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
        if self.bound_texture == Some(texture.0) {
            self.bound_texture = None;
        }
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) -> Result<(), GpuError> {
        if let Some(texture) = texture {
            if !self.textures.contains_key(&texture.0) {
                return Err(GpuError::UnknownTexture(texture));
            }
        }
        self.bound_texture = texture.map(|texture| texture.0);
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) -> Result<(), GpuError> {
        if !self.buffers.contains_key(&buffer.0) {
            return Err(GpuError::UnknownBuffer(buffer));
        }
        self.bound_buffer = Some(buffer.0);
        Ok(())
    }

    fn unbind_vertex_buffer(&mut self) {
        self.bound_buffer = None;
    }

    fn begin_frame(&mut self) -> Result<(), GpuError> {
        self.commands.clear();
        self.uniform_staging.clear();
        self.fan_indices.clear();
        self.recording = true;
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4], rect: Option<PixelRect>) -> Result<(), GpuError> {
        if !self.recording {
            return Err(GpuError::NotRecording("clear"));
        }
        let color = premultiply(color);
        let uniform_offset = self.push_uniforms(bytemuck::cast_slice(&color));
        self.commands.push(FrameCommand::Clear {
            color,
            rect,
            uniform_offset,
        });
        self.stats.clears += 1;
        Ok(())
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) -> Result<(), GpuError> {
        if !self.recording {
            return Err(GpuError::NotRecording("draw"));
        }
        let program_id = self.current_program.ok_or(GpuError::NoProgram)?;
        let buffer_id = self.bound_buffer.ok_or(GpuError::NoVertexBuffer)?;
        let program = self
            .programs
            .get(&program_id)
            .ok_or(GpuError::UnknownProgram(ProgramHandle(program_id)))?;
        let buffer = self
            .buffers
            .get(&buffer_id)
            .ok_or(GpuError::UnknownBuffer(BufferHandle(buffer_id)))?;

        let available = (buffer.size() / program.layout.stride as u64) as u32;
        if first as u64 + count as u64 > available as u64 {
            return Err(GpuError::DrawOutOfRange {
                first,
                count,
                available,
            });
        }
        let texture = match program.kind {
            ProgramKind::Solid => None,
            ProgramKind::Glyph => Some(
                self.bound_texture
                    .ok_or_else(|| GpuError::NoTexture(program.label.clone()))?,
            ),
        };

        let block = program.block.clone();
        let uniform_offset = self.push_uniforms(&block);

        let indices = match topology {
            Topology::TriangleFan => {
                let start = self.fan_indices.len() as u32;
                for triangle in 0..topology.triangle_count(count as usize) as u32 {
                    self.fan_indices
                        .extend([first, first + triangle + 1, first + triangle + 2]);
                }
                Some(start..self.fan_indices.len() as u32)
            }
            _ => None,
        };

        self.commands.push(FrameCommand::Draw {
            program: program_id,
            buffer: buffer_id,
            texture,
            strip: topology == Topology::TriangleStrip,
            vertices: first..first + count,
            indices,
            uniform_offset,
        });
        self.stats.draw_calls += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        if !self.recording {
            return Err(GpuError::NotRecording("end_frame"));
        }
        self.recording = false;

        let commands = std::mem::take(&mut self.commands);
        if self.uniform_staging.is_empty() {
            self.uniform_staging.resize(self.uniform_slot as usize, 0);
        }
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("frame_uniforms"),
                contents: &self.uniform_staging,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_uniforms_bind_group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(MAX_UNIFORM_BLOCK),
                }),
            }],
        });
        let index_buffer = (!self.fan_indices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("fan_indices"),
                    contents: bytemuck::cast_slice(&self.fan_indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        let (width, height) = self.size;
        let (load, skip) = match commands.first() {
            Some(FrameCommand::Clear { color, rect, .. })
                if rect.map_or(true, |rect| rect.covers(self.size)) =>
            {
                let [r, g, b, a] = color.map(|channel| channel as f64);
                (wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }), 1)
            }
            _ => (wgpu::LoadOp::Load, 0),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("canvas_frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("canvas_frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for command in &commands[skip..] {
                match command {
                    FrameCommand::Clear {
                        rect,
                        uniform_offset,
                        ..
                    } => {
                        let rect = rect.unwrap_or(PixelRect {
                            x: 0,
                            y: 0,
                            width,
                            height,
                        });
                        if rect.width == 0 || rect.height == 0 {
                            continue;
                        }
                        pass.set_pipeline(&self.clear_pipeline);
                        pass.set_bind_group(0, &uniform_bind_group, &[*uniform_offset]);
                        pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
                        pass.draw(0..3, 0..1);
                        pass.set_scissor_rect(0, 0, width, height);
                    }
                    FrameCommand::Draw {
                        program,
                        buffer,
                        texture,
                        strip,
                        vertices,
                        indices,
                        uniform_offset,
                    } => {
                        let program = self
                            .programs
                            .get(program)
                            .ok_or(GpuError::UnknownProgram(ProgramHandle(*program)))?;
                        let buffer = self
                            .buffers
                            .get(buffer)
                            .ok_or(GpuError::UnknownBuffer(BufferHandle(*buffer)))?;

                        pass.set_pipeline(if *strip {
                            &program.strip_pipeline
                        } else {
                            &program.list_pipeline
                        });
                        pass.set_bind_group(0, &uniform_bind_group, &[*uniform_offset]);
                        if let Some(texture) = texture {
                            let texture = self
                                .textures
                                .get(texture)
                                .ok_or(GpuError::UnknownTexture(TextureHandle(*texture)))?;
                            pass.set_bind_group(1, &texture.bind_group, &[]);
                        }
                        pass.set_vertex_buffer(0, buffer.slice(..));
                        match (indices, &index_buffer) {
                            (Some(indices), Some(index_buffer)) => {
                                pass.set_index_buffer(
                                    index_buffer.slice(..),
                                    wgpu::IndexFormat::Uint32,
                                );
                                pass.draw_indexed(indices.clone(), 0, 0..1);
                            }
                            _ => pass.draw(vertices.clone(), 0..1),
                        }
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.stats.frames += 1;
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<Vec<u8>, GpuError> {
        let (width, height) = self.size;
        let (unpadded_bytes_per_row, padded_bytes_per_row) = compute_padded_bytes_per_row(width, 4);
        let buffer_size = (padded_bytes_per_row * height) as u64;

        let needs_buffer = self
            .readback_buffer
            .as_ref()
            .map_or(true, |existing| existing.size() < buffer_size);
        if needs_buffer {
            self.readback_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("canvas_readback_buffer"),
                size: buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }));
        }
        let Some(output_buffer) = self.readback_buffer.as_ref() else {
            return Err(GpuError::Readback("no readback buffer".into()));
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("copy_texture_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut readback_bytes = std::mem::take(&mut self.readback_bytes);
        let mapped = Self::map_readback_buffer_into(&self.device, output_buffer, &mut readback_bytes);
        let result = mapped.and_then(|()| {
            let required = (height as usize) * (padded_bytes_per_row as usize);
            if readback_bytes.len() < required {
                return Err(GpuError::Readback(format!(
                    "mapped {} bytes, expected {required}",
                    readback_bytes.len()
                )));
            }
            let mut pixels = Vec::new();
            copy_padded_readback_rows(
                &readback_bytes,
                height,
                unpadded_bytes_per_row,
                padded_bytes_per_row,
                &mut pixels,
            );
            Ok(pixels)
        });
        self.readback_bytes = readback_bytes;
        result
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }
}
