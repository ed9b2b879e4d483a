//! The immediate-mode GPU interface the canvas is emulated on.
//!
//! [`GpuDevice`] only knows vertex buffers, shader programs with named uniforms, 2D textures,
//! clears and primitive draw calls. Two implementations ship with the crate:
//! [`WgpuDevice`] renders headlessly through `wgpu`, [`SoftwareDevice`] rasterizes on the CPU
//! and needs no adapter.

use std::fmt;

use thiserror::Error;

pub use crate::tessellator::Topology;
use crate::vertex::VertexLayout;

mod software;
mod wgpu_device;

pub use software::SoftwareDevice;
pub use wgpu_device::WgpuDevice;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle!(
    /// Opaque id of a vertex buffer owned by a device.
    BufferHandle
);
handle!(
    /// Opaque id of a linked shader program owned by a device.
    ProgramHandle
);
handle!(
    /// Opaque id of a 2D RGBA texture owned by a device.
    TextureHandle
);

/// The fragment behaviors a program can have. Devices that cannot run WGSL (the software
/// rasterizer) emulate programs by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// `tint * alpha`, premultiplied.
    Solid,
    /// Atlas coverage from texture unit 0 multiplied by `tint * alpha`.
    Glyph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Float,
}

impl UniformKind {
    pub fn size(&self) -> u32 {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec3 => 12,
            UniformKind::Float => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UniformKind::Mat4 => "mat4x4<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Float => "f32",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4([[f32; 4]; 4]),
    Vec3([f32; 3]),
    Float(f32),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Float(_) => UniformKind::Float,
        }
    }

    /// Bytes as laid out in a uniform block.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Mat4(columns) => bytemuck::cast_slice(columns).to_vec(),
            UniformValue::Vec3(vector) => bytemuck::cast_slice(vector).to_vec(),
            UniformValue::Float(value) => value.to_ne_bytes().to_vec(),
        }
    }
}

/// One member of a program's uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// Everything a device needs to link a program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub kind: ProgramKind,
    /// WGSL source with `vertex_entry` and `fragment_entry`.
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub vertex_layout: VertexLayout,
    pub uniforms: &'a [UniformField],
    /// Size in bytes of the uniform block, already padded.
    pub uniform_block_size: u32,
}

impl ProgramDescriptor<'_> {
    pub fn uniform(&self, name: &str) -> Option<&UniformField> {
        self.uniforms.iter().find(|field| field.name == name)
    }
}

/// A rectangle in device pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Clamps a floating point rectangle to the viewport, rounding outwards to whole pixels.
    /// Returns `None` when nothing of it is visible.
    pub fn clamped(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        viewport: (u32, u32),
    ) -> Option<Self> {
        let left = x.min(x + width).floor().max(0.0);
        let top = y.min(y + height).floor().max(0.0);
        let right = x.max(x + width).ceil().min(viewport.0 as f32);
        let bottom = y.max(y + height).ceil().min(viewport.1 as f32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    pub fn covers(&self, viewport: (u32, u32)) -> bool {
        self.x == 0 && self.y == 0 && self.width >= viewport.0 && self.height >= viewport.1
    }
}

/// Counters a device keeps about the work it was asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub frames: u64,
    pub draw_calls: u64,
    pub clears: u64,
    pub buffers_created: u64,
    pub buffers_destroyed: u64,
    pub programs_created: u64,
    pub textures_created: u64,
}

impl DeviceStats {
    pub fn live_buffers(&self) -> u64 {
        self.buffers_created - self.buffers_destroyed
    }
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    AdapterUnavailable(String),
    #[error("failed to request a GPU device: {0}")]
    DeviceRequest(String),
    #[error("unknown buffer {0}")]
    UnknownBuffer(BufferHandle),
    #[error("unknown program {0}")]
    UnknownProgram(ProgramHandle),
    #[error("unknown texture {0}")]
    UnknownTexture(TextureHandle),
    #[error("no program is in use")]
    NoProgram,
    #[error("no vertex buffer is bound")]
    NoVertexBuffer,
    #[error("program `{0}` samples a texture but none is bound")]
    NoTexture(String),
    #[error("draw of {count} vertices from {first} exceeds the {available} in the buffer")]
    DrawOutOfRange {
        first: u32,
        count: u32,
        available: u32,
    },
    #[error("`{0}` called outside of begin_frame/end_frame")]
    NotRecording(&'static str),
    #[error("program `{program}` has no uniform `{name}` of type {expected}")]
    Uniform {
        program: String,
        name: String,
        expected: &'static str,
    },
    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureData { expected: usize, actual: usize },
    #[error("failed to create program `{label}`: {message}")]
    ProgramCreation { label: String, message: String },
    #[error("framebuffer readback failed: {0}")]
    Readback(String),
}

/// Immediate-mode GPU interface. All methods take `&mut self`: a device is single-owner state
/// and is never shared between threads.
pub trait GpuDevice {
    /// Viewport size in device pixels.
    fn viewport(&self) -> (u32, u32);

    fn create_vertex_buffer(
        &mut self,
        label: Option<&str>,
        contents: &[u8],
    ) -> Result<BufferHandle, GpuError>;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor<'_>,
    ) -> Result<ProgramHandle, GpuError>;

    fn destroy_program(&mut self, program: ProgramHandle);

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), GpuError>;

    /// Stores a uniform value in the program. Values persist across draws until overwritten.
    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), GpuError>;

    /// Creates an RGBA8 texture from premultiplied, tightly packed rows.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, GpuError>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    fn bind_texture(&mut self, texture: Option<TextureHandle>) -> Result<(), GpuError>;

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) -> Result<(), GpuError>;

    fn unbind_vertex_buffer(&mut self);

    fn begin_frame(&mut self) -> Result<(), GpuError>;

    /// Clears the color buffer, or only `rect` of it, to a straight-alpha color.
    fn clear(&mut self, color: [f32; 4], rect: Option<PixelRect>) -> Result<(), GpuError>;

    /// Draws `count` vertices starting at `first` from the bound buffer with the program in use.
    fn draw(&mut self, topology: Topology, first: u32, count: u32) -> Result<(), GpuError>;

    fn end_frame(&mut self) -> Result<(), GpuError>;

    /// Reads back the framebuffer as premultiplied RGBA8, top row first.
    fn read_pixels(&mut self) -> Result<Vec<u8>, GpuError>;

    fn stats(&self) -> DeviceStats;
}

/// Column-major `a * b`.
pub(crate) fn multiply_mat4(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (column, out_column) in out.iter_mut().enumerate() {
        for (row, value) in out_column.iter_mut().enumerate() {
            *value = (0..4).map(|k| a[k][row] * b[column][k]).sum();
        }
    }
    out
}

pub(crate) fn premultiply(color: [f32; 4]) -> [f32; 4] {
    let [r, g, b, a] = color.map(|channel| channel.clamp(0.0, 1.0));
    [r * a, g * a, b * a, a]
}
