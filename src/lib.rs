//! A retained-mode 2D canvas emulated on an immediate-mode GPU interface.
//!
//! Drawing calls are tessellated into triangle meshes, uploaded once and retained in an
//! insertion-ordered display list that is replayed on every redraw. See [`Canvas`].

pub use lyon::math::Point;
pub use wgpu;

mod buffer;
mod canvas;
mod color;
mod config;
mod device;
mod error;
mod path;
mod shader;
mod stroke;
mod tessellator;
mod text;
mod transform;
mod util;
mod vertex;

pub use buffer::{BoundMesh, GpuMesh};
pub use canvas::{Canvas, Drawable, Material};
pub use color::Color;
pub use config::{AtlasConfig, CanvasConfig, ClearRectMode, ATLAS_GLYPH_COUNT};
pub use device::{
    BufferHandle, DeviceStats, GpuDevice, GpuError, PixelRect, ProgramDescriptor, ProgramHandle,
    ProgramKind, SoftwareDevice, TextureHandle, UniformField, UniformKind, UniformValue,
    WgpuDevice,
};
pub use error::{CanvasError, ColorParseError};
pub use path::{Path, Subpath};
pub use shader::{ShaderCompileError, ShaderProgram, GLYPH_SHADER, PRIMITIVE_SHADER};
pub use stroke::Stroke;
pub use tessellator::{tessellate_path, Mesh, Paint, Shape, Topology};
pub use text::{
    cell_index, layout_text, FontError, FontFace, FontLoader, FontdueFace, FontdueLoader,
    GlyphAtlas, GlyphBitmap, GlyphMetrics, TextLayout, TextRenderer, TextRun, TextState,
    FIRST_ATLAS_CHAR, LAST_ATLAS_CHAR,
};
pub use transform::Transform;
pub use vertex::{GlyphVertex, PrimitiveVertex, Vertex, VertexAttribute, VertexLayout};
