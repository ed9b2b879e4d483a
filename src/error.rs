use thiserror::Error;

use crate::device::GpuError;
use crate::shader::ShaderCompileError;
use crate::text::FontError;

/// Errors produced by parsing a `fillStyle`/`strokeStyle` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("empty color string")]
    Empty,
    #[error("unsupported color syntax: `{0}`")]
    Unsupported(String),
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
    #[error("color component {component} out of range in `{input}`")]
    ComponentOutOfRange { input: String, component: u32 },
}

/// The error type returned by canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A geometric argument was outside its domain, e.g. a negative arc radius.
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    ColorParse(#[from] ColorParseError),
    #[error(transparent)]
    ShaderCompile(#[from] ShaderCompileError),
    /// The program failed to compile earlier and cannot be bound.
    #[error("shader program `{0}` is not usable")]
    InvalidProgram(String),
    #[error("program `{program}` has no uniform named `{name}`")]
    UnknownUniform { program: String, name: String },
    #[error("uniform `{name}` of program `{program}` expects {expected}")]
    UniformTypeMismatch {
        program: String,
        name: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("font atlas {texture_width}x{texture_height} cannot hold {glyphs} cells of {cell_width}x{cell_height}")]
    AtlasTooSmall {
        texture_width: u32,
        texture_height: u32,
        cell_width: u32,
        cell_height: u32,
        glyphs: u32,
    },
    #[error("device viewport {actual:?} does not match configured size {expected:?}")]
    ViewportMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}
