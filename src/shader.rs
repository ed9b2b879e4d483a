//! Shader programs: compile, link against a vertex layout, and set uniforms by name.
//!
//! WGSL sources are parsed and validated with `naga` before they reach the device, which gives
//! us the uniform block layout (names, offsets, types) and the vertex inputs for free. A program
//! that fails any step is kept around as an *invalid* program: the failure is logged and
//! [`ShaderProgram::bind`] refuses it.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, ScalarKind, ShaderStage, TypeInner, VectorSize};
use thiserror::Error;
use tracing::{debug, error};

use crate::device::{
    GpuDevice, ProgramDescriptor, ProgramHandle, ProgramKind, UniformField, UniformKind,
    UniformValue,
};
use crate::error::CanvasError;
use crate::vertex::{GlyphVertex, PrimitiveVertex, Vertex, VertexLayout};
use crate::{Color, Transform};

pub const PRIMITIVE_SHADER: &str = include_str!("shaders/primitive.wgsl");
pub const GLYPH_SHADER: &str = include_str!("shaders/glyph.wgsl");

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderCompileError {
    #[error("failed to parse `{label}`: {message}")]
    Parse { label: String, message: String },
    #[error("`{label}` failed validation: {message}")]
    Validation { label: String, message: String },
    #[error("`{label}` cannot be linked: {message}")]
    Link { label: String, message: String },
    #[error("device rejected `{label}`: {message}")]
    Device { label: String, message: String },
}

/// What `naga` told us about a program.
#[derive(Debug, Default)]
struct Reflection {
    uniforms: Vec<UniformField>,
    uniform_block_size: u32,
    /// Vertex inputs as `(name, location)`.
    inputs: Vec<(String, u32)>,
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar.kind == ScalarKind::Float && scalar.width == 4 => Some(UniformKind::Mat4),
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar,
        } if scalar.kind == ScalarKind::Float && scalar.width == 4 => Some(UniformKind::Vec3),
        TypeInner::Scalar(scalar) if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(UniformKind::Float)
        }
        _ => None,
    }
}

fn reflect(label: &str, source: &str) -> Result<Reflection, ShaderCompileError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|error| ShaderCompileError::Parse {
        label: label.to_string(),
        message: error.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|error| ShaderCompileError::Validation {
            label: label.to_string(),
            message: error.to_string(),
        })?;

    let link_error = |message: String| ShaderCompileError::Link {
        label: label.to_string(),
        message,
    };

    let mut reflection = Reflection::default();

    let block = module.global_variables.iter().find(|(_, variable)| {
        variable.space == AddressSpace::Uniform
            && variable
                .binding
                .as_ref()
                .is_some_and(|binding| binding.group == 0 && binding.binding == 0)
    });
    if let Some((_, variable)) = block {
        let TypeInner::Struct { members, span } = &module.types[variable.ty].inner else {
            return Err(link_error("uniform block at @group(0) @binding(0) is not a struct".into()));
        };
        reflection.uniform_block_size = *span;
        for member in members {
            let name = member.name.clone().unwrap_or_default();
            let kind = uniform_kind(&module.types[member.ty].inner).ok_or_else(|| {
                link_error(format!("uniform `{name}` has an unsupported type"))
            })?;
            reflection.uniforms.push(UniformField {
                name,
                offset: member.offset,
                kind,
            });
        }
    }

    let vertex = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == ShaderStage::Vertex && entry.name == VERTEX_ENTRY)
        .ok_or_else(|| link_error(format!("missing vertex entry point `{VERTEX_ENTRY}`")))?;
    if !module
        .entry_points
        .iter()
        .any(|entry| entry.stage == ShaderStage::Fragment && entry.name == FRAGMENT_ENTRY)
    {
        return Err(link_error(format!(
            "missing fragment entry point `{FRAGMENT_ENTRY}`"
        )));
    }

    for argument in &vertex.function.arguments {
        match &argument.binding {
            Some(Binding::Location { location, .. }) => reflection
                .inputs
                .push((argument.name.clone().unwrap_or_default(), *location)),
            Some(Binding::BuiltIn(_)) => {}
            None => {
                if let TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    for member in members {
                        if let Some(Binding::Location { location, .. }) = &member.binding {
                            reflection
                                .inputs
                                .push((member.name.clone().unwrap_or_default(), *location));
                        }
                    }
                }
            }
        }
    }

    Ok(reflection)
}

/// Every vertex input must be fed by the attribute of the same name at the same location.
fn link(
    label: &str,
    inputs: &[(String, u32)],
    layout: &VertexLayout,
) -> Result<(), ShaderCompileError> {
    for (name, location) in inputs {
        match layout.attribute(name) {
            Some(attribute) if attribute.location == *location => {}
            Some(attribute) => {
                return Err(ShaderCompileError::Link {
                    label: label.to_string(),
                    message: format!(
                        "attribute `{name}` is at location {} but the shader reads location {location}",
                        attribute.location
                    ),
                })
            }
            None => {
                return Err(ShaderCompileError::Link {
                    label: label.to_string(),
                    message: format!("vertex input `{name}` has no matching attribute"),
                })
            }
        }
    }
    Ok(())
}

/// A linked program and its reflected interface.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    kind: ProgramKind,
    handle: Option<ProgramHandle>,
    failure: Option<ShaderCompileError>,
    uniforms: Vec<UniformField>,
    inputs: Vec<(String, u32)>,
}

impl ShaderProgram {
    /// Compiles and links `source` against `layout`.
    ///
    /// Never fails: on error the message is logged and an invalid program is returned. Check
    /// [`ShaderProgram::is_valid`] or let [`ShaderProgram::bind`] report it.
    pub fn compile(
        device: &mut dyn GpuDevice,
        label: &str,
        kind: ProgramKind,
        source: &str,
        layout: VertexLayout,
    ) -> Self {
        let mut program = Self {
            label: label.to_string(),
            kind,
            handle: None,
            failure: None,
            uniforms: Vec::new(),
            inputs: Vec::new(),
        };

        let linked = reflect(label, source).and_then(|reflection| {
            link(label, &reflection.inputs, &layout)?;
            let handle = device
                .create_program(&ProgramDescriptor {
                    label,
                    kind,
                    source,
                    vertex_entry: VERTEX_ENTRY,
                    fragment_entry: FRAGMENT_ENTRY,
                    vertex_layout: layout,
                    uniforms: &reflection.uniforms,
                    uniform_block_size: reflection.uniform_block_size,
                })
                .map_err(|error| ShaderCompileError::Device {
                    label: label.to_string(),
                    message: error.to_string(),
                })?;
            Ok((handle, reflection))
        });

        match linked {
            Ok((handle, reflection)) => {
                debug!(
                    label,
                    uniforms = reflection.uniforms.len(),
                    inputs = reflection.inputs.len(),
                    "linked shader program"
                );
                program.handle = Some(handle);
                program.uniforms = reflection.uniforms;
                program.inputs = reflection.inputs;
            }
            Err(failure) => {
                error!("{failure}");
                program.failure = Some(failure);
            }
        }
        program
    }

    /// The program used for filled and stroked meshes.
    pub fn primitive(device: &mut dyn GpuDevice) -> Self {
        Self::compile(
            device,
            "primitive",
            ProgramKind::Solid,
            PRIMITIVE_SHADER,
            PrimitiveVertex::LAYOUT,
        )
    }

    /// The program used for text quads.
    pub fn glyph(device: &mut dyn GpuDevice) -> Self {
        Self::compile(
            device,
            "glyph",
            ProgramKind::Glyph,
            GLYPH_SHADER,
            GlyphVertex::LAYOUT,
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Why compilation failed, if it did.
    pub fn failure(&self) -> Option<&ShaderCompileError> {
        self.failure.as_ref()
    }

    pub fn handle(&self) -> Result<ProgramHandle, CanvasError> {
        self.handle
            .ok_or_else(|| CanvasError::InvalidProgram(self.label.clone()))
    }

    /// Makes this the current program. Fails for an invalid program.
    pub fn bind(&self, device: &mut dyn GpuDevice) -> Result<(), CanvasError> {
        device.use_program(self.handle()?)?;
        Ok(())
    }

    /// Location of the named vertex input.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.inputs
            .iter()
            .find(|(input, _)| input == name)
            .map(|(_, location)| *location)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformField> {
        self.uniforms.iter().find(|field| field.name == name)
    }

    pub fn set_uniform(
        &self,
        device: &mut dyn GpuDevice,
        name: &str,
        value: UniformValue,
    ) -> Result<(), CanvasError> {
        let handle = self.handle()?;
        let field = self.uniform(name).ok_or_else(|| CanvasError::UnknownUniform {
            program: self.label.clone(),
            name: name.to_string(),
        })?;
        if field.kind != value.kind() {
            return Err(CanvasError::UniformTypeMismatch {
                program: self.label.clone(),
                name: name.to_string(),
                expected: field.kind.name(),
            });
        }
        device.set_uniform(handle, name, value)?;
        Ok(())
    }

    pub fn set_projection_matrix(
        &self,
        device: &mut dyn GpuDevice,
        projection: &Transform,
    ) -> Result<(), CanvasError> {
        self.set_uniform(
            device,
            "projectionMatrix",
            UniformValue::Mat4(projection.to_mat4()),
        )
    }

    pub fn set_translation_matrix(
        &self,
        device: &mut dyn GpuDevice,
        transform: &Transform,
    ) -> Result<(), CanvasError> {
        self.set_uniform(
            device,
            "translationMatrix",
            UniformValue::Mat4(transform.to_mat4()),
        )
    }

    pub fn set_tint(&self, device: &mut dyn GpuDevice, color: Color) -> Result<(), CanvasError> {
        self.set_uniform(device, "tint", UniformValue::Vec3(color.tint()))
    }

    pub fn set_alpha(&self, device: &mut dyn GpuDevice, alpha: f32) -> Result<(), CanvasError> {
        self.set_uniform(device, "alpha", UniformValue::Float(alpha))
    }

    /// Frees the device program. The program is invalid afterwards.
    pub fn release(&mut self, device: &mut dyn GpuDevice) {
        if let Some(handle) = self.handle.take() {
            device.destroy_program(handle);
        }
    }
}
