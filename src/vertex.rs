use bytemuck::{Pod, Zeroable};

/// A float vertex attribute as seen by a shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute name in the shader source.
    pub name: &'static str,
    pub location: u32,
    /// Byte offset inside one vertex.
    pub offset: u32,
    /// Number of `f32` components (1 to 4).
    pub components: u32,
}

/// Interleaved vertex layout of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
    }
}

pub trait Vertex: Pod {
    const LAYOUT: VertexLayout;

    fn position(&self) -> [f32; 2];
}

/// Position-only vertex used by filled and stroked shapes. Color comes from the `tint` uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PrimitiveVertex {
    pub position: [f32; 2],
}

impl PrimitiveVertex {
    pub fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }
}

impl Vertex for PrimitiveVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<PrimitiveVertex>() as u32,
        attributes: &[VertexAttribute {
            name: "aVertexPosition",
            location: 0,
            offset: 0,
            components: 2,
        }],
    };

    fn position(&self) -> [f32; 2] {
        self.position
    }
}

/// Glyph quad vertex: position plus atlas texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl Vertex for GlyphVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<GlyphVertex>() as u32,
        attributes: &[
            VertexAttribute {
                name: "aVertexPosition",
                location: 0,
                offset: 0,
                components: 2,
            },
            VertexAttribute {
                name: "aTextureCoord",
                location: 1,
                offset: 8,
                components: 2,
            },
        ],
    };

    fn position(&self) -> [f32; 2] {
        self.position
    }
}
