use ahash::{HashMap, HashMapExt};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pattern, Pixmap, Rect,
    SpreadMode, Transform,
};
use tracing::{debug, info};

use super::*;
use crate::tessellator::signed_area;

const IDENTITY_MAT4: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

struct SoftwareProgram {
    label: String,
    kind: ProgramKind,
    layout: VertexLayout,
    fields: Vec<UniformField>,
    values: HashMap<String, UniformValue>,
}

impl SoftwareProgram {
    fn mat4(&self, name: &str) -> [[f32; 4]; 4] {
        match self.values.get(name) {
            Some(UniformValue::Mat4(value)) => *value,
            _ => IDENTITY_MAT4,
        }
    }

    fn vec3(&self, name: &str) -> [f32; 3] {
        match self.values.get(name) {
            Some(UniformValue::Vec3(value)) => *value,
            _ => [0.0; 3],
        }
    }

    fn float(&self, name: &str) -> f32 {
        match self.values.get(name) {
            Some(UniformValue::Float(value)) => *value,
            _ => 0.0,
        }
    }
}

struct SoftwareTexture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Key of the tinted atlas copy kept between glyph draws.
#[derive(Clone, Copy, PartialEq)]
struct TintKey {
    texture: u64,
    tint: [f32; 3],
    alpha: f32,
}

/// CPU implementation of [`GpuDevice`] on top of a `tiny_skia::Pixmap`.
///
/// Triangles are filled without anti-aliasing, so a pixel is covered exactly when its centre
/// is inside, and composited with premultiplied source-over. Programs are emulated by
/// [`ProgramKind`]: vertices are transformed by `projectionMatrix * translationMatrix`, solid
/// programs output `tint * alpha`, glyph programs multiply that by the bound texture's
/// coverage (nearest sampling).
pub struct SoftwareDevice {
    pixmap: Pixmap,
    next_id: u64,
    buffers: HashMap<u64, Vec<u8>>,
    programs: HashMap<u64, SoftwareProgram>,
    textures: HashMap<u64, SoftwareTexture>,
    current_program: Option<u64>,
    bound_buffer: Option<u64>,
    bound_texture: Option<u64>,
    tinted_atlas: Option<(TintKey, Pixmap)>,
    recording: bool,
    stats: DeviceStats,
}

impl SoftwareDevice {
    /// Creates a device with a transparent framebuffer. Returns `None` for a zero size.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let pixmap = Pixmap::new(width, height)?;
        info!(width, height, "created software device");
        Some(Self {
            pixmap,
            next_id: 1,
            buffers: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            current_program: None,
            bound_buffer: None,
            bound_texture: None,
            tinted_atlas: None,
            recording: false,
            stats: DeviceStats::default(),
        })
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn read_vertex(bytes: &[u8], index: usize, layout: &VertexLayout, name: &str) -> [f32; 2] {
        let Some(attribute) = layout.attribute(name) else {
            return [0.0; 2];
        };
        let start = index * layout.stride as usize + attribute.offset as usize;
        bytemuck::pod_read_unaligned(&bytes[start..start + 8])
    }

    fn tinted_atlas(
        &mut self,
        texture_id: u64,
        tint: [f32; 3],
        alpha: f32,
    ) -> Result<&Pixmap, GpuError> {
        let key = TintKey {
            texture: texture_id,
            tint,
            alpha,
        };
        let cached = matches!(&self.tinted_atlas, Some((existing, _)) if *existing == key);
        if !cached {
            let texture = self
                .textures
                .get(&texture_id)
                .ok_or(GpuError::UnknownTexture(TextureHandle(texture_id)))?;
            let color = premultiply([tint[0], tint[1], tint[2], alpha]);
            let mut data = Vec::with_capacity(texture.rgba.len());
            for texel in texture.rgba.chunks_exact(4) {
                let coverage = texel[3] as f32 / 255.0;
                data.extend(color.map(|channel| (channel * coverage * 255.0).round() as u8));
            }
            let size = IntSize::from_wh(texture.width, texture.height).ok_or(
                GpuError::TextureData {
                    expected: 4,
                    actual: 0,
                },
            )?;
            let pixmap = Pixmap::from_vec(data, size).ok_or(GpuError::TextureData {
                expected: (texture.width * texture.height * 4) as usize,
                actual: texture.rgba.len(),
            })?;
            self.tinted_atlas = Some((key, pixmap));
        }
        match &self.tinted_atlas {
            Some((_, pixmap)) => Ok(pixmap),
            None => Err(GpuError::UnknownTexture(TextureHandle(texture_id))),
        }
    }
}

/// Maps clip space to framebuffer pixels.
fn clip_to_pixels(clip: [f32; 4], viewport: (u32, u32)) -> [f32; 2] {
    let w = if clip[3] == 0.0 { 1.0 } else { clip[3] };
    let (x, y) = (clip[0] / w, clip[1] / w);
    [
        (x + 1.0) * 0.5 * viewport.0 as f32,
        (1.0 - y) * 0.5 * viewport.1 as f32,
    ]
}

fn transform_vertex(matrix: &[[f32; 4]; 4], position: [f32; 2]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, value) in out.iter_mut().enumerate() {
        *value = matrix[0][row] * position[0] + matrix[1][row] * position[1] + matrix[3][row];
    }
    out
}

fn triangle_path(corners: &[[f32; 2]; 3]) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    builder.move_to(corners[0][0], corners[0][1]);
    builder.line_to(corners[1][0], corners[1][1]);
    builder.line_to(corners[2][0], corners[2][1]);
    builder.close();
    builder.finish()
}

/// Affine map taking the three texel-space points onto the three device-space points.
fn texel_to_device(texels: &[[f32; 2]; 3], device: &[[f32; 2]; 3]) -> Option<Transform> {
    let (s0, s1, s2) = (texels[0], texels[1], texels[2]);
    let (p0, p1, p2) = (device[0], device[1], device[2]);
    let (su, sv) = (
        [s1[0] - s0[0], s1[1] - s0[1]],
        [s2[0] - s0[0], s2[1] - s0[1]],
    );
    let determinant = su[0] * sv[1] - sv[0] * su[1];
    if determinant.abs() < f32::EPSILON {
        return None;
    }
    let (pu, pv) = (
        [p1[0] - p0[0], p1[1] - p0[1]],
        [p2[0] - p0[0], p2[1] - p0[1]],
    );
    // [a c; b d] = P * S⁻¹
    let inverse = [
        [sv[1] / determinant, -su[1] / determinant],
        [-sv[0] / determinant, su[0] / determinant],
    ];
    let a = pu[0] * inverse[0][0] + pv[0] * inverse[0][1];
    let b = pu[1] * inverse[0][0] + pv[1] * inverse[0][1];
    let c = pu[0] * inverse[1][0] + pv[0] * inverse[1][1];
    let d = pu[1] * inverse[1][0] + pv[1] * inverse[1][1];
    let tx = p0[0] - (a * s0[0] + c * s0[1]);
    let ty = p0[1] - (b * s0[0] + d * s0[1]);
    Some(Transform::from_row(a, b, c, d, tx, ty))
}

impl GpuDevice for SoftwareDevice {
    fn viewport(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn create_vertex_buffer(
        &mut self,
        _label: Option<&str>,
        contents: &[u8],
    ) -> Result<BufferHandle, GpuError> {
        let id = self.allocate_id();
        self.buffers.insert(id, contents.to_vec());
        self.stats.buffers_created += 1;
        Ok(BufferHandle(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer.0).is_some() {
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
        let id = self.allocate_id();
        self.programs.insert(
            id,
            SoftwareProgram {
                label: descriptor.label.to_string(),
                kind: descriptor.kind,
                layout: descriptor.vertex_layout,
                fields: descriptor.uniforms.to_vec(),
                values: HashMap::new(),
            },
        );
        self.stats.programs_created += 1;
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
        let declared = state
            .fields
            .iter()
            .any(|field| field.name == name && field.kind == value.kind());
        if !declared {
            return Err(GpuError::Uniform {
                program: state.label.clone(),
                name: name.to_string(),
                expected: value.kind().name(),
            });
        }
        state.values.insert(name.to_string(), value);
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
        let id = self.allocate_id();
        self.textures.insert(
            id,
            SoftwareTexture {
                width,
                height,
                rgba: rgba.to_vec(),
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
        if matches!(&self.tinted_atlas, Some((key, _)) if key.texture == texture.0) {
            self.tinted_atlas = None;
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
        self.recording = true;
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4], rect: Option<PixelRect>) -> Result<(), GpuError> {
        if !self.recording {
            return Err(GpuError::NotRecording("clear"));
        }
        let [r, g, b, a] = color.map(|channel| channel.clamp(0.0, 1.0));
        let clear_color =
            tiny_skia::Color::from_rgba(r, g, b, a).unwrap_or(tiny_skia::Color::TRANSPARENT);
        match rect {
            Some(rect) if !rect.covers(self.viewport()) => {
                if let Some(area) = Rect::from_xywh(
                    rect.x as f32,
                    rect.y as f32,
                    rect.width as f32,
                    rect.height as f32,
                ) {
                    let mut paint = Paint::default();
                    paint.set_color(clear_color);
                    paint.blend_mode = BlendMode::Source;
                    paint.anti_alias = false;
                    self.pixmap
                        .fill_rect(area, &paint, Transform::identity(), None);
                }
            }
            _ => self.pixmap.fill(clear_color),
        }
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
        let bytes = self
            .buffers
            .get(&buffer_id)
            .ok_or(GpuError::UnknownBuffer(BufferHandle(buffer_id)))?;

        let layout = program.layout;
        let available = (bytes.len() / layout.stride as usize) as u32;
        if first as u64 + count as u64 > available as u64 {
            return Err(GpuError::DrawOutOfRange {
                first,
                count,
                available,
            });
        }

        let kind = program.kind;
        let label = program.label.clone();
        let matrix = multiply_mat4(
            &program.mat4("projectionMatrix"),
            &program.mat4("translationMatrix"),
        );
        let tint = program.vec3("tint");
        let alpha = program.float("alpha");
        let viewport = self.viewport();

        let mut positions = Vec::with_capacity(count as usize);
        let mut tex_coords = Vec::new();
        for index in first..first + count {
            let position = Self::read_vertex(bytes, index as usize, &layout, "aVertexPosition");
            positions.push(clip_to_pixels(
                transform_vertex(&matrix, position),
                viewport,
            ));
            if kind == ProgramKind::Glyph {
                tex_coords.push(Self::read_vertex(
                    bytes,
                    index as usize,
                    &layout,
                    "aTextureCoord",
                ));
            }
        }

        self.stats.draw_calls += 1;

        let triangle_count = topology.triangle_count(positions.len());
        match kind {
            ProgramKind::Solid => {
                let [r, g, b] = tint.map(|channel| channel.clamp(0.0, 1.0));
                let Some(color) = tiny_skia::Color::from_rgba(r, g, b, alpha.clamp(0.0, 1.0))
                else {
                    return Ok(());
                };
                let mut paint = Paint::default();
                paint.set_color(color);
                paint.anti_alias = false;
                paint.blend_mode = BlendMode::SourceOver;

                for triangle in 0..triangle_count {
                    let [a, b, c] = topology.triangle_indices(triangle);
                    let corners = [positions[a], positions[b], positions[c]];
                    if signed_area(corners[0], corners[1], corners[2]) == 0.0 {
                        continue;
                    }
                    if let Some(path) = triangle_path(&corners) {
                        self.pixmap.fill_path(
                            &path,
                            &paint,
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }
            }
            ProgramKind::Glyph => {
                let texture_id = self.bound_texture.ok_or(GpuError::NoTexture(label))?;
                let atlas = self.tinted_atlas(texture_id, tint, alpha)?.clone();
                let texel_scale = (atlas.width() as f32, atlas.height() as f32);

                for triangle in 0..triangle_count {
                    let [a, b, c] = topology.triangle_indices(triangle);
                    let corners = [positions[a], positions[b], positions[c]];
                    let texels = [tex_coords[a], tex_coords[b], tex_coords[c]]
                        .map(|uv| [uv[0] * texel_scale.0, uv[1] * texel_scale.1]);
                    let Some(pattern_transform) = texel_to_device(&texels, &corners) else {
                        continue;
                    };
                    let Some(path) = triangle_path(&corners) else {
                        continue;
                    };
                    let paint = Paint {
                        shader: Pattern::new(
                            atlas.as_ref(),
                            SpreadMode::Pad,
                            FilterQuality::Nearest,
                            1.0,
                            pattern_transform,
                        ),
                        blend_mode: BlendMode::SourceOver,
                        anti_alias: false,
                        force_hq_pipeline: false,
                    };
                    self.pixmap.fill_path(
                        &path,
                        &paint,
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }

        debug!(?topology, first, count, "software draw");
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        if !self.recording {
            return Err(GpuError::NotRecording("end_frame"));
        }
        self.recording = false;
        self.stats.frames += 1;
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<Vec<u8>, GpuError> {
        Ok(self.pixmap.data().to_vec())
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::{GlyphVertex, PrimitiveVertex, Vertex};

    fn solid_program(device: &mut SoftwareDevice) -> ProgramHandle {
        let fields = [
            UniformField {
                name: "projectionMatrix".into(),
                offset: 0,
                kind: UniformKind::Mat4,
            },
            UniformField {
                name: "translationMatrix".into(),
                offset: 64,
                kind: UniformKind::Mat4,
            },
            UniformField {
                name: "tint".into(),
                offset: 128,
                kind: UniformKind::Vec3,
            },
            UniformField {
                name: "alpha".into(),
                offset: 140,
                kind: UniformKind::Float,
            },
        ];
        let program = device
            .create_program(&ProgramDescriptor {
                label: "solid",
                kind: ProgramKind::Solid,
                source: "",
                vertex_entry: "vs_main",
                fragment_entry: "fs_main",
                vertex_layout: PrimitiveVertex::LAYOUT,
                uniforms: &fields,
                uniform_block_size: 144,
            })
            .unwrap();
        let projection = crate::Transform::projection(4.0, 4.0).to_mat4();
        device
            .set_uniform(program, "projectionMatrix", UniformValue::Mat4(projection))
            .unwrap();
        device
            .set_uniform(program, "translationMatrix", UniformValue::Mat4(IDENTITY_MAT4))
            .unwrap();
        device
            .set_uniform(program, "alpha", UniformValue::Float(1.0))
            .unwrap();
        program
    }

    fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
    }

    #[test]
    fn zero_sized_device_is_rejected() {
        assert!(SoftwareDevice::new(0, 10).is_none());
    }

    #[test]
    fn draws_require_an_open_frame() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        assert!(matches!(
            device.draw(Topology::TriangleList, 0, 3),
            Err(GpuError::NotRecording("draw"))
        ));
        device.begin_frame().unwrap();
        assert!(matches!(
            device.draw(Topology::TriangleList, 0, 3),
            Err(GpuError::NoProgram)
        ));
    }

    #[test]
    fn fills_triangle_strip_at_pixel_centres() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        let program = solid_program(&mut device);
        device
            .set_uniform(program, "tint", UniformValue::Vec3([0.0, 1.0, 0.0]))
            .unwrap();
        let quad = [
            PrimitiveVertex::new(1.0, 1.0),
            PrimitiveVertex::new(3.0, 1.0),
            PrimitiveVertex::new(1.0, 3.0),
            PrimitiveVertex::new(3.0, 3.0),
        ];
        let buffer = device
            .create_vertex_buffer(None, bytemuck::cast_slice(&quad))
            .unwrap();

        device.begin_frame().unwrap();
        device.clear([0.0, 0.0, 0.0, 0.0], None).unwrap();
        device.use_program(program).unwrap();
        device.bind_vertex_buffer(buffer).unwrap();
        device.draw(Topology::TriangleStrip, 0, 4).unwrap();
        device.end_frame().unwrap();

        let data = device.read_pixels().unwrap();
        assert_eq!(pixel(&data, 4, 1, 1), [0, 255, 0, 255]);
        assert_eq!(pixel(&data, 4, 2, 2), [0, 255, 0, 255]);
        assert_eq!(pixel(&data, 4, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&data, 4, 3, 3), [0, 0, 0, 0]);
        assert_eq!(device.stats().draw_calls, 1);
    }

    #[test]
    fn blends_premultiplied_source_over() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        let program = solid_program(&mut device);
        device
            .set_uniform(program, "tint", UniformValue::Vec3([1.0, 0.0, 0.0]))
            .unwrap();
        device
            .set_uniform(program, "alpha", UniformValue::Float(0.5))
            .unwrap();
        let quad = [
            PrimitiveVertex::new(0.0, 0.0),
            PrimitiveVertex::new(4.0, 0.0),
            PrimitiveVertex::new(0.0, 4.0),
            PrimitiveVertex::new(4.0, 4.0),
        ];
        let buffer = device
            .create_vertex_buffer(None, bytemuck::cast_slice(&quad))
            .unwrap();

        device.begin_frame().unwrap();
        device.clear([0.0, 0.0, 1.0, 1.0], None).unwrap();
        device.use_program(program).unwrap();
        device.bind_vertex_buffer(buffer).unwrap();
        device.draw(Topology::TriangleStrip, 0, 4).unwrap();
        device.end_frame().unwrap();

        let [r, g, b, a] = pixel(&device.read_pixels().unwrap(), 4, 2, 2);
        assert!((r as i32 - 128).abs() <= 1, "red {r}");
        assert_eq!(g, 0);
        assert!((b as i32 - 128).abs() <= 1, "blue {b}");
        assert_eq!(a, 255);
    }

    #[test]
    fn rectangle_clear_leaves_the_rest() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        device.begin_frame().unwrap();
        device.clear([1.0, 1.0, 1.0, 1.0], None).unwrap();
        device
            .clear(
                [0.0, 0.0, 0.0, 0.0],
                Some(PixelRect {
                    x: 0,
                    y: 0,
                    width: 2,
                    height: 4,
                }),
            )
            .unwrap();
        device.end_frame().unwrap();
        let data = device.read_pixels().unwrap();
        assert_eq!(pixel(&data, 4, 1, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&data, 4, 2, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn out_of_range_draw_is_rejected() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        let program = solid_program(&mut device);
        let buffer = device
            .create_vertex_buffer(None, bytemuck::cast_slice(&[PrimitiveVertex::default(); 3]))
            .unwrap();
        device.begin_frame().unwrap();
        device.use_program(program).unwrap();
        device.bind_vertex_buffer(buffer).unwrap();
        assert!(matches!(
            device.draw(Topology::TriangleList, 1, 3),
            Err(GpuError::DrawOutOfRange { available: 3, .. })
        ));
    }

    #[test]
    fn undeclared_uniforms_are_rejected() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        let program = solid_program(&mut device);
        assert!(device
            .set_uniform(program, "tint", UniformValue::Float(1.0))
            .is_err());
        assert!(device
            .set_uniform(program, "missing", UniformValue::Float(1.0))
            .is_err());
    }

    #[test]
    fn glyph_program_samples_the_bound_texture() {
        let mut device = SoftwareDevice::new(4, 4).unwrap();
        let fields = [
            UniformField {
                name: "projectionMatrix".into(),
                offset: 0,
                kind: UniformKind::Mat4,
            },
            UniformField {
                name: "tint".into(),
                offset: 128,
                kind: UniformKind::Vec3,
            },
            UniformField {
                name: "alpha".into(),
                offset: 140,
                kind: UniformKind::Float,
            },
        ];
        let program = device
            .create_program(&ProgramDescriptor {
                label: "glyph",
                kind: ProgramKind::Glyph,
                source: "",
                vertex_entry: "vs_main",
                fragment_entry: "fs_main",
                vertex_layout: GlyphVertex::LAYOUT,
                uniforms: &fields,
                uniform_block_size: 144,
            })
            .unwrap();
        device
            .set_uniform(
                program,
                "projectionMatrix",
                UniformValue::Mat4(crate::Transform::projection(4.0, 4.0).to_mat4()),
            )
            .unwrap();
        device
            .set_uniform(program, "tint", UniformValue::Vec3([1.0, 1.0, 1.0]))
            .unwrap();
        device
            .set_uniform(program, "alpha", UniformValue::Float(1.0))
            .unwrap();

        // 2x1 texture: left texel covered, right texel empty.
        let texture = device
            .create_texture(2, 1, &[255, 255, 255, 255, 0, 0, 0, 0])
            .unwrap();
        let vertex = |x: f32, y: f32, u: f32, v: f32| GlyphVertex {
            position: [x, y],
            tex_coords: [u, v],
        };
        let quad = [
            vertex(0.0, 0.0, 0.0, 0.0),
            vertex(4.0, 0.0, 1.0, 0.0),
            vertex(0.0, 4.0, 0.0, 1.0),
            vertex(0.0, 4.0, 0.0, 1.0),
            vertex(4.0, 0.0, 1.0, 0.0),
            vertex(4.0, 4.0, 1.0, 1.0),
        ];
        let buffer = device
            .create_vertex_buffer(None, bytemuck::cast_slice(&quad))
            .unwrap();

        device.begin_frame().unwrap();
        device.clear([0.0, 0.0, 0.0, 0.0], None).unwrap();
        device.use_program(program).unwrap();
        device.bind_vertex_buffer(buffer).unwrap();
        assert!(matches!(
            device.draw(Topology::TriangleList, 0, 6),
            Err(GpuError::NoTexture(_))
        ));
        device.bind_texture(Some(texture)).unwrap();
        device.draw(Topology::TriangleList, 0, 6).unwrap();
        device.end_frame().unwrap();

        let data = device.read_pixels().unwrap();
        assert_eq!(pixel(&data, 4, 0, 1), [255, 255, 255, 255]);
        assert_eq!(pixel(&data, 4, 3, 1), [0, 0, 0, 0]);
    }
}
