use super::atlas::{cell_index, GlyphAtlas};
use super::font::FontFace;
use crate::tessellator::{Mesh, Topology};
use crate::vertex::GlyphVertex;

/// Glyph quads of one string, plus where the pen ended up.
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub mesh: Mesh<GlyphVertex>,
    pub pen_x: f32,
}

/// Lays out `text` starting with the pen at `(x, y)`; `y` is the top of the line and the
/// baseline sits `font_size` below it.
///
/// Every character in the atlas gets one cell-sized quad of six vertices. Characters outside
/// it emit nothing but still advance the pen by their advance width. Characters the font has
/// no glyph for are skipped entirely: no quad and no pen advance.
pub fn layout_text(text: &str, x: f32, y: f32, face: &dyn FontFace, atlas: &GlyphAtlas) -> TextLayout {
    let config = atlas.config();
    let font_scale = config.font_size / face.units_per_em();
    let (cell_width, cell_height) = (config.cell_width as f32, config.cell_height as f32);
    let baseline = y + config.font_size;

    let mut vertices = Vec::with_capacity(text.len() * 6);
    let mut pen_x = x;
    for c in text.chars() {
        let Some(metrics) = face.glyph_for(c) else {
            continue;
        };
        if let Some(index) = cell_index(c) {
            let y_offset = metrics.min_y * font_scale;
            let bottom = baseline - y_offset;
            let top = bottom - cell_height;
            let (left, right) = (pen_x, pen_x + cell_width);
            let [u0, v0, u1, v1] = atlas.uv_rect(index);
            let vertex = |x: f32, y: f32, u: f32, v: f32| GlyphVertex {
                position: [x, y],
                tex_coords: [u, v],
            };
            vertices.extend([
                vertex(left, top, u0, v0),
                vertex(left, bottom, u0, v1),
                vertex(right, bottom, u1, v1),
                vertex(left, top, u0, v0),
                vertex(right, bottom, u1, v1),
                vertex(right, top, u1, v0),
            ]);
        }
        pen_x += metrics.advance_width * font_scale;
    }

    TextLayout {
        mesh: Mesh::new(vertices, Topology::TriangleList),
        pen_x,
    }
}
