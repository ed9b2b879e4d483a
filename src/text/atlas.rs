use tracing::debug;

use super::font::FontFace;
use crate::config::{AtlasConfig, ATLAS_GLYPH_COUNT};
use crate::error::CanvasError;

pub const FIRST_ATLAS_CHAR: u32 = 33;
pub const LAST_ATLAS_CHAR: u32 = FIRST_ATLAS_CHAR + ATLAS_GLYPH_COUNT - 1;

/// Atlas cell of `c`, or `None` outside printable ASCII.
pub fn cell_index(c: char) -> Option<u32> {
    let code = c as u32;
    (FIRST_ATLAS_CHAR..=LAST_ATLAS_CHAR)
        .contains(&code)
        .then(|| code - FIRST_ATLAS_CHAR)
}

/// Printable ASCII rasterized once into a fixed grid. Never grown or regenerated.
///
/// Texels are RGBA with the glyph coverage in every channel. Each glyph sits on a baseline
/// lifted by its scaled `min_y` so descenders stay inside the cell.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    config: AtlasConfig,
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    pub fn build(face: &dyn FontFace, config: AtlasConfig) -> Result<Self, CanvasError> {
        config.validate()?;
        let width = config.texture_width as usize;
        let mut pixels = vec![0u8; width * config.texture_height as usize * 4];
        let font_scale = config.font_size / face.units_per_em();

        let mut rasterized = 0;
        for index in 0..ATLAS_GLYPH_COUNT {
            let Some(c) = char::from_u32(FIRST_ATLAS_CHAR + index) else {
                continue;
            };
            let Some(metrics) = face.glyph_for(c) else {
                continue;
            };
            let bitmap = face.rasterize(c, config.font_size);
            let (row, column) = Self::cell_of(&config, index);
            let cell_left = (column * config.cell_width) as i32;
            let cell_top = (row * config.cell_height) as i32;
            let baseline = cell_top + config.cell_height as i32 + (metrics.min_y * font_scale).round() as i32;
            let glyph_top = baseline - (bitmap.ymin + bitmap.height as i32);
            let glyph_left = cell_left + bitmap.xmin.max(0);

            for y in 0..bitmap.height {
                let py = glyph_top + y as i32;
                if py < cell_top || py >= cell_top + config.cell_height as i32 {
                    continue;
                }
                for x in 0..bitmap.width {
                    let px = glyph_left + x as i32;
                    if px >= cell_left + config.cell_width as i32 {
                        break;
                    }
                    let coverage = bitmap.coverage[y * bitmap.width + x];
                    let offset = (py as usize * width + px as usize) * 4;
                    pixels[offset..offset + 4].fill(coverage);
                }
            }
            rasterized += 1;
        }

        debug!(
            rasterized,
            width = config.texture_width,
            height = config.texture_height,
            "built glyph atlas"
        );
        Ok(Self { config, pixels })
    }

    fn cell_of(config: &AtlasConfig, index: u32) -> (u32, u32) {
        let cells_per_row = config.cells_per_row();
        (index / cells_per_row, index % cells_per_row)
    }

    /// `(row, column)` of atlas cell `index`.
    pub fn cell(&self, index: u32) -> (u32, u32) {
        Self::cell_of(&self.config, index)
    }

    /// Normalized `[u0, v0, u1, v1]` of atlas cell `index`.
    pub fn uv_rect(&self, index: u32) -> [f32; 4] {
        let (row, column) = self.cell(index);
        let width = self.config.texture_width as f32;
        let height = self.config.texture_height as f32;
        let u0 = (column * self.config.cell_width) as f32 / width;
        let v0 = (row * self.config.cell_height) as f32 / height;
        [
            u0,
            v0,
            u0 + self.config.cell_width as f32 / width,
            v0 + self.config.cell_height as f32 / height,
        ]
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.texture_width
    }

    pub fn height(&self) -> u32 {
        self.config.texture_height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
