use crate::error::CanvasError;
use crate::util::to_physical;
use crate::Color;

/// Printable ASCII, `!` through `~`.
pub const ATLAS_GLYPH_COUNT: u32 = 94;

/// How `clear_rect` behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearRectMode {
    /// Clear only the requested rectangle.
    #[default]
    Clip,
    /// Clear the whole color buffer whatever rectangle is requested.
    FullBuffer,
}

/// Construction parameters of a [`Canvas`](crate::Canvas). Fixed for the canvas lifetime.
///
/// # Examples
///
/// ```
/// use canvas2d::{CanvasConfig, ClearRectMode, Color};
///
/// let config = CanvasConfig::new(100, 50)
///     .with_scale(2.0)
///     .with_clear_color(Color::WHITE)
///     .with_clear_rect_mode(ClearRectMode::FullBuffer);
/// assert_eq!(config.physical_size(), (200, 100));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Logical width; drawing coordinates are in logical pixels.
    pub width: u32,
    pub height: u32,
    /// Device pixels per logical pixel.
    pub scale: f32,
    /// Color the buffer is cleared to at the start of every redraw.
    pub clear_color: Color,
    pub clear_rect_mode: ClearRectMode,
    pub atlas: AtlasConfig,
}

impl CanvasConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            clear_color: Color::TRANSPARENT,
            clear_rect_mode: ClearRectMode::default(),
            atlas: AtlasConfig::default(),
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_clear_color(mut self, clear_color: Color) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_clear_rect_mode(mut self, mode: ClearRectMode) -> Self {
        self.clear_rect_mode = mode;
        self
    }

    pub fn with_atlas(mut self, atlas: AtlasConfig) -> Self {
        self.atlas = atlas;
        self
    }

    /// Size of the device viewport this canvas expects.
    pub fn physical_size(&self) -> (u32, u32) {
        to_physical((self.width, self.height), self.scale)
    }

    pub(crate) fn validate(&self) -> Result<(), CanvasError> {
        if self.width == 0 || self.height == 0 {
            return Err(CanvasError::InvalidArgument(format!(
                "canvas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(CanvasError::InvalidArgument(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        self.atlas.validate()
    }
}

/// Font atlas geometry. The atlas is a fixed grid of equally sized cells, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasConfig {
    pub texture_width: u32,
    pub texture_height: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    /// Pixel size glyphs are rasterized and laid out at.
    pub font_size: f32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            texture_width: 256,
            texture_height: 256,
            cell_width: 20,
            cell_height: 20,
            font_size: 16.0,
        }
    }
}

impl AtlasConfig {
    pub fn cells_per_row(&self) -> u32 {
        self.texture_width / self.cell_width.max(1)
    }

    pub fn rows(&self) -> u32 {
        self.texture_height / self.cell_height.max(1)
    }

    pub fn validate(&self) -> Result<(), CanvasError> {
        let fits = self.cell_width > 0
            && self.cell_height > 0
            && self.cells_per_row() * self.rows() >= ATLAS_GLYPH_COUNT;
        if !fits {
            return Err(CanvasError::AtlasTooSmall {
                texture_width: self.texture_width,
                texture_height: self.texture_height,
                cell_width: self.cell_width,
                cell_height: self.cell_height,
                glyphs: ATLAS_GLYPH_COUNT,
            });
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(CanvasError::InvalidArgument(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_atlas_holds_printable_ascii() {
        let atlas = AtlasConfig::default();
        assert_eq!(atlas.cells_per_row(), 12);
        assert_eq!(atlas.rows(), 12);
        assert!(atlas.validate().is_ok());
    }

    #[test]
    fn undersized_atlas_is_rejected() {
        let atlas = AtlasConfig {
            texture_width: 100,
            texture_height: 100,
            ..AtlasConfig::default()
        };
        assert!(matches!(
            atlas.validate(),
            Err(CanvasError::AtlasTooSmall { glyphs: 94, .. })
        ));
    }

    #[test]
    fn config_rejects_empty_canvas() {
        assert!(CanvasConfig::new(0, 10).validate().is_err());
        assert!(CanvasConfig::new(10, 10).with_scale(0.0).validate().is_err());
        assert!(CanvasConfig::new(10, 10).validate().is_ok());
    }

    #[test]
    fn physical_size_rounds_up() {
        assert_eq!(CanvasConfig::new(100, 50).with_scale(1.5).physical_size(), (150, 75));
        assert_eq!(CanvasConfig::new(3, 3).with_scale(1.5).physical_size(), (5, 5));
    }
}
