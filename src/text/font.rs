use std::path::PathBuf;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("no font loader is configured")]
    NoFontSource,
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse font: {0}")]
    Parse(String),
    #[error("the font loader was dropped before it finished")]
    Cancelled,
    #[error("the font failed to load earlier; set a new loader to retry")]
    Unavailable,
}

/// Glyph metrics in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub advance_width: f32,
    /// Bottom of the glyph outline relative to the baseline, y-up. Negative for descenders.
    pub min_y: f32,
}

/// Coverage bitmap of one glyph, rows top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    /// Left edge relative to the pen position, in pixels.
    pub xmin: i32,
    /// Bottom edge relative to the baseline, in pixels, y-up.
    pub ymin: i32,
    pub coverage: Vec<u8>,
}

/// A parsed font as the text renderer sees it.
pub trait FontFace {
    fn units_per_em(&self) -> f32;

    /// `None` when the font has no glyph for `c`.
    fn glyph_for(&self, c: char) -> Option<GlyphMetrics>;

    fn rasterize(&self, c: char, px: f32) -> GlyphBitmap;
}

/// Produces a [`FontFace`] asynchronously. The canvas only polls the returned future from
/// `frame_tick`, it never blocks on it.
pub trait FontLoader {
    fn load(&self) -> LocalBoxFuture<'static, Result<Box<dyn FontFace>, FontError>>;
}

pub struct FontdueFace {
    font: fontdue::Font,
}

impl FontdueFace {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self { font })
    }
}

impl FontFace for FontdueFace {
    fn units_per_em(&self) -> f32 {
        self.font.units_per_em()
    }

    fn glyph_for(&self, c: char) -> Option<GlyphMetrics> {
        if self.font.lookup_glyph_index(c) == 0 {
            return None;
        }
        // Metrics at a pixel size of one em are in font units.
        let metrics = self.font.metrics(c, self.font.units_per_em());
        Some(GlyphMetrics {
            advance_width: metrics.advance_width,
            min_y: metrics.bounds.ymin,
        })
    }

    fn rasterize(&self, c: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(c, px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            coverage,
        }
    }
}

enum FontSource {
    Bytes(Arc<[u8]>),
    Path(PathBuf),
}

/// Loads a TrueType or OpenType font with `fontdue`, from memory or from a file.
pub struct FontdueLoader {
    source: FontSource,
}

impl FontdueLoader {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: FontSource::Bytes(bytes.into()),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: FontSource::Path(path.into()),
        }
    }
}

impl FontLoader for FontdueLoader {
    fn load(&self) -> LocalBoxFuture<'static, Result<Box<dyn FontFace>, FontError>> {
        let source = match &self.source {
            FontSource::Bytes(bytes) => FontSource::Bytes(bytes.clone()),
            FontSource::Path(path) => FontSource::Path(path.clone()),
        };
        async move {
            let face = match source {
                FontSource::Bytes(bytes) => FontdueFace::from_bytes(&bytes)?,
                FontSource::Path(path) => FontdueFace::from_bytes(&std::fs::read(path)?)?,
            };
            Ok::<Box<dyn FontFace>, FontError>(Box::new(face))
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let result = futures::executor::block_on(FontdueLoader::from_bytes(vec![0u8; 16]).load());
        assert!(matches!(result, Err(FontError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let loader = FontdueLoader::from_path("/nonexistent/font.ttf");
        let result = futures::executor::block_on(loader.load());
        assert!(matches!(result, Err(FontError::Io(_))));
    }
}
