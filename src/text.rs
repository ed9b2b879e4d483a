//! Text rendering through a fixed ASCII glyph atlas.
//!
//! The font is loaded asynchronously. Until it is ready, `fill_text` calls are queued; the
//! [`TextRenderer`] moves through [`TextState::Unloaded`] → [`TextState::Loading`] →
//! [`TextState::Ready`] and, on the poll that observes readiness, hands every queued call back
//! in arrival order. After that, calls are laid out immediately.
//!
//! # Examples
//!
//! ```no_run
//! use canvas2d::{Canvas, CanvasConfig, FontdueLoader, SoftwareDevice};
//!
//! let device = SoftwareDevice::new(200, 50).unwrap();
//! let mut canvas = Canvas::new(device, CanvasConfig::new(200, 50)).unwrap();
//! canvas.set_font_loader(FontdueLoader::from_path("fonts/SourceSansPro-Regular.ttf"));
//! canvas.fill_text("Hello", 10.0, 10.0).unwrap();
//! // The text shows up once a frame tick observes the loaded font.
//! canvas.frame_tick().unwrap();
//! ```

use std::collections::VecDeque;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use crate::config::AtlasConfig;
use crate::error::CanvasError;
use crate::{Color, Transform};

mod atlas;
mod font;
mod layout;

pub use atlas::{cell_index, GlyphAtlas, FIRST_ATLAS_CHAR, LAST_ATLAS_CHAR};
pub use font::{
    FontError, FontFace, FontLoader, FontdueFace, FontdueLoader, GlyphBitmap, GlyphMetrics,
};
pub use layout::{layout_text, TextLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextState {
    Unloaded,
    Loading,
    Ready,
    /// The last load failed. Setting a new loader goes back to `Unloaded`.
    Failed,
}

/// One `fill_text` call with the style it was issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub alpha: f32,
    pub transform: Transform,
}

type FontFuture = LocalBoxFuture<'static, Result<Box<dyn FontFace>, FontError>>;

enum Stage {
    Unloaded,
    Loading(FontFuture),
    Ready {
        face: Box<dyn FontFace>,
        atlas: GlyphAtlas,
    },
    Failed,
}

pub struct TextRenderer {
    config: AtlasConfig,
    loader: Option<Box<dyn FontLoader>>,
    stage: Stage,
    pending: VecDeque<TextRun>,
}

impl TextRenderer {
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            loader: None,
            stage: Stage::Unloaded,
            pending: VecDeque::new(),
        }
    }

    /// Sets where the font comes from. A font that is already loading or loaded is kept; after
    /// a failure the next `submit` loads again with this loader.
    pub fn set_loader(&mut self, loader: impl FontLoader + 'static) {
        self.loader = Some(Box::new(loader));
        if matches!(self.stage, Stage::Failed) {
            self.stage = Stage::Unloaded;
        }
    }

    pub fn state(&self) -> TextState {
        match self.stage {
            Stage::Unloaded => TextState::Unloaded,
            Stage::Loading(_) => TextState::Loading,
            Stage::Ready { .. } => TextState::Ready,
            Stage::Failed => TextState::Failed,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Accepts a text run. Returns it back when the font is ready and it can be drawn now;
    /// otherwise it is queued, starting the font load if needed.
    pub fn submit(&mut self, run: TextRun) -> Result<Option<TextRun>, FontError> {
        match &self.stage {
            Stage::Ready { .. } => return Ok(Some(run)),
            Stage::Failed => return Err(FontError::Unavailable),
            Stage::Loading(_) => {}
            Stage::Unloaded => {
                let loader = self.loader.as_ref().ok_or(FontError::NoFontSource)?;
                self.stage = Stage::Loading(loader.load());
                info!("font load started");
            }
        }
        self.pending.push_back(run);
        Ok(None)
    }

    /// Polls the font load once without blocking.
    ///
    /// Returns the queued runs, in arrival order, exactly on the poll that sees the font and
    /// atlas become ready. Returns `Ok(None)` on every other poll.
    pub fn poll(&mut self) -> Result<Option<Vec<TextRun>>, CanvasError> {
        let Stage::Loading(future) = &mut self.stage else {
            return Ok(None);
        };
        let mut context = Context::from_waker(futures::task::noop_waker_ref());
        let loaded = match future.poll_unpin(&mut context) {
            Poll::Pending => return Ok(None),
            Poll::Ready(loaded) => loaded,
        };

        let ready = loaded
            .map_err(CanvasError::from)
            .and_then(|face| GlyphAtlas::build(face.as_ref(), self.config).map(|atlas| (face, atlas)));
        match ready {
            Ok((face, atlas)) => {
                self.stage = Stage::Ready { face, atlas };
                info!(queued = self.pending.len(), "font ready");
                Ok(Some(self.pending.drain(..).collect()))
            }
            Err(error) => {
                if !self.pending.is_empty() {
                    warn!(
                        dropped = self.pending.len(),
                        "font failed to load, dropping queued text"
                    );
                }
                self.pending.clear();
                self.stage = Stage::Failed;
                Err(error)
            }
        }
    }

    pub fn atlas(&self) -> Option<&GlyphAtlas> {
        match &self.stage {
            Stage::Ready { atlas, .. } => Some(atlas),
            _ => None,
        }
    }

    /// Lays out a run in untransformed canvas coordinates. `None` until the font is ready.
    pub fn layout(&self, run: &TextRun) -> Option<TextLayout> {
        match &self.stage {
            Stage::Ready { face, atlas } => {
                Some(layout_text(&run.text, run.x, run.y, face.as_ref(), atlas))
            }
            _ => None,
        }
    }

    /// Drops queued runs but keeps the font and any load in flight.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }
}
