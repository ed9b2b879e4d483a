//! The retained-mode drawing context.
//!
//! Every drawing call is tessellated and uploaded immediately, then retained as a [`Drawable`]
//! in an insertion-ordered display list. A redraw clears the buffer and replays the whole list
//! with one draw call per drawable: later drawables composite over earlier ones, with no depth
//! test and no reordering.
//!
//! # Examples
//!
//! ```
//! use canvas2d::{Canvas, CanvasConfig, SoftwareDevice};
//!
//! let device = SoftwareDevice::new(100, 50).unwrap();
//! let mut canvas = Canvas::new(device, CanvasConfig::new(100, 50)).unwrap();
//!
//! canvas.set_fill_style("#0f0").unwrap();
//! canvas.fill_rect(0.0, 0.0, 100.0, 50.0).unwrap();
//!
//! let pixels = canvas.read_pixels().unwrap();
//! assert_eq!(&pixels[0..4], &[0, 255, 0, 255]);
//! ```

use tracing::{debug, info, warn};

use crate::buffer::GpuMesh;
use crate::config::{CanvasConfig, ClearRectMode};
use crate::device::{DeviceStats, GpuDevice, PixelRect, TextureHandle};
use crate::error::{CanvasError, ColorParseError};
use crate::path::Path;
use crate::shader::ShaderProgram;
use crate::stroke::Stroke;
use crate::tessellator::{tessellate_path, Mesh, Paint, Shape};
use crate::text::{FontLoader, TextRenderer, TextRun, TextState};
use crate::util::all_finite;
use crate::{Color, Transform};

mod construction;
mod drawing;
mod rendering;
mod state;

/// Which program a drawable is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Solid,
    /// Text quads sampling the glyph atlas.
    Glyph(TextureHandle),
}

/// A retained draw: an uploaded mesh plus the uniforms it is drawn with.
#[derive(Debug)]
pub struct Drawable {
    pub(crate) mesh: GpuMesh,
    pub transform: Transform,
    pub tint: Color,
    pub alpha: f32,
    pub material: Material,
}

#[derive(Debug)]
enum DisplayItem {
    Draw(Drawable),
    /// Clear to transparent black; `None` clears the whole buffer.
    Clear(Option<PixelRect>),
}

/// Style state captured by `save` and restored by `restore`.
#[derive(Debug, Clone, PartialEq)]
struct DrawingState {
    fill_style: Color,
    stroke_style: Color,
    line_width: f32,
    global_alpha: f32,
    transform: Transform,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_style: Color::BLACK,
            stroke_style: Color::BLACK,
            line_width: 1.0,
            global_alpha: 1.0,
            transform: Transform::identity(),
        }
    }
}

/// A 2D canvas drawing onto a [`GpuDevice`].
///
/// Single-threaded: the canvas owns the device and assumes exclusive access for the duration
/// of a frame.
pub struct Canvas<D: GpuDevice> {
    device: D,
    config: CanvasConfig,
    /// Logical canvas space to clip space, computed once.
    projection: Transform,
    primitive_program: ShaderProgram,
    glyph_program: ShaderProgram,

    path: Path,
    state: DrawingState,
    state_stack: Vec<DrawingState>,
    display_list: Vec<DisplayItem>,

    text: TextRenderer,
    atlas_texture: Option<TextureHandle>,

    dirty: bool,
}

impl<D: GpuDevice> Drop for Canvas<D> {
    fn drop(&mut self) {
        self.release_display_list();
        if let Some(texture) = self.atlas_texture.take() {
            self.device.destroy_texture(texture);
        }
        self.primitive_program.release(&mut self.device);
        self.glyph_program.release(&mut self.device);
    }
}
