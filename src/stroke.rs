use crate::Color;

/// Stroke descriptor: line width plus the color and opacity it is drawn with.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
    pub alpha: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Color::BLACK,
            alpha: 1.0,
        }
    }
}

impl Stroke {
    #[inline]
    pub fn new(width: impl Into<f32>, color: impl Into<Color>) -> Self {
        Self {
            width: width.into(),
            color: color.into(),
            alpha: 1.0,
        }
    }

    #[inline]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// True if width is zero or the stroke would be invisible
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.alpha <= 0.0
    }

    #[inline]
    pub(crate) fn half_width(&self) -> f32 {
        self.width * 0.5
    }
}
