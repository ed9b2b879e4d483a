use super::*;

impl<D: GpuDevice> Canvas<D> {
    /// Sets the fill color from a `#rgb`, `#rrggbb` or `rgb(r, g, b)` string. On error the
    /// current style is kept.
    pub fn set_fill_style(&mut self, style: &str) -> Result<(), ColorParseError> {
        self.state.fill_style = Color::parse(style)?;
        Ok(())
    }

    pub fn set_stroke_style(&mut self, style: &str) -> Result<(), ColorParseError> {
        self.state.stroke_style = Color::parse(style)?;
        Ok(())
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill_style = color;
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke_style = color;
    }

    pub fn fill_style(&self) -> Color {
        self.state.fill_style
    }

    pub fn stroke_style(&self) -> Color {
        self.state.stroke_style
    }

    /// Zero, negative and non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    /// Opacity applied to every drawable created afterwards. Values outside `[0, 1]` are
    /// ignored.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        if all_finite(&[tx, ty]) {
            self.state.transform.translate(tx, ty);
        }
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        if all_finite(&[sx, sy]) {
            self.state.transform.scale(sx, sy);
        }
    }

    pub fn rotate(&mut self, radians: f32) {
        if radians.is_finite() {
            self.state.transform.rotate(radians);
        }
    }

    /// Multiplies the current transform by `[a c e; b d f; 0 0 1]`.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        if all_finite(&[a, b, c, d, e, f]) {
            self.state.transform.multiply(&Transform::new(a, b, c, d, e, f));
        }
    }

    pub fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        if all_finite(&[a, b, c, d, e, f]) {
            self.state.transform = Transform::new(a, b, c, d, e, f);
        }
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::identity();
    }

    pub fn current_transform(&self) -> Transform {
        self.state.transform
    }

    /// Pushes the style state and transform. The current path is not part of it.
    pub fn save(&mut self) {
        self.state_stack.push(self.state.clone());
    }

    /// Pops the last saved state. Does nothing when nothing was saved.
    pub fn restore(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }
}
