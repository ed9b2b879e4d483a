use super::*;
use crate::vertex::Vertex;

impl<D: GpuDevice> Canvas<D> {
    /// Fills a rectangle with the fill style. Bypasses the current path.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), CanvasError> {
        if !all_finite(&[x, y, width, height]) || width == 0.0 || height == 0.0 {
            return Ok(());
        }
        let mesh = Shape::rect(x, y, width, height).tessellate(&self.fill_paint());
        self.push_solid(&mesh, self.state.fill_style)
    }

    /// Strokes the outline of a rectangle with the stroke style and line width. Corners are
    /// not mitered.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), CanvasError> {
        if !all_finite(&[x, y, width, height]) {
            return Ok(());
        }
        let mesh = Shape::rect(x, y, width, height).tessellate(&self.stroke_paint());
        self.push_solid(&mesh, self.state.stroke_style)
    }

    /// Clears a rectangle to transparent black.
    ///
    /// With [`ClearRectMode::Clip`] only the transformed rectangle's device-pixel bounds are
    /// cleared; with [`ClearRectMode::FullBuffer`] the whole buffer is. The clear is retained
    /// in the display list, so it keeps its place in painter's order on every redraw. Earlier
    /// drawables stay retained even when the clear hides them; only [`Canvas::reset`] drops them.
    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !all_finite(&[x, y, width, height]) {
            return;
        }
        let viewport = self.device.viewport();
        let rect = match self.config.clear_rect_mode {
            ClearRectMode::FullBuffer => None,
            ClearRectMode::Clip => {
                let transform = &self.state.transform;
                let corners = [
                    transform.transform_point(x, y),
                    transform.transform_point(x + width, y),
                    transform.transform_point(x, y + height),
                    transform.transform_point(x + width, y + height),
                ];
                let (mut left, mut top) = (f32::INFINITY, f32::INFINITY);
                let (mut right, mut bottom) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
                for (cx, cy) in corners {
                    left = left.min(cx);
                    top = top.min(cy);
                    right = right.max(cx);
                    bottom = bottom.max(cy);
                }
                let scale = self.config.scale;
                let Some(rect) = PixelRect::clamped(
                    left * scale,
                    top * scale,
                    (right - left) * scale,
                    (bottom - top) * scale,
                    viewport,
                ) else {
                    return;
                };
                Some(rect)
            }
        };

        self.display_list.push(DisplayItem::Clear(rect));
        self.dirty = true;
    }

    pub fn begin_path(&mut self) {
        self.path.begin_path();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(x, y);
    }

    /// Appends a point to the last subpath, or starts one at `(x, y)` when there is none.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(x, y);
    }

    pub fn close_path(&mut self) {
        self.path.close_path();
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.path.rect(x, y, width, height);
    }

    /// See [`Path::arc`].
    pub fn arc(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        self.path
            .arc(x, y, radius, start_angle, end_angle, anticlockwise)
    }

    /// The current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fills every subpath of the current path as one drawable. The path is kept.
    pub fn fill(&mut self) -> Result<(), CanvasError> {
        let mesh = tessellate_path(&self.path, &self.fill_paint());
        self.push_solid(&mesh, self.state.fill_style)
    }

    /// Strokes every subpath of the current path as one drawable. The path is kept.
    pub fn stroke(&mut self) -> Result<(), CanvasError> {
        let mesh = tessellate_path(&self.path, &self.stroke_paint());
        self.push_solid(&mesh, self.state.stroke_style)
    }

    /// Draws `text` with the fill style, `(x, y)` being the top-left of the line.
    ///
    /// Until the font is loaded the call is queued with the style it was made with, and
    /// drawn on the [`Canvas::frame_tick`] that sees the font arrive.
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), CanvasError> {
        if !all_finite(&[x, y]) {
            return Ok(());
        }
        let run = TextRun {
            text: text.to_string(),
            x,
            y,
            color: self.state.fill_style,
            alpha: self.state.global_alpha,
            transform: self.state.transform,
        };
        match self.text.submit(run)? {
            Some(run) => self.push_text(&run),
            None => {
                debug!(pending = self.text.pending(), "queued text until the font is ready");
                Ok(())
            }
        }
    }

    fn fill_paint(&self) -> Paint {
        Paint::Fill {
            color: self.state.fill_style,
            alpha: self.state.global_alpha,
        }
    }

    fn stroke_paint(&self) -> Paint {
        Paint::Stroke(
            Stroke::new(self.state.line_width, self.state.stroke_style)
                .with_alpha(self.state.global_alpha),
        )
    }

    fn push_solid(&mut self, mesh: &Mesh, tint: Color) -> Result<(), CanvasError> {
        self.push_drawable(
            mesh,
            self.state.transform,
            tint,
            self.state.global_alpha,
            Material::Solid,
        )
    }

    pub(super) fn push_text(&mut self, run: &TextRun) -> Result<(), CanvasError> {
        let texture = match self.atlas_texture {
            Some(texture) => texture,
            None => {
                let Some(atlas) = self.text.atlas() else {
                    return Ok(());
                };
                let texture =
                    self.device
                        .create_texture(atlas.width(), atlas.height(), atlas.pixels())?;
                self.atlas_texture = Some(texture);
                texture
            }
        };
        let Some(layout) = self.text.layout(run) else {
            return Ok(());
        };
        self.push_drawable(
            &layout.mesh,
            run.transform,
            run.color,
            run.alpha,
            Material::Glyph(texture),
        )
    }

    /// Uploads `mesh` and appends it to the display list. Empty meshes are dropped without
    /// touching the device.
    fn push_drawable<V: Vertex>(
        &mut self,
        mesh: &Mesh<V>,
        transform: Transform,
        tint: Color,
        alpha: f32,
        material: Material,
    ) -> Result<(), CanvasError> {
        if mesh.is_empty() {
            return Ok(());
        }
        let mesh = GpuMesh::upload(&mut self.device, mesh)?;
        self.display_list.push(DisplayItem::Draw(Drawable {
            mesh,
            transform,
            tint,
            alpha,
            material,
        }));
        self.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftwareDevice;

    fn canvas() -> Canvas<SoftwareDevice> {
        Canvas::new(
            SoftwareDevice::new(100, 50).unwrap(),
            CanvasConfig::new(100, 50),
        )
        .unwrap()
    }

    #[test]
    fn empty_path_fill_creates_nothing() {
        let mut canvas = canvas();
        canvas.begin_path();
        canvas.fill().unwrap();
        canvas.stroke().unwrap();
        assert_eq!(canvas.drawable_count(), 0);
        assert_eq!(canvas.stats().buffers_created, 0);
    }

    #[test]
    fn fill_keeps_the_path() {
        let mut canvas = canvas();
        canvas.rect(10.0, 10.0, 20.0, 20.0);
        canvas.fill().unwrap();
        canvas.fill().unwrap();
        assert_eq!(canvas.drawable_count(), 2);
        assert!(!canvas.path().is_empty());
    }

    #[test]
    fn degenerate_and_non_finite_rects_are_ignored() {
        let mut canvas = canvas();
        canvas.fill_rect(0.0, 0.0, 0.0, 10.0).unwrap();
        canvas.fill_rect(f32::NAN, 0.0, 10.0, 10.0).unwrap();
        canvas.stroke_rect(0.0, 0.0, f32::INFINITY, 10.0).unwrap();
        canvas.stroke_rect(5.0, 5.0, 0.0, 0.0).unwrap();
        assert_eq!(canvas.drawable_count(), 0);
    }

    #[test]
    fn drawables_capture_style_at_creation() {
        let mut canvas = canvas();
        canvas.set_fill_color(Color::rgb(255, 0, 0));
        canvas.set_global_alpha(0.5);
        canvas.translate(3.0, 4.0);
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        canvas.set_fill_color(Color::rgb(0, 0, 255));
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();

        let drawables: Vec<_> = canvas.drawables().collect();
        assert_eq!(drawables[0].tint, Color::rgb(255, 0, 0));
        assert_eq!(drawables[0].alpha, 0.5);
        assert_eq!(drawables[0].transform, Transform::translation(3.0, 4.0));
        assert_eq!(drawables[0].material, Material::Solid);
        assert_eq!(drawables[1].tint, Color::rgb(0, 0, 255));
    }

    #[test]
    fn clears_keep_earlier_drawables() {
        let mut canvas = canvas();
        canvas.set_fill_style("#f00").unwrap();
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        canvas.clear_rect(20.0, 0.0, 10.0, 10.0);
        canvas.clear_rect(-5.0, -5.0, 200.0, 200.0);
        assert_eq!(canvas.drawable_count(), 1);
        assert_eq!(canvas.stats().live_buffers(), 1);

        // The clear still wins in painter's order.
        let pixels = canvas.read_pixels().unwrap();
        assert_eq!(&pixels[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn full_buffer_clear_keeps_earlier_drawables() {
        let config = CanvasConfig::new(100, 50).with_clear_rect_mode(ClearRectMode::FullBuffer);
        let mut canvas = Canvas::new(SoftwareDevice::new(100, 50).unwrap(), config).unwrap();
        canvas.set_fill_style("#f00").unwrap();
        canvas.fill_rect(0.0, 0.0, 100.0, 50.0).unwrap();
        canvas.fill_rect(10.0, 10.0, 20.0, 20.0).unwrap();
        canvas.clear_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(canvas.drawable_count(), 2);
        assert_eq!(canvas.stats().live_buffers(), 2);

        let pixels = canvas.read_pixels().unwrap();
        let offset = (20 * 100 + 20) * 4;
        assert_eq!(&pixels[offset..offset + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn fill_text_without_a_font_loader_fails() {
        let mut canvas = canvas();
        assert!(matches!(
            canvas.fill_text("hi", 0.0, 0.0),
            Err(CanvasError::Font(crate::text::FontError::NoFontSource))
        ));
    }

    #[test]
    fn negative_arc_radius_is_reported() {
        let mut canvas = canvas();
        let error = canvas.arc(0.0, 0.0, -1.0, 0.0, 1.0, false).unwrap_err();
        assert_eq!(error.to_string(), "The radius provided (-1) is negative.");
        canvas.arc(0.0, 0.0, f32::NAN, 0.0, 1.0, false).unwrap();
        assert!(canvas.path().is_empty());
    }
}
