use super::*;

impl<D: GpuDevice> Canvas<D> {
    /// Builds a canvas on `device`, compiling both programs and computing the projection.
    ///
    /// The device viewport must be the physical size of `config`. A program that fails to
    /// compile makes construction fail instead of surfacing on the first redraw.
    pub fn new(mut device: D, config: CanvasConfig) -> Result<Self, CanvasError> {
        config.validate()?;
        let expected = config.physical_size();
        let actual = device.viewport();
        if actual != expected {
            return Err(CanvasError::ViewportMismatch { expected, actual });
        }

        let mut primitive_program = ShaderProgram::primitive(&mut device);
        let mut glyph_program = ShaderProgram::glyph(&mut device);
        let failure = primitive_program
            .failure()
            .or(glyph_program.failure())
            .cloned();
        if let Some(failure) = failure {
            primitive_program.release(&mut device);
            glyph_program.release(&mut device);
            return Err(failure.into());
        }

        let projection = Transform::projection(config.width as f32, config.height as f32);
        primitive_program.set_projection_matrix(&mut device, &projection)?;
        glyph_program.set_projection_matrix(&mut device, &projection)?;

        info!(
            width = config.width,
            height = config.height,
            scale = config.scale,
            "canvas created"
        );

        Ok(Self {
            text: TextRenderer::new(config.atlas),
            device,
            config,
            projection,
            primitive_program,
            glyph_program,
            path: Path::new(),
            state: DrawingState::default(),
            state_stack: Vec::new(),
            display_list: Vec::new(),
            atlas_texture: None,
            dirty: true,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Logical canvas space to clip space. Fixed for the canvas lifetime.
    pub fn projection(&self) -> &Transform {
        &self.projection
    }

    pub fn stats(&self) -> DeviceStats {
        self.device.stats()
    }

    /// Number of retained drawables. Clear items are not counted.
    pub fn drawable_count(&self) -> usize {
        self.display_list
            .iter()
            .filter(|item| matches!(item, DisplayItem::Draw(_)))
            .count()
    }

    /// The retained drawables in the order they are composited.
    pub fn drawables(&self) -> impl Iterator<Item = &Drawable> + '_ {
        self.display_list.iter().filter_map(|item| match item {
            DisplayItem::Draw(drawable) => Some(drawable),
            DisplayItem::Clear(_) => None,
        })
    }

    /// Whether the next [`Canvas::frame_tick`] redraws.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn text_state(&self) -> TextState {
        self.text.state()
    }

    /// Sets where `fill_text` gets its font from.
    pub fn set_font_loader(&mut self, loader: impl FontLoader + 'static) {
        self.text.set_loader(loader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftwareDevice;

    #[test]
    fn viewport_must_match_the_physical_size() {
        let device = SoftwareDevice::new(100, 50).unwrap();
        let result = Canvas::new(device, CanvasConfig::new(100, 50).with_scale(2.0));
        assert!(matches!(
            result,
            Err(CanvasError::ViewportMismatch {
                expected: (200, 100),
                actual: (100, 50)
            })
        ));
    }

    #[test]
    fn construction_links_both_programs() {
        let device = SoftwareDevice::new(100, 50).unwrap();
        let canvas = Canvas::new(device, CanvasConfig::new(100, 50)).unwrap();
        assert_eq!(canvas.stats().programs_created, 2);
        assert_eq!(canvas.drawable_count(), 0);
        assert!(canvas.is_dirty());
        assert_eq!(canvas.text_state(), TextState::Unloaded);
        let (x, y) = canvas.projection().transform_point(100.0, 50.0);
        assert!((x - 1.0).abs() < 1e-6 && (y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let device = SoftwareDevice::new(100, 50).unwrap();
        let result = Canvas::new(device, CanvasConfig::new(100, 50).with_scale(0.0));
        assert!(matches!(result, Err(CanvasError::InvalidArgument(_))));
    }
}
