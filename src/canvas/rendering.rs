use super::*;

impl<D: GpuDevice> Canvas<D> {
    /// Clears the buffer and replays the whole display list, one draw call per drawable, in
    /// insertion order.
    pub fn redraw(&mut self) -> Result<(), CanvasError> {
        self.device.begin_frame()?;
        let drawn = self.draw_display_list();
        // The frame is closed even after a failed draw so the device is not left recording.
        let ended = self.device.end_frame();
        drawn?;
        ended?;
        self.dirty = false;
        debug!(items = self.display_list.len(), "redrew display list");
        Ok(())
    }

    fn draw_display_list(&mut self) -> Result<(), CanvasError> {
        self.device.clear(self.config.clear_color.normalize(), None)?;

        let mut bound: Option<Material> = None;
        for item in &self.display_list {
            let drawable = match item {
                DisplayItem::Clear(rect) => {
                    self.device.clear([0.0; 4], *rect)?;
                    continue;
                }
                DisplayItem::Draw(drawable) => drawable,
            };

            let program = match drawable.material {
                Material::Solid => &self.primitive_program,
                Material::Glyph(_) => &self.glyph_program,
            };
            if bound != Some(drawable.material) {
                program.bind(&mut self.device)?;
                let texture = match drawable.material {
                    Material::Solid => None,
                    Material::Glyph(texture) => Some(texture),
                };
                self.device.bind_texture(texture)?;
                bound = Some(drawable.material);
            }

            program.set_translation_matrix(&mut self.device, &drawable.transform)?;
            program.set_tint(&mut self.device, drawable.tint)?;
            program.set_alpha(&mut self.device, drawable.alpha)?;
            drawable.mesh.bind(&mut self.device)?.draw()?;
        }
        Ok(())
    }

    /// One tick of the frame loop: replays text whose font just arrived, then redraws if
    /// anything changed since the last redraw. Returns whether it drew.
    ///
    /// A font that failed to load is reported here, once. If drawing a replayed run fails, that
    /// run and the ones queued after it are dropped and the error is returned.
    pub fn frame_tick(&mut self) -> Result<bool, CanvasError> {
        if let Some(runs) = self.text.poll()? {
            for (index, run) in runs.iter().enumerate() {
                if let Err(error) = self.push_text(run) {
                    warn!(
                        dropped = runs.len() - index,
                        "failed to draw queued text, dropping the rest of the queue"
                    );
                    return Err(error);
                }
            }
        }
        if !self.dirty {
            return Ok(false);
        }
        self.redraw()?;
        Ok(true)
    }

    /// Premultiplied RGBA8 of the whole buffer, top row first. Redraws first if needed.
    pub fn read_pixels(&mut self) -> Result<Vec<u8>, CanvasError> {
        if self.dirty {
            self.redraw()?;
        }
        Ok(self.device.read_pixels()?)
    }

    /// Drops every drawable and the current path, and restores the default style. A loaded
    /// font is kept; text still waiting for it is dropped.
    pub fn reset(&mut self) {
        self.release_display_list();
        self.path.begin_path();
        self.state_stack.clear();
        self.state = DrawingState::default();
        self.text.discard_pending();
        self.dirty = true;
        info!("canvas reset");
    }

    pub(super) fn release_display_list(&mut self) {
        for item in self.display_list.drain(..) {
            if let DisplayItem::Draw(drawable) = item {
                drawable.mesh.release(&mut self.device);
            }
        }
    }

    /// Maps a device pixel position back into the current canvas user space. `None` when the
    /// current transform is not invertible.
    pub fn device_to_canvas(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let inverse = self.state.transform.invert()?;
        Some(inverse.transform_point(x / self.config.scale, y / self.config.scale))
    }
}
