/// A single pixel-color expectation to validate after rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelExpectation {
    pub x: u32,
    pub y: u32,
    pub expected: [u8; 4],
    /// Per-channel tolerance for comparison (default 5).
    pub tolerance: u8,
    /// Human-readable label for failure messages.
    pub label: &'static str,
}

impl PixelExpectation {
    pub fn new(x: u32, y: u32, rgba: [u8; 4], label: &'static str) -> Self {
        Self {
            x,
            y,
            expected: rgba,
            tolerance: 5,
            label,
        }
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Convenience: expect a fully opaque color.
    pub fn opaque(x: u32, y: u32, r: u8, g: u8, b: u8, label: &'static str) -> Self {
        Self::new(x, y, [r, g, b, 255], label)
    }

    /// Convenience: expect opaque green, the "pass" color of the canvas conformance scenes.
    pub fn green(x: u32, y: u32, label: &'static str) -> Self {
        Self::opaque(x, y, 0, 255, 0, label)
    }

    /// Convenience: expect a fully transparent pixel.
    pub fn transparent(x: u32, y: u32, label: &'static str) -> Self {
        Self::new(x, y, [0, 0, 0, 0], label)
    }
}

/// Validates pixel expectations against tightly packed RGBA8 rows, top row first, as returned
/// by `Canvas::read_pixels`.
///
/// Returns a list of human-readable failure descriptions. An empty list means
/// all expectations passed.
pub fn check_pixels(
    pixel_data: &[u8],
    width: u32,
    height: u32,
    expectations: &[PixelExpectation],
) -> Vec<String> {
    let mut failures = Vec::new();
    let stride = (width as usize) * 4;

    for expectation in expectations {
        if expectation.x >= width || expectation.y >= height {
            failures.push(format!(
                "[{}] pixel ({},{}) is outside canvas {}×{}",
                expectation.label, expectation.x, expectation.y, width, height,
            ));
            continue;
        }

        let offset = (expectation.y as usize) * stride + (expectation.x as usize) * 4;
        let Some(actual) = pixel_data.get(offset..offset + 4) else {
            failures.push(format!(
                "[{}] pixel ({},{}) is out of bounds (buffer len {})",
                expectation.label,
                expectation.x,
                expectation.y,
                pixel_data.len(),
            ));
            continue;
        };

        let tolerance = expectation.tolerance as i16;
        let matches = actual
            .iter()
            .zip(expectation.expected)
            .all(|(&actual, expected)| channel_matches(actual, expected, tolerance));

        if !matches {
            let [r, g, b, a] = expectation.expected;
            failures.push(format!(
                "[{}] pixel ({},{}) expected rgba({},{},{},{}) ±{} but got rgba({},{},{},{})",
                expectation.label,
                expectation.x,
                expectation.y,
                r,
                g,
                b,
                a,
                expectation.tolerance,
                actual[0],
                actual[1],
                actual[2],
                actual[3],
            ));
        }
    }

    failures
}

fn channel_matches(actual: u8, expected: u8, tolerance: i16) -> bool {
    let diff = (actual as i16) - (expected as i16);
    diff.abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_mismatches_and_out_of_range_pixels() {
        // 2x1: red, transparent
        let pixels = [255, 0, 0, 255, 0, 0, 0, 0];
        let expectations = [
            PixelExpectation::opaque(0, 0, 253, 2, 0, "red within tolerance"),
            PixelExpectation::transparent(1, 0, "clear"),
            PixelExpectation::green(0, 0, "wrong color"),
            PixelExpectation::transparent(2, 0, "outside"),
        ];
        let failures = check_pixels(&pixels, 2, 1, &expectations);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].starts_with("[wrong color]"));
        assert!(failures[1].contains("outside canvas"));
    }

    #[test]
    fn zero_tolerance_is_exact() {
        let pixels = [254, 0, 0, 255];
        let expectation = PixelExpectation::opaque(0, 0, 255, 0, 0, "exact").with_tolerance(0);
        assert_eq!(check_pixels(&pixels, 1, 1, &[expectation]).len(), 1);
    }
}
