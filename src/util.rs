pub fn normalize_rgba_color(color: &[u8; 4]) -> [f32; 4] {
    [
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        color[3] as f32 / 255.0,
    ]
}

/// Converts a logical canvas size into device pixels, rounding up.
pub fn to_physical(logical_size: (u32, u32), scale_factor: f32) -> (u32, u32) {
    let (logical_width, logical_height) = logical_size;
    let physical_width = (logical_width as f64 * scale_factor as f64).ceil();
    let physical_height = (logical_height as f64 * scale_factor as f64).ceil();
    (physical_width as u32, physical_height as u32)
}

/// Returns `(unpadded, padded)` bytes per row for a texture-to-buffer copy.
pub fn compute_padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(alignment) * alignment;
    (unpadded_bytes_per_row, padded_bytes_per_row)
}

pub fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

#[inline]
pub fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_rounds_up() {
        assert_eq!(to_physical((100, 50), 1.0), (100, 50));
        assert_eq!(to_physical((100, 50), 1.5), (150, 75));
        assert_eq!(to_physical((3, 3), 1.25), (4, 4));
    }

    #[test]
    fn padded_rows_are_aligned() {
        assert_eq!(compute_padded_bytes_per_row(64, 4), (256, 256));
        assert_eq!(compute_padded_bytes_per_row(100, 4), (400, 512));
        assert_eq!(compute_padded_bytes_per_row(1, 4), (4, 256));
    }

    #[test]
    fn finite_check() {
        assert!(all_finite(&[0.0, -1.0, 1e30]));
        assert!(!all_finite(&[0.0, f32::NAN]));
        assert!(!all_finite(&[f32::NEG_INFINITY]));
    }
}
