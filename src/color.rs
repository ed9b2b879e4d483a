use std::sync::OnceLock;

use regex::Regex;

use crate::error::ColorParseError;
use crate::util::normalize_rgba_color;

/// Represents a color in RGBA format.
///
/// Style strings (`fillStyle`, `strokeStyle`) resolve to an opaque `Color`, which can be
/// packed into a `0xRRGGBB` integer for the `tint` uniform.
///
/// # Examples
///
/// ```
/// use canvas2d::Color;
///
/// let red = Color::rgb(255, 0, 0);
/// assert_eq!(red.normalize(), [1.0, 0.0, 0.0, 1.0]);
///
/// let parsed = Color::parse("#0f0").unwrap();
/// assert_eq!(parsed, Color::rgb(0, 255, 0));
/// assert_eq!(parsed.to_packed_rgb(), 0x00ff00);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// A transparent color.
    ///
    /// All color channels are set to zero, making the color fully transparent.
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    /// A black color.
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    /// A white color.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Creates a new color with the specified RGB values and full opacity.
    ///
    /// ```
    /// use canvas2d::Color;
    ///
    /// let green = Color::rgb(0, 255, 0);
    /// assert_eq!(green, Color([0, 255, 0, 255]));
    /// ```
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Creates a new color with the specified RGBA values.
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Builds an opaque color from a packed `0xRRGGBB` integer. Bits above 24 are ignored.
    ///
    /// ```
    /// use canvas2d::Color;
    ///
    /// assert_eq!(Color::from_packed_rgb(0x66ccff), Color::rgb(0x66, 0xcc, 0xff));
    /// ```
    pub fn from_packed_rgb(packed: u32) -> Self {
        Self::rgb(
            ((packed >> 16) & 0xff) as u8,
            ((packed >> 8) & 0xff) as u8,
            (packed & 0xff) as u8,
        )
    }

    /// Packs the RGB channels into `0xRRGGBB`, dropping alpha.
    pub fn to_packed_rgb(&self) -> u32 {
        ((self.0[0] as u32) << 16) | ((self.0[1] as u32) << 8) | self.0[2] as u32
    }

    /// The RGB triple in `[0.0, 1.0]`, as uploaded to the `tint` uniform.
    pub fn tint(&self) -> [f32; 3] {
        let [r, g, b, _] = self.normalize();
        [r, g, b]
    }

    /// Normalizes the color values to the range [0.0, 1.0].
    ///
    /// ```
    /// use canvas2d::Color;
    ///
    /// let red = Color::rgb(255, 0, 0);
    /// assert_eq!(red.normalize(), [1.0, 0.0, 0.0, 1.0]);
    /// ```
    pub fn normalize(&self) -> [f32; 4] {
        normalize_rgba_color(&self.0)
    }

    /// Returns the color as an array of 4 `u8` values.
    pub fn to_array(&self) -> [u8; 4] {
        self.0
    }

    /// Parses a CSS color in one of the forms `#rgb`, `#rrggbb` or `rgb(r, g, b)`.
    ///
    /// Anything else is rejected rather than silently defaulting.
    ///
    /// ```
    /// use canvas2d::Color;
    ///
    /// assert_eq!(Color::parse("#ff0000").unwrap(), Color::rgb(255, 0, 0));
    /// assert_eq!(Color::parse("rgb(0, 128, 255)").unwrap(), Color::rgb(0, 128, 255));
    /// assert!(Color::parse("red").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ColorParseError::Empty);
        }

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError::InvalidHex(input.to_string()));
        }

        let Some(captures) = rgb_function_regex().captures(trimmed) else {
            return Err(ColorParseError::Unsupported(input.to_string()));
        };

        let mut channels = [0u8; 3];
        for (index, channel) in channels.iter_mut().enumerate() {
            let value: u32 = captures[index + 1].parse().map_err(|_| {
                ColorParseError::ComponentOutOfRange {
                    input: input.to_string(),
                    component: index as u32,
                }
            })?;
            *channel = u8::try_from(value).map_err(|_| ColorParseError::ComponentOutOfRange {
                input: input.to_string(),
                component: index as u32,
            })?;
        }

        Ok(Self::rgb(channels[0], channels[1], channels[2]))
    }
}

impl std::str::FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn rgb_function_regex() -> &'static Regex {
    static RGB_FUNCTION: OnceLock<Regex> = OnceLock::new();
    RGB_FUNCTION.get_or_init(|| {
        Regex::new(r"^(?i:rgb)\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$")
            .expect("rgb() pattern is valid")
    })
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let packed = u32::from_str_radix(hex, 16).ok()?;
            // #abc expands to #aabbcc
            let expand = |nibble: u32| ((nibble & 0xf) * 0x11) as u8;
            Some(Color::rgb(
                expand(packed >> 8),
                expand(packed >> 4),
                expand(packed),
            ))
        }
        6 => u32::from_str_radix(hex, 16).ok().map(Color::from_packed_rgb),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_hex() {
        assert_eq!(Color::parse("#0f0").unwrap(), Color::rgb(0, 255, 0));
        assert_eq!(Color::parse("#ABC").unwrap(), Color::rgb(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn parses_long_hex() {
        assert_eq!(Color::parse("#66ccff").unwrap().to_packed_rgb(), 0x66ccff);
        assert_eq!(Color::parse("  #FF3300 ").unwrap(), Color::rgb(255, 0x33, 0));
    }

    #[test]
    fn parses_rgb_function() {
        assert_eq!(
            Color::parse("rgb(255,0,0)").unwrap(),
            Color::rgb(255, 0, 0)
        );
        assert_eq!(
            Color::parse("rgb( 12 , 34 , 56 )").unwrap(),
            Color::rgb(12, 34, 56)
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Color::parse(""), Err(ColorParseError::Empty));
        assert!(matches!(
            Color::parse("#12"),
            Err(ColorParseError::InvalidHex(_))
        ));
        assert!(matches!(
            Color::parse("#gggggg"),
            Err(ColorParseError::InvalidHex(_))
        ));
        assert!(matches!(
            Color::parse("green"),
            Err(ColorParseError::Unsupported(_))
        ));
        assert!(matches!(
            Color::parse("rgb(1,2)"),
            Err(ColorParseError::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert_eq!(
            Color::parse("rgb(0,256,0)"),
            Err(ColorParseError::ComponentOutOfRange {
                input: "rgb(0,256,0)".to_string(),
                component: 1,
            })
        );
    }

    #[test]
    fn packs_and_unpacks() {
        let color = Color::from_packed_rgb(0x123456);
        assert_eq!(color.to_array(), [0x12, 0x34, 0x56, 255]);
        assert_eq!(color.to_packed_rgb(), 0x123456);
        assert_eq!(Color::rgb(255, 0, 255).tint(), [1.0, 0.0, 1.0]);
    }
}
