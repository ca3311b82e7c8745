//! Background color parsing.
//!
//! Accepted forms: `#RRGGBB`, `#RGB`, and bare 8-digit `RRGGBBAA` (the Mii
//! Studio form). Lowercase digits are forgiven for all three.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Default clear color. Not all zeroes: a black clear color tints
    /// translucent parts (glasses) once composited.
    pub const TRANSPARENT_WHITE: Rgba = Rgba { r: 0xFF, g: 0xFF, b: 0xFF, a: 0x00 };

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::TRANSPARENT_WHITE
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid format, expected #RRGGBB, #RGB or RRGGBBAA")]
pub struct InvalidColor;

/// A parsed color plus the soft zero-alpha condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedColor {
    pub color: Rgba,
    /// Set when an 8-digit color carried alpha 0. The color is still used.
    pub alpha_zero: bool,
}

pub fn parse_hex_color(s: &str) -> Result<ParsedColor, InvalidColor> {
    if let Some(short) = s.strip_prefix('#').filter(|rest| rest.len() == 3) {
        let mut rgb = [0u8; 3];
        for (out, c) in rgb.iter_mut().zip(short.bytes()) {
            let digit = char::from(c).to_digit(16).ok_or(InvalidColor)?;
            // digit < 16, so the product fits
            *out = digit as u8 * 17;
        }
        let [r, g, b] = rgb;
        return Ok(ParsedColor { color: Rgba { r, g, b, a: 0xFF }, alpha_zero: false });
    }

    if let Some(long) = s.strip_prefix('#').filter(|rest| rest.len() == 6) {
        let mut rgb = [0u8; 3];
        hex::decode_to_slice(long, &mut rgb).map_err(|_| InvalidColor)?;
        let [r, g, b] = rgb;
        return Ok(ParsedColor { color: Rgba { r, g, b, a: 0xFF }, alpha_zero: false });
    }

    if s.len() == 8 {
        let mut rgba = [0u8; 4];
        hex::decode_to_slice(s, &mut rgba).map_err(|_| InvalidColor)?;
        let [r, g, b, a] = rgba;
        return Ok(ParsedColor { color: Rgba { r, g, b, a }, alpha_zero: a == 0 });
    }

    Err(InvalidColor)
}
