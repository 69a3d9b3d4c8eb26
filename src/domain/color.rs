//! RGBA colors parsed from `#RRGGBB` / `#RRGGBBAA` notation.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Rgba> for (u8, u8, u8, u8) {
    fn from(color: Rgba) -> Self {
        (color.r, color.g, color.b, color.a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color `{0}`: expected #RRGGBB or #RRGGBBAA")]
    Length(String),
    #[error("invalid color `{0}`: non-hexadecimal digit")]
    Digit(String),
}

/// Parse `#RRGGBB` (opaque) or `#RRGGBBAA`. The leading `#` is optional.
pub fn parse_color(value: &str) -> Result<Rgba, ColorError> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return Err(ColorError::Length(value.to_string()));
    }

    let channel = |index: usize| {
        u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16)
            .map_err(|_| ColorError::Digit(value.to_string()))
    };

    let alpha = if hex.len() == 8 { channel(3)? } else { 0xFF };
    Ok(Rgba::new(channel(0)?, channel(1)?, channel(2)?, alpha))
}
