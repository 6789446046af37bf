//! Annotation colors.

use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a CSS hex color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 3, 6 or 8 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color {0:?}")]
    BadDigit(String),
}

/// RGBA8 color, persisted as a CSS hex string (`#rrggbb` or `#rrggbbaa`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const RED: Self = Self::rgb(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if !hex.is_ascii() {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }

        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..=i], 16)
                .map(|v| v * 17)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };

        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ColorParseError::BadLength(s.to_string())),
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digits() {
        let c: Rgba = "#ff8000".parse().unwrap();
        assert_eq!(c, Rgba::rgb(255, 128, 0));
    }

    #[test]
    fn test_parse_short_and_alpha() {
        assert_eq!("#f00".parse::<Rgba>().unwrap(), Rgba::RED);
        assert_eq!("#00000080".parse::<Rgba>().unwrap(), Rgba::new(0, 0, 0, 128));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("ff0000".parse::<Rgba>(), Err(ColorParseError::MissingHash(_))));
        assert!(matches!("#ff00".parse::<Rgba>(), Err(ColorParseError::BadLength(_))));
        assert!(matches!("#gg0000".parse::<Rgba>(), Err(ColorParseError::BadDigit(_))));
    }

    #[test]
    fn test_display_omits_opaque_alpha() {
        assert_eq!(Rgba::rgb(1, 2, 3).to_string(), "#010203");
        assert_eq!(Rgba::new(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Rgba::RED).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Rgba = serde_json::from_str("\"#0000ff\"").unwrap();
        assert_eq!(back, Rgba::rgb(0, 0, 255));
        assert!(serde_json::from_str::<Rgba>("\"blue\"").is_err());
    }

    #[test]
    fn test_peniko_conversion() {
        let c = Rgba::new(10, 20, 30, 40);
        let color: Color = c.into();
        assert_eq!(Rgba::from(color), c);
    }
}
