//! RGB colors and the named palette

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TableError};

/// A single pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Named colors accepted by `tablecolors` and the `--right/--left/--top/--bottom` flags.
pub const PALETTE: [(&str, Color); 8] = [
    ("red", Color::new(0xff, 0x00, 0x00)),
    ("green", Color::new(0x00, 0xff, 0x00)),
    ("blue", Color::new(0x00, 0x00, 0xff)),
    ("cyan", Color::new(0x00, 0xff, 0xff)),
    ("yellow", Color::new(0xff, 0xff, 0x00)),
    ("purple", Color::new(0xff, 0x00, 0xbf)),
    ("orange", Color::new(0xff, 0x80, 0x00)),
    ("white", Color::new(0xff, 0xff, 0xff)),
];

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Look up a palette color by name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        PALETTE
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, color)| *color)
    }

    /// Parse a `rrggbb` hex triple, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(TableError::validation(format!("invalid hex color '{hex}'")));
        }
        Ok(Self::new(
            parse_channel(&digits[0..2])?,
            parse_channel(&digits[2..4])?,
            parse_channel(&digits[4..6])?,
        ))
    }

    /// Scale all three channels, truncating towards zero.
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |channel: u8| (f64::from(channel) * factor) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Parse one hex-encoded channel byte (`"ff"`, `"0"`, `"80"`).
pub(crate) fn parse_channel(field: &str) -> Result<u8> {
    let field = field.trim();
    u8::from_str_radix(field, 16)
        .map_err(|e| TableError::validation(format!("invalid color channel '{field}': {e}")))
}

impl FromStr for Color {
    type Err = TableError;

    /// Accepts a palette name, `#rrggbb` or `rrggbb`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(color) = Self::named(s) {
            return Ok(color);
        }
        Self::from_hex(s).map_err(|_| TableError::validation(format!("unknown color '{s}'")))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_lookup_is_case_insensitive() {
        assert_eq!(Color::named("red"), Some(Color::new(255, 0, 0)));
        assert_eq!(Color::named("Purple"), Some(Color::new(0xff, 0x00, 0xbf)));
        assert_eq!(Color::named("magenta"), None);
    }

    #[test]
    fn parses_names_and_hex() {
        assert_eq!("orange".parse::<Color>().unwrap(), Color::new(0xff, 0x80, 0x00));
        assert_eq!("#00ff7f".parse::<Color>().unwrap(), Color::new(0x00, 0xff, 0x7f));
        assert_eq!("0a0B0c".parse::<Color>().unwrap(), Color::new(0x0a, 0x0b, 0x0c));
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "#12345", "zzzzzz", "#1234567", "mauve", "ééé"] {
            let err = input.parse::<Color>().unwrap_err();
            assert!(matches!(err, TableError::Validation { .. }), "{input}: {err}");
        }
    }

    #[test]
    fn scaling_truncates() {
        let color = Color::new(255, 100, 1);
        assert_eq!(color.scaled(1.0), color);
        assert_eq!(color.scaled(0.5), Color::new(127, 50, 0));
        assert_eq!(color.scaled(0.0), Color::default());
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(Color::new(0xff, 0x80, 0x00).to_string(), "#ff8000");
    }
}
