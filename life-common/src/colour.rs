use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque sRGB colour as used by the canvas and image surfaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour { red: 0, green: 0, blue: 0 };
    pub const WHITE: Colour = Colour { red: 255, green: 255, blue: 255 };

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Colour { red, green, blue }
    }

    /// Parses a CSS-style colour: `#rgb`, `#rrggbb` (the `#` is optional) or a
    /// CSS named colour such as `tomato`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(rgb) = Srgb::<u8>::from_str(text) {
            return Some(rgb.into());
        }
        palette::named::from_str(&text.to_ascii_lowercase()).map(Colour::from)
    }

    /// Lower-case `#rrggbb`, suitable for a canvas fill style.
    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    pub fn to_rgba(&self) -> [u8; 4] {
        [self.red, self.green, self.blue, 255]
    }
}

impl From<Srgb<u8>> for Colour {
    fn from(rgb: Srgb<u8>) -> Self {
        Colour { red: rgb.red, green: rgb.green, blue: rgb.blue }
    }
}

impl FromStr for Colour {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colour::parse(s).ok_or_else(|| anyhow::anyhow!("'{}' is not a recognised colour", s))
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl Default for Colour {
    fn default() -> Self {
        Colour::BLACK
    }
}
