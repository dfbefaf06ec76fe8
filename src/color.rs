//! Cell colors: palette registers and 8-bit-per-channel RGBA.
//!
//! A cell color is either a palette register ([`Color::Register`], 0-255) or an
//! explicit RGBA quadruple ([`Color::Rgb`]). The 256-register codec stores
//! registers only; the true-color codec stores RGBA. Conversions between the
//! two follow the xterm 256-color palette.
//!
//! # Examples
//!
//! ```
//! use screenbuffer::color::{Color, Rgba, named_color};
//!
//! assert_eq!(named_color("bright-red"), Some(9));
//! assert_eq!(named_color("grey"), Some(8));
//!
//! let teal = Rgba::from_hex("#008080").unwrap();
//! assert_eq!(Color::Rgb(teal).to_register(), 30);
//! ```

use std::fmt;

/// RGBA color with u8 components.
///
/// Alpha 255 is fully opaque, 0 fully transparent. Alpha only matters while
/// blending; terminal output ignores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create a color from RGBA components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from RGB components.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Return the same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Check whether the color is fully opaque.
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Check whether the color is fully transparent.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Parse a hex color string (e.g., "#FF0000" or "FF0000").
    ///
    /// Supports 3-char (#RGB), 6-char (#RRGGBB), and 8-char (#RRGGBBAA) formats.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }

        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Convert to the nearest 256-color palette register.
    ///
    /// Uses the 6x6x6 color cube (16-231) or the grayscale ramp (232-255)
    /// depending on which is the closer match.
    #[must_use]
    pub fn to_256_color(self) -> u8 {
        let Self { r, g, b, .. } = self;

        let gray = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
        let is_grayscale = (i16::from(r) - i16::from(gray)).abs() < 10
            && (i16::from(g) - i16::from(gray)).abs() < 10
            && (i16::from(b) - i16::from(gray)).abs() < 10;

        if is_grayscale {
            // The ramp has no pure black or white; the cube corners do.
            if gray < 4 {
                return 16;
            }
            if gray > 246 {
                return 231;
            }
            let gray_idx = (u16::from(gray) * 24 / 256) as u8;
            return 232 + gray_idx.min(23);
        }

        let ri = nearest_cube_index(r);
        let gi = nearest_cube_index(g);
        let bi = nearest_cube_index(b);

        16 + 36 * ri + 6 * gi + bi
    }

    /// Create an opaque color from a 256-color palette register.
    #[must_use]
    pub fn from_256_color(index: u8) -> Self {
        match index {
            0..=15 => {
                let (r, g, b) = ANSI_PALETTE[index as usize];
                Self::rgb(r, g, b)
            }
            16..=231 => {
                let idx = index - 16;
                let r = (idx / 36) % 6;
                let g = (idx / 6) % 6;
                let b = idx % 6;
                Self::rgb(
                    CUBE_VALUES[r as usize],
                    CUBE_VALUES[g as usize],
                    CUBE_VALUES[b as usize],
                )
            }
            232..=255 => {
                let gray = 8 + (index - 232) * 10;
                Self::rgb(gray, gray, gray)
            }
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b, a } = *self;
        if a == 255 {
            write!(f, "#{r:02X}{g:02X}{b:02X}")
        } else {
            write!(f, "#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

const CUBE_VALUES: [u8; 6] = [0, 95, 135, 175, 215, 255];

#[rustfmt::skip]
const ANSI_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),       // 0 black
    (128, 0, 0),     // 1 red
    (0, 128, 0),     // 2 green
    (128, 128, 0),   // 3 yellow
    (0, 0, 128),     // 4 blue
    (128, 0, 128),   // 5 magenta
    (0, 128, 128),   // 6 cyan
    (192, 192, 192), // 7 white
    (128, 128, 128), // 8 bright black (gray)
    (255, 0, 0),     // 9 bright red
    (0, 255, 0),     // 10 bright green
    (255, 255, 0),   // 11 bright yellow
    (0, 0, 255),     // 12 bright blue
    (255, 0, 255),   // 13 bright magenta
    (0, 255, 255),   // 14 bright cyan
    (255, 255, 255), // 15 bright white
];

/// Boundaries are the midpoints between cube values: 48, 115, 155, 195, 235.
#[inline]
fn nearest_cube_index(val: u8) -> u8 {
    if val < 48 {
        0
    } else if val < 115 {
        1
    } else if val < 155 {
        2
    } else if val < 195 {
        3
    } else if val < 235 {
        4
    } else {
        5
    }
}

const BASE_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

/// Resolve an ANSI color name to its register.
///
/// Matching ignores case and the separators `-`, `_` and space, so
/// `"bright-red"`, `"brightRed"` and `"BRIGHT_RED"` are the same name.
/// `gray`/`grey` alias register 8 (bright black).
#[must_use]
pub fn named_color(name: &str) -> Option<u8> {
    let key: String = name
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if key == "gray" || key == "grey" {
        return Some(8);
    }

    let (base, offset) = match key.strip_prefix("bright") {
        Some(rest) => (rest, 8),
        None => (key.as_str(), 0),
    };

    BASE_NAMES
        .iter()
        .position(|&n| n == base)
        .map(|i| i as u8 + offset)
}

/// A cell color as stored in an attribute record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    /// Palette register 0-255.
    Register(u8),
    /// Explicit RGBA value.
    Rgb(Rgba),
}

impl Color {
    /// Register view of this color, mapping RGB to the nearest register.
    #[must_use]
    pub fn to_register(self) -> u8 {
        match self {
            Self::Register(n) => n,
            Self::Rgb(c) => c.to_256_color(),
        }
    }

    /// RGBA view of this color, mapping registers through the palette.
    #[must_use]
    pub fn to_rgba(self) -> Rgba {
        match self {
            Self::Register(n) => Rgba::from_256_color(n),
            Self::Rgb(c) => c,
        }
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Self::Rgb(c)
    }
}

impl From<u8> for Color {
    fn from(n: u8) -> Self {
        Self::Register(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_formats() {
        assert_eq!(Rgba::from_hex("#F00"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(Rgba::from_hex("00ff00"), Some(Rgba::rgb(0, 255, 0)));
        assert_eq!(
            Rgba::from_hex("#0000FF80"),
            Some(Rgba::new(0, 0, 255, 0x80))
        );
        assert_eq!(Rgba::from_hex("#12345"), None);
        assert_eq!(Rgba::from_hex("#GGGGGG"), None);
        assert_eq!(Rgba::from_hex("#ééé"), None);
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(named_color("black"), Some(0));
        assert_eq!(named_color("white"), Some(7));
        assert_eq!(named_color("gray"), Some(8));
        assert_eq!(named_color("grey"), Some(8));
        assert_eq!(named_color("bright-black"), Some(8));
        assert_eq!(named_color("brightRed"), Some(9));
        assert_eq!(named_color("BRIGHT_WHITE"), Some(15));
        assert_eq!(named_color("bright-grey"), None);
        assert_eq!(named_color("purple"), None);
    }

    #[test]
    fn test_palette_roundtrip_cube_and_ramp() {
        for idx in 16..=255u8 {
            let rgba = Rgba::from_256_color(idx);
            let back = rgba.to_256_color();
            // Cube grays (e.g. 59, 102) land on the ramp; compare colors instead.
            let again = Rgba::from_256_color(back);
            let d = |a: u8, b: u8| (i16::from(a) - i16::from(b)).abs();
            assert!(
                d(rgba.r, again.r) <= 20 && d(rgba.g, again.g) <= 20 && d(rgba.b, again.b) <= 20,
                "register {idx} -> {back}"
            );
        }
    }

    #[test]
    fn test_pure_extremes_use_cube_corners() {
        assert_eq!(Rgba::BLACK.to_256_color(), 16);
        assert_eq!(Rgba::WHITE.to_256_color(), 231);
        assert_eq!(Rgba::rgb(255, 0, 0).to_256_color(), 196);
    }

    #[test]
    fn test_color_conversions() {
        assert_eq!(Color::Register(9).to_rgba(), Rgba::rgb(255, 0, 0));
        assert_eq!(Color::Rgb(Rgba::rgb(0, 0, 255)).to_register(), 21);
        assert_eq!(Color::from(3u8), Color::Register(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rgba::rgb(1, 2, 255).to_string(), "#0102FF");
        assert_eq!(Rgba::new(1, 2, 3, 4).to_string(), "#01020304");
    }
}
