//! Typed attribute records and the loose request form they are built from.
//!
//! Applications describe a cell's look with an [`AttrRequest`]: colors given
//! as names, register numbers, hex strings or RGB values, plus style
//! booleans. [`AttrRequest::resolve`] is the single, total conversion into an
//! [`Attr`]; anything unknown or out of range falls back to the default
//! white-on-black there, so the drawing hot path only ever sees valid data.
//!
//! # Examples
//!
//! ```
//! use screenbuffer::attr::{Attr, AttrRequest};
//! use screenbuffer::color::Color;
//! use screenbuffer::style::TextStyle;
//!
//! let attr = AttrRequest::new()
//!     .color("bright-yellow")
//!     .bg_color(4)
//!     .bold()
//!     .underline()
//!     .resolve();
//!
//! assert_eq!(attr.fg, Color::Register(11));
//! assert_eq!(attr.bg, Color::Register(4));
//! assert_eq!(attr.style, TextStyle::BOLD | TextStyle::UNDERLINE);
//!
//! // Out of range registers reset to the default.
//! assert_eq!(AttrRequest::new().color(300).resolve().fg, Attr::DEFAULT.fg);
//! ```

use crate::color::{Color, Rgba, named_color};
use crate::style::{CellFlags, TextStyle};

/// Register used for the default foreground (white).
pub const DEFAULT_FG_REGISTER: u8 = 7;
/// Register used for the default background (black).
pub const DEFAULT_BG_REGISTER: u8 = 0;

/// A cell's complete attribute record in typed form.
///
/// Codecs encode this into their fixed-size binary layout and decode it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Attr {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Style bits.
    pub style: TextStyle,
    /// Transparency and fullwidth flags.
    pub flags: CellFlags,
}

impl Attr {
    /// White on black, no style, no flags.
    pub const DEFAULT: Self = Self {
        fg: Color::Register(DEFAULT_FG_REGISTER),
        bg: Color::Register(DEFAULT_BG_REGISTER),
        style: TextStyle::empty(),
        flags: CellFlags::empty(),
    };

    /// Opaque white on opaque black, in RGB form.
    pub const DEFAULT_RGB: Self = Self {
        fg: Color::Rgb(Rgba::WHITE),
        bg: Color::Rgb(Rgba::BLACK),
        style: TextStyle::empty(),
        flags: CellFlags::empty(),
    };

    /// Create an attribute with the given colors and no style.
    #[must_use]
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            style: TextStyle::empty(),
            flags: CellFlags::empty(),
        }
    }

    /// Return the attribute with additional style bits.
    #[must_use]
    pub const fn with_style(self, style: TextStyle) -> Self {
        Self {
            style: self.style.union(style),
            ..self
        }
    }

    /// Return the attribute with additional flags.
    #[must_use]
    pub const fn with_flags(self, flags: CellFlags) -> Self {
        Self {
            flags: self.flags.union(flags),
            ..self
        }
    }

    /// Return the attribute with the fullwidth markers cleared.
    #[must_use]
    pub const fn without_fullwidth(self) -> Self {
        Self {
            flags: self.flags.difference(CellFlags::FULLWIDTH),
            ..self
        }
    }

    /// Convert back into the loose request form.
    #[must_use]
    pub fn to_request(&self) -> AttrRequest {
        let has = |bit| self.style.contains(bit);
        AttrRequest {
            color: Some(ColorSpec::from(self.fg)),
            bg_color: Some(ColorSpec::from(self.bg)),
            bold: has(TextStyle::BOLD),
            dim: has(TextStyle::DIM),
            italic: has(TextStyle::ITALIC),
            underline: has(TextStyle::UNDERLINE),
            blink: has(TextStyle::BLINK),
            inverse: has(TextStyle::INVERSE),
            hidden: has(TextStyle::HIDDEN),
            strike: has(TextStyle::STRIKE),
            style_transparency: self.flags.contains(CellFlags::STYLE_TRANSPARENCY),
            char_transparency: self.flags.contains(CellFlags::CHAR_TRANSPARENCY),
            fg_transparency: self.flags.contains(CellFlags::FG_TRANSPARENCY),
            bg_transparency: self.flags.contains(CellFlags::BG_TRANSPARENCY),
        }
    }
}

impl Default for Attr {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A color as an application may request it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorSpec {
    /// ANSI color name (`"red"`, `"bright-blue"`, `"grey"`) or hex string (`"#ff8800"`).
    Named(String),
    /// Palette register; values outside 0-255 resolve to the default.
    Index(i64),
    /// Explicit RGBA.
    Rgba(Rgba),
}

impl ColorSpec {
    /// Resolve to a stored color, or `None` if the request is invalid.
    #[must_use]
    pub fn resolve(&self) -> Option<Color> {
        match self {
            Self::Named(name) => {
                if name.starts_with('#') {
                    Rgba::from_hex(name).map(Color::Rgb)
                } else {
                    named_color(name).map(Color::Register)
                }
            }
            Self::Index(n) => u8::try_from(*n).ok().map(Color::Register),
            Self::Rgba(c) => Some(Color::Rgb(*c)),
        }
    }
}

impl From<&str> for ColorSpec {
    fn from(s: &str) -> Self {
        Self::Named(s.to_string())
    }
}

impl From<String> for ColorSpec {
    fn from(s: String) -> Self {
        Self::Named(s)
    }
}

impl From<i64> for ColorSpec {
    fn from(n: i64) -> Self {
        Self::Index(n)
    }
}

impl From<i32> for ColorSpec {
    fn from(n: i32) -> Self {
        Self::Index(i64::from(n))
    }
}

impl From<u8> for ColorSpec {
    fn from(n: u8) -> Self {
        Self::Index(i64::from(n))
    }
}

impl From<Rgba> for ColorSpec {
    fn from(c: Rgba) -> Self {
        Self::Rgba(c)
    }
}

impl From<Color> for ColorSpec {
    fn from(c: Color) -> Self {
        match c {
            Color::Register(n) => Self::Index(i64::from(n)),
            Color::Rgb(rgba) => Self::Rgba(rgba),
        }
    }
}

/// Loose attribute description with optional colors and style booleans.
///
/// Unset colors mean "default": white on black.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrRequest {
    pub color: Option<ColorSpec>,
    pub bg_color: Option<ColorSpec>,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub blink: bool,
    pub inverse: bool,
    pub hidden: bool,
    pub strike: bool,
    pub style_transparency: bool,
    pub char_transparency: bool,
    pub fg_transparency: bool,
    pub bg_transparency: bool,
}

impl AttrRequest {
    /// Empty request (default colors, no style).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the foreground color.
    #[must_use]
    pub fn color(mut self, color: impl Into<ColorSpec>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn bg_color(mut self, color: impl Into<ColorSpec>) -> Self {
        self.bg_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    #[must_use]
    pub fn blink(mut self) -> Self {
        self.blink = true;
        self
    }

    #[must_use]
    pub fn inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    #[must_use]
    pub fn strike(mut self) -> Self {
        self.strike = true;
        self
    }

    /// Keep the destination style when blitted with blending.
    #[must_use]
    pub fn style_transparency(mut self) -> Self {
        self.style_transparency = true;
        self
    }

    /// Keep the destination glyph when blitted with blending.
    #[must_use]
    pub fn char_transparency(mut self) -> Self {
        self.char_transparency = true;
        self
    }

    /// Keep the destination foreground when blitted with blending.
    #[must_use]
    pub fn fg_transparency(mut self) -> Self {
        self.fg_transparency = true;
        self
    }

    /// Keep the destination background when blitted with blending.
    #[must_use]
    pub fn bg_transparency(mut self) -> Self {
        self.bg_transparency = true;
        self
    }

    /// Resolve into a typed attribute.
    ///
    /// Invalid colors (unknown names, malformed hex, registers outside
    /// 0-255) fall back to the default white foreground / black background.
    #[must_use]
    pub fn resolve(&self) -> Attr {
        self.resolve_with(&Attr::DEFAULT)
    }

    /// Resolve, taking unset or invalid colors from `defaults`.
    ///
    /// Buffers use this with their codec's default so that an unset color
    /// means opaque white/black in true-color mode rather than a register.
    #[must_use]
    pub fn resolve_with(&self, defaults: &Attr) -> Attr {
        let fg = self
            .color
            .as_ref()
            .and_then(ColorSpec::resolve)
            .unwrap_or(defaults.fg);
        let bg = self
            .bg_color
            .as_ref()
            .and_then(ColorSpec::resolve)
            .unwrap_or(defaults.bg);

        let mut style = TextStyle::empty();
        style.set(TextStyle::BOLD, self.bold);
        style.set(TextStyle::DIM, self.dim);
        style.set(TextStyle::ITALIC, self.italic);
        style.set(TextStyle::UNDERLINE, self.underline);
        style.set(TextStyle::BLINK, self.blink);
        style.set(TextStyle::INVERSE, self.inverse);
        style.set(TextStyle::HIDDEN, self.hidden);
        style.set(TextStyle::STRIKE, self.strike);

        let mut flags = CellFlags::empty();
        flags.set(CellFlags::STYLE_TRANSPARENCY, self.style_transparency);
        flags.set(CellFlags::CHAR_TRANSPARENCY, self.char_transparency);
        flags.set(CellFlags::FG_TRANSPARENCY, self.fg_transparency);
        flags.set(CellFlags::BG_TRANSPARENCY, self.bg_transparency);

        Attr {
            fg,
            bg,
            style,
            flags,
        }
    }
}

impl From<AttrRequest> for Attr {
    fn from(req: AttrRequest) -> Self {
        req.resolve()
    }
}

impl From<&AttrRequest> for Attr {
    fn from(req: &AttrRequest) -> Self {
        req.resolve()
    }
}
