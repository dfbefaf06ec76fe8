//! Style bits and per-cell blending flags.
//!
//! - [`TextStyle`]: the eight SGR style bits (bold, dim, italic, ...), stored
//!   as one byte in every attribute record.
//! - [`CellFlags`]: transparency and fullwidth markers, stored in the
//!   reserved/blending byte of the attribute record.

use bitflags::bitflags;

bitflags! {
    /// Text rendering style (bold, italic, underline, etc.).
    ///
    /// Bit positions are part of the binary file format and must not change.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TextStyle: u8 {
        /// Bold/increased intensity.
        const BOLD      = 0x01;
        /// Dim/decreased intensity.
        const DIM       = 0x02;
        /// Italic.
        const ITALIC    = 0x04;
        /// Underlined text.
        const UNDERLINE = 0x08;
        /// Blinking text.
        const BLINK     = 0x10;
        /// Swapped foreground/background.
        const INVERSE   = 0x20;
        /// Hidden/invisible text.
        const HIDDEN    = 0x40;
        /// Strikethrough text.
        const STRIKE    = 0x80;
    }
}

bitflags! {
    /// Per-cell blending and layout flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct CellFlags: u8 {
        /// Blending keeps the destination style bits.
        const STYLE_TRANSPARENCY = 0x01;
        /// Blending keeps the destination glyph.
        const CHAR_TRANSPARENCY  = 0x02;
        /// Blending keeps the destination foreground (register codec).
        const FG_TRANSPARENCY    = 0x04;
        /// Blending keeps the destination background (register codec).
        const BG_TRANSPARENCY    = 0x08;
        /// First half of a double-width glyph.
        const LEADING_FULLWIDTH  = 0x10;
        /// Second half of a double-width glyph; produces no terminal output.
        const TRAILING_FULLWIDTH = 0x20;
    }
}

impl CellFlags {
    /// Both halves of the fullwidth marker.
    pub const FULLWIDTH: Self = Self::LEADING_FULLWIDTH.union(Self::TRAILING_FULLWIDTH);

    /// Every transparency bit.
    pub const TRANSPARENCY: Self = Self::STYLE_TRANSPARENCY
        .union(Self::CHAR_TRANSPARENCY)
        .union(Self::FG_TRANSPARENCY)
        .union(Self::BG_TRANSPARENCY);

    /// Check whether both the style and the glyph are see-through.
    #[must_use]
    pub const fn is_style_and_char_transparent(self) -> bool {
        self.contains(Self::STYLE_TRANSPARENCY.union(Self::CHAR_TRANSPARENCY))
    }
}

/// Single style bits paired with their SGR on/off parameters.
///
/// Bold and dim share the off code `22`, which clears both.
const SGR_TABLE: [(TextStyle, u8, u8); 8] = [
    (TextStyle::BOLD, 1, 22),
    (TextStyle::DIM, 2, 22),
    (TextStyle::ITALIC, 3, 23),
    (TextStyle::UNDERLINE, 4, 24),
    (TextStyle::BLINK, 5, 25),
    (TextStyle::INVERSE, 7, 27),
    (TextStyle::HIDDEN, 8, 28),
    (TextStyle::STRIKE, 9, 29),
];

impl TextStyle {
    /// SGR parameter turning this single bit on.
    #[must_use]
    pub fn sgr_on(self) -> Option<u8> {
        SGR_TABLE
            .iter()
            .find(|(bit, _, _)| *bit == self)
            .map(|&(_, on, _)| on)
    }

    /// SGR parameter turning this single bit off.
    #[must_use]
    pub fn sgr_off(self) -> Option<u8> {
        SGR_TABLE
            .iter()
            .find(|(bit, _, _)| *bit == self)
            .map(|&(_, _, off)| off)
    }

    /// Iterate the single bits in SGR order.
    pub fn each_bit() -> impl Iterator<Item = TextStyle> {
        SGR_TABLE.iter().map(|&(bit, _, _)| bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_bit_positions() {
        assert_eq!(TextStyle::BOLD.bits(), 1);
        assert_eq!(TextStyle::DIM.bits(), 2);
        assert_eq!(TextStyle::ITALIC.bits(), 4);
        assert_eq!(TextStyle::UNDERLINE.bits(), 8);
        assert_eq!(TextStyle::BLINK.bits(), 16);
        assert_eq!(TextStyle::INVERSE.bits(), 32);
        assert_eq!(TextStyle::HIDDEN.bits(), 64);
        assert_eq!(TextStyle::STRIKE.bits(), 128);
        assert_eq!(TextStyle::all().bits(), 0xFF);
    }

    #[test]
    fn test_sgr_codes() {
        assert_eq!(TextStyle::BOLD.sgr_on(), Some(1));
        assert_eq!(TextStyle::STRIKE.sgr_on(), Some(9));
        assert_eq!(TextStyle::BOLD.sgr_off(), Some(22));
        assert_eq!(TextStyle::DIM.sgr_off(), Some(22));
        assert_eq!(TextStyle::INVERSE.sgr_off(), Some(27));
        assert_eq!((TextStyle::BOLD | TextStyle::DIM).sgr_on(), None);
    }

    #[test]
    fn test_cell_flag_groups() {
        assert!(CellFlags::FULLWIDTH.contains(CellFlags::LEADING_FULLWIDTH));
        assert!(CellFlags::TRANSPARENCY.contains(CellFlags::BG_TRANSPARENCY));
        assert!(!CellFlags::TRANSPARENCY.intersects(CellFlags::FULLWIDTH));
        assert!(
            (CellFlags::STYLE_TRANSPARENCY | CellFlags::CHAR_TRANSPARENCY)
                .is_style_and_char_transparent()
        );
        assert!(!CellFlags::STYLE_TRANSPARENCY.is_style_and_char_transparent());
    }
}
