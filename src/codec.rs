//! Binary cell codecs.
//!
//! A cell is stored as a fixed-size record: `ATTR_SIZE` attribute bytes
//! followed by a [`CHAR_SIZE`](crate::glyph::CHAR_SIZE)-byte glyph slot. The
//! attribute layout depends on the bit depth, chosen at the type level:
//!
//! | Codec | ATTR_SIZE | Layout |
//! |---|---|---|
//! | [`Codec256`] | 4 | little-endian `u32`: fg register, bg register, style, flags |
//! | [`CodecRgb`] | 10 | fg R,G,B,A · bg R,G,B,A · style · flags |
//!
//! Records are compared byte-for-byte during redraw, so encoding must be
//! deterministic: the same [`Attr`] always produces the same bytes.

use crate::attr::Attr;
use crate::blit::blend::{BlendFn, Blending};
use crate::color::{Color, Rgba};
use crate::glyph;
use crate::style::{CellFlags, TextStyle};
use std::fmt;

/// Fixed-size binary encoding of a cell's attributes.
pub trait Codec: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Attribute bytes per cell.
    const ATTR_SIZE: usize;
    /// Glyph bytes per cell.
    const CHAR_SIZE: usize = glyph::CHAR_SIZE;
    /// Total bytes per cell.
    const ITEM_SIZE: usize = Self::ATTR_SIZE + Self::CHAR_SIZE;
    /// Bits per color channel, recorded in saved files.
    const BITS_PER_COLOR: u8;

    /// Attribute of a freshly filled cell.
    fn default_attr() -> Attr;

    /// Encode `attr` into `out` (`ATTR_SIZE` bytes).
    fn encode(attr: &Attr, out: &mut [u8]);

    /// Decode an attribute record (`ATTR_SIZE` bytes).
    fn decode(bytes: &[u8]) -> Attr;

    /// Read the flags byte without a full decode.
    fn flags(bytes: &[u8]) -> CellFlags;

    /// Overwrite the flags byte.
    fn set_flags(bytes: &mut [u8], flags: CellFlags);

    /// Composite the source item (attribute + glyph) onto the destination item.
    fn blend(src: &[u8], dst: &mut [u8], blending: &Blending);
}

/// Copy the glyph slot and fullwidth markers, clearing char transparency.
fn take_glyph<C: Codec>(src: &[u8], dst: &mut [u8]) {
    let a = C::ATTR_SIZE;
    dst[a..C::ITEM_SIZE].copy_from_slice(&src[a..C::ITEM_SIZE]);
    let src_flags = C::flags(&src[..a]);
    let mut flags = C::flags(&dst[..a]);
    flags.remove(CellFlags::FULLWIDTH | CellFlags::CHAR_TRANSPARENCY);
    flags.insert(src_flags & CellFlags::FULLWIDTH);
    C::set_flags(&mut dst[..a], flags);
}

/// 256-register codec: one little-endian `u32` per attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Codec256;

impl Codec256 {
    const FG_SHIFT: u32 = 0;
    const BG_SHIFT: u32 = 8;
    const STYLE_SHIFT: u32 = 16;
    const FLAGS_SHIFT: u32 = 24;

    /// Pack an attribute into its `u32` form.
    #[must_use]
    pub fn pack(attr: &Attr) -> u32 {
        let mut flags = attr.flags;
        // An RGB request with zero alpha is the register codec's transparency.
        if let Color::Rgb(c) = attr.fg {
            if c.is_transparent() {
                flags.insert(CellFlags::FG_TRANSPARENCY);
            }
        }
        if let Color::Rgb(c) = attr.bg {
            if c.is_transparent() {
                flags.insert(CellFlags::BG_TRANSPARENCY);
            }
        }

        (u32::from(attr.fg.to_register()) << Self::FG_SHIFT)
            | (u32::from(attr.bg.to_register()) << Self::BG_SHIFT)
            | (u32::from(attr.style.bits()) << Self::STYLE_SHIFT)
            | (u32::from(flags.bits()) << Self::FLAGS_SHIFT)
    }

    /// Unpack the `u32` form.
    #[must_use]
    pub fn unpack(packed: u32) -> Attr {
        let byte = |shift: u32| ((packed >> shift) & 0xFF) as u8;
        Attr {
            fg: Color::Register(byte(Self::FG_SHIFT)),
            bg: Color::Register(byte(Self::BG_SHIFT)),
            style: TextStyle::from_bits_retain(byte(Self::STYLE_SHIFT)),
            flags: CellFlags::from_bits_retain(byte(Self::FLAGS_SHIFT)),
        }
    }

    fn read_u32(bytes: &[u8]) -> u32 {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl Codec for Codec256 {
    const ATTR_SIZE: usize = 4;
    const BITS_PER_COLOR: u8 = 8;

    fn default_attr() -> Attr {
        Attr::DEFAULT
    }

    fn encode(attr: &Attr, out: &mut [u8]) {
        out[..4].copy_from_slice(&Self::pack(attr).to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Attr {
        Self::unpack(Self::read_u32(bytes))
    }

    fn flags(bytes: &[u8]) -> CellFlags {
        CellFlags::from_bits_retain(bytes[3])
    }

    fn set_flags(bytes: &mut [u8], flags: CellFlags) {
        bytes[3] = flags.bits();
    }

    /// Registers cannot be mixed arithmetically, so blending here is purely
    /// flag driven: every part whose transparency flag is set on the source
    /// keeps the destination's value. Blend function and opacity are ignored.
    fn blend(src: &[u8], dst: &mut [u8], _blending: &Blending) {
        let flags = Self::flags(src);
        let transparency = flags & CellFlags::TRANSPARENCY;

        if transparency.is_empty() {
            dst[..Self::ITEM_SIZE].copy_from_slice(&src[..Self::ITEM_SIZE]);
            return;
        }
        if transparency == CellFlags::TRANSPARENCY {
            return;
        }

        let mut dst_flags = Self::flags(dst);
        if !flags.contains(CellFlags::FG_TRANSPARENCY) {
            dst[0] = src[0];
            dst_flags.remove(CellFlags::FG_TRANSPARENCY);
        }
        if !flags.contains(CellFlags::BG_TRANSPARENCY) {
            dst[1] = src[1];
            dst_flags.remove(CellFlags::BG_TRANSPARENCY);
        }
        if !flags.contains(CellFlags::STYLE_TRANSPARENCY) {
            dst[2] = src[2];
            dst_flags.remove(CellFlags::STYLE_TRANSPARENCY);
        }
        Self::set_flags(dst, dst_flags);

        if !flags.contains(CellFlags::CHAR_TRANSPARENCY) {
            take_glyph::<Self>(src, dst);
        }
    }
}

/// True-color codec: RGBA foreground, RGBA background, style byte, flags byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodecRgb;

impl CodecRgb {
    const FG: usize = 0;
    const BG: usize = 4;
    const STYLE: usize = 8;
    const FLAGS: usize = 9;

    fn read_rgba(bytes: &[u8], at: usize) -> Rgba {
        Rgba::new(bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3])
    }

    fn write_rgba(bytes: &mut [u8], at: usize, c: Rgba) {
        bytes[at..at + 4].copy_from_slice(&[c.r, c.g, c.b, c.a]);
    }

    /// Alpha as seen by blending: a set transparency flag counts as zero.
    fn effective_alpha(bytes: &[u8], at: usize, flag: CellFlags) -> u8 {
        if Self::flags(bytes).contains(flag) {
            0
        } else {
            bytes[at + 3]
        }
    }

    /// Blend one RGBA group and force the result opaque.
    fn blend_group(src: &[u8], dst: &mut [u8], at: usize, alpha: f32, func: BlendFn) {
        for ch in at..at + 3 {
            let s = f32::from(src[ch]);
            let d = f32::from(dst[ch]);
            let mixed = func.apply(s, d) * alpha + d * (1.0 - alpha);
            dst[ch] = mixed.round().clamp(0.0, 255.0) as u8;
        }
        dst[at + 3] = 255;
    }
}

impl Codec for CodecRgb {
    const ATTR_SIZE: usize = 10;
    const BITS_PER_COLOR: u8 = 24;

    fn default_attr() -> Attr {
        Attr::DEFAULT_RGB
    }

    fn encode(attr: &Attr, out: &mut [u8]) {
        Self::write_rgba(out, Self::FG, attr.fg.to_rgba());
        Self::write_rgba(out, Self::BG, attr.bg.to_rgba());
        out[Self::STYLE] = attr.style.bits();
        out[Self::FLAGS] = attr.flags.bits();
    }

    fn decode(bytes: &[u8]) -> Attr {
        Attr {
            fg: Color::Rgb(Self::read_rgba(bytes, Self::FG)),
            bg: Color::Rgb(Self::read_rgba(bytes, Self::BG)),
            style: TextStyle::from_bits_retain(bytes[Self::STYLE]),
            flags: CellFlags::from_bits_retain(bytes[Self::FLAGS]),
        }
    }

    fn flags(bytes: &[u8]) -> CellFlags {
        CellFlags::from_bits_retain(bytes[Self::FLAGS])
    }

    fn set_flags(bytes: &mut [u8], flags: CellFlags) {
        bytes[Self::FLAGS] = flags.bits();
    }

    fn blend(src: &[u8], dst: &mut [u8], blending: &Blending) {
        let flags = Self::flags(src);
        let fg_alpha = Self::effective_alpha(src, Self::FG, CellFlags::FG_TRANSPARENCY);
        let bg_alpha = Self::effective_alpha(src, Self::BG, CellFlags::BG_TRANSPARENCY);

        if blending.func == BlendFn::Normal
            && blending.opacity >= 1.0
            && fg_alpha == 255
            && bg_alpha == 255
            && !flags.intersects(CellFlags::TRANSPARENCY)
        {
            dst[..Self::ITEM_SIZE].copy_from_slice(&src[..Self::ITEM_SIZE]);
            return;
        }

        if flags.is_style_and_char_transparent() && fg_alpha == 0 && bg_alpha == 0 {
            return;
        }

        let opacity = blending.opacity.clamp(0.0, 1.0);
        let fg_mix = opacity * f32::from(fg_alpha) / 255.0;
        let bg_mix = opacity * f32::from(bg_alpha) / 255.0;
        Self::blend_group(src, dst, Self::FG, fg_mix, blending.func);
        Self::blend_group(src, dst, Self::BG, bg_mix, blending.func);

        let mut dst_flags = Self::flags(dst);
        dst_flags.remove(CellFlags::FG_TRANSPARENCY | CellFlags::BG_TRANSPARENCY);
        if !flags.contains(CellFlags::STYLE_TRANSPARENCY) {
            dst[Self::STYLE] = src[Self::STYLE];
            dst_flags.remove(CellFlags::STYLE_TRANSPARENCY);
        }
        Self::set_flags(dst, dst_flags);

        if !flags.contains(CellFlags::CHAR_TRANSPARENCY) {
            take_glyph::<Self>(src, dst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrRequest;

    fn item<C: Codec>(attr: &Attr, ch: &str) -> Vec<u8> {
        let mut v = vec![0u8; C::ITEM_SIZE];
        C::encode(attr, &mut v[..C::ATTR_SIZE]);
        glyph::write(&mut v[C::ATTR_SIZE..], ch);
        v
    }

    #[test]
    fn test_sizes() {
        assert_eq!(Codec256::ATTR_SIZE, 4);
        assert_eq!(Codec256::ITEM_SIZE, 8);
        assert_eq!(CodecRgb::ATTR_SIZE, 10);
        assert_eq!(CodecRgb::ITEM_SIZE, 14);
        assert_eq!(Codec256::BITS_PER_COLOR, 8);
        assert_eq!(CodecRgb::BITS_PER_COLOR, 24);
    }

    #[test]
    fn test_256_packing_layout() {
        let attr = AttrRequest::new()
            .color(3)
            .bg_color(200)
            .bold()
            .strike()
            .char_transparency()
            .resolve();
        let mut bytes = [0u8; 4];
        Codec256::encode(&attr, &mut bytes);
        assert_eq!(bytes, [3, 200, 0x81, 0x02]);
        assert_eq!(Codec256::decode(&bytes), attr);
    }

    #[test]
    fn test_256_rgb_maps_to_register() {
        let attr = Attr::new(Color::Rgb(Rgba::rgb(255, 0, 0)), Color::Register(0));
        let mut bytes = [0u8; 4];
        Codec256::encode(&attr, &mut bytes);
        assert_eq!(Codec256::decode(&bytes).fg, Color::Register(196));
    }

    #[test]
    fn test_256_zero_alpha_sets_transparency() {
        let attr = Attr::new(Color::Register(1), Color::Rgb(Rgba::TRANSPARENT));
        let mut bytes = [0u8; 4];
        Codec256::encode(&attr, &mut bytes);
        assert!(Codec256::flags(&bytes).contains(CellFlags::BG_TRANSPARENCY));
    }

    #[test]
    fn test_rgb_layout_and_default_alpha() {
        let attr = AttrRequest::new().color(9).italic().resolve();
        let mut bytes = [0u8; 10];
        CodecRgb::encode(&attr, &mut bytes);
        assert_eq!(bytes, [255, 0, 0, 255, 0, 0, 0, 255, 0x04, 0]);

        let mut bytes = [0u8; 10];
        CodecRgb::encode(&CodecRgb::default_attr(), &mut bytes);
        assert_eq!(bytes, [255, 255, 255, 255, 0, 0, 0, 255, 0, 0]);
    }

    #[test]
    fn test_rgb_opaque_normal_is_plain_copy() {
        let src = item::<CodecRgb>(
            &AttrRequest::new()
                .color(Rgba::rgb(10, 20, 30))
                .bg_color(Rgba::rgb(40, 50, 60))
                .underline()
                .resolve(),
            "Z",
        );
        let mut dst = item::<CodecRgb>(&Attr::DEFAULT_RGB, "q");
        CodecRgb::blend(&src, &mut dst, &Blending::default());
        assert_eq!(dst, src);
    }

    #[test]
    fn test_rgb_fully_transparent_skipped() {
        let src = item::<CodecRgb>(
            &AttrRequest::new()
                .color(Rgba::TRANSPARENT)
                .bg_color(Rgba::TRANSPARENT)
                .style_transparency()
                .char_transparency()
                .resolve(),
            "Z",
        );
        let dst_before = item::<CodecRgb>(&Attr::DEFAULT_RGB.with_style(TextStyle::BOLD), "q");
        let mut dst = dst_before.clone();
        CodecRgb::blend(&src, &mut dst, &Blending::default());
        assert_eq!(dst, dst_before);
    }

    #[test]
    fn test_rgb_half_alpha_mixes_and_forces_opaque() {
        let src = item::<CodecRgb>(
            &Attr::new(
                Color::Rgb(Rgba::new(200, 100, 0, 128)),
                Color::Rgb(Rgba::new(0, 0, 0, 0)),
            )
            .with_flags(CellFlags::CHAR_TRANSPARENCY),
            " ",
        );
        let mut dst = item::<CodecRgb>(
            &Attr::new(
                Color::Rgb(Rgba::new(0, 100, 200, 40)),
                Color::Rgb(Rgba::new(9, 9, 9, 255)),
            ),
            "k",
        );
        CodecRgb::blend(&src, &mut dst, &Blending::default());
        let out = CodecRgb::decode(&dst[..10]);
        // alpha = 128/255 ~ 0.502
        assert_eq!(out.fg, Color::Rgb(Rgba::new(100, 100, 100, 255)));
        // bg alpha 0: channels unchanged, alpha forced opaque.
        assert_eq!(out.bg, Color::Rgb(Rgba::new(9, 9, 9, 255)));
        assert_eq!(glyph::read(&dst[10..]), "k");
    }

    #[test]
    fn test_rgb_opacity_scales_alpha() {
        let src = item::<CodecRgb>(
            &Attr::new(Color::Rgb(Rgba::rgb(255, 255, 255)), Color::Rgb(Rgba::rgb(255, 255, 255))),
            "X",
        );
        let mut dst = item::<CodecRgb>(&Attr::DEFAULT_RGB, " ");
        CodecRgb::blend(
            &src,
            &mut dst,
            &Blending {
                func: BlendFn::Normal,
                opacity: 0.5,
            },
        );
        let out = CodecRgb::decode(&dst[..10]);
        // bg: 255 * 0.5 + 0 * 0.5 = 127.5 -> 128
        assert_eq!(out.bg, Color::Rgb(Rgba::rgb(128, 128, 128)));
        assert_eq!(glyph::read(&dst[10..]), "X");
    }

    #[test]
    fn test_style_transparency_keeps_destination_style() {
        let src = item::<CodecRgb>(
            &Attr::DEFAULT_RGB
                .with_style(TextStyle::ITALIC)
                .with_flags(CellFlags::STYLE_TRANSPARENCY),
            "S",
        );
        let mut dst = item::<CodecRgb>(&Attr::DEFAULT_RGB.with_style(TextStyle::BOLD), "d");
        CodecRgb::blend(&src, &mut dst, &Blending::default());
        let out = CodecRgb::decode(&dst[..10]);
        assert_eq!(out.style, TextStyle::BOLD);
        assert_eq!(glyph::read(&dst[10..]), "S");
    }

    #[test]
    fn test_256_flag_blending() {
        let src = item::<Codec256>(
            &AttrRequest::new()
                .color(1)
                .bg_color(2)
                .bg_transparency()
                .char_transparency()
                .resolve(),
            "s",
        );
        let mut dst = item::<Codec256>(&AttrRequest::new().color(5).bg_color(6).resolve(), "d");
        Codec256::blend(&src, &mut dst, &Blending::default());
        let out = Codec256::decode(&dst[..4]);
        assert_eq!(out.fg, Color::Register(1));
        assert_eq!(out.bg, Color::Register(6));
        assert_eq!(glyph::read(&dst[4..]), "d");
    }

    #[test]
    fn test_256_no_flags_copies() {
        let src = item::<Codec256>(&AttrRequest::new().color(4).resolve(), "s");
        let mut dst = item::<Codec256>(&Attr::DEFAULT, "d");
        Codec256::blend(&src, &mut dst, &Blending::default());
        assert_eq!(dst, src);
    }
}
