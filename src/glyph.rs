//! Fixed-width glyph slots.
//!
//! Every cell stores its glyph as UTF-8 in a zero-padded [`CHAR_SIZE`]-byte
//! slot. Reading and writing never fail: anything that cannot be represented
//! (a glyph longer than the slot, a slot starting mid-sequence, invalid
//! UTF-8) becomes the NUL placeholder, so the grid stays aligned even when a
//! glyph is lost.

/// Size of the glyph slot in bytes.
pub const CHAR_SIZE: usize = 4;

/// Placeholder for unreadable or unwritable glyphs.
pub const PLACEHOLDER: &str = "\0";

/// Byte length of a UTF-8 sequence, judged by its leading byte.
///
/// Returns `None` for continuation bytes (`0x80..=0xBF`), which cannot start
/// a sequence.
#[must_use]
pub const fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0x80..=0xBF => None,
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        0xF8..=0xFB => Some(5),
        0xFC..=0xFF => Some(6),
    }
}

/// Write `glyph` into `slot`, zero-padding the rest.
///
/// A glyph longer than the slot is refused and the placeholder is written.
/// Returns `true` when the glyph was stored as given.
pub fn write(slot: &mut [u8], glyph: &str) -> bool {
    debug_assert_eq!(slot.len(), CHAR_SIZE);
    let bytes = glyph.as_bytes();
    let (src, stored) = if bytes.is_empty() || bytes.len() > slot.len() {
        (PLACEHOLDER.as_bytes(), false)
    } else {
        (bytes, true)
    };
    slot[..src.len()].copy_from_slice(src);
    slot[src.len()..].fill(0);
    stored
}

/// Write a single character into `slot`.
pub fn write_char(slot: &mut [u8], ch: char) -> bool {
    let mut buf = [0u8; 4];
    write(slot, ch.encode_utf8(&mut buf))
}

/// Read the glyph stored in `slot`.
///
/// The glyph extends up to the first zero byte after the leading sequence
/// (a stored NUL reads back as the placeholder). A slot whose leading byte is
/// a continuation byte, or declares a sequence longer than the slot, or that
/// is not valid UTF-8, reads as the placeholder.
#[must_use]
pub fn read(slot: &[u8]) -> &str {
    let Some(&lead) = slot.first() else {
        return PLACEHOLDER;
    };
    let Some(lead_len) = utf8_len(lead) else {
        return PLACEHOLDER;
    };
    if lead == 0 || lead_len > slot.len() {
        return PLACEHOLDER;
    }

    let end = slot[lead_len..]
        .iter()
        .position(|&b| b == 0)
        .map_or(slot.len(), |p| p + lead_len);

    std::str::from_utf8(&slot[..end]).unwrap_or(PLACEHOLDER)
}

/// Check whether the slot reads as the placeholder.
#[must_use]
pub fn is_placeholder(slot: &[u8]) -> bool {
    read(slot) == PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_with(glyph: &str) -> [u8; CHAR_SIZE] {
        let mut slot = [0xAAu8; CHAR_SIZE];
        write(&mut slot, glyph);
        slot
    }

    #[test]
    fn test_utf8_len_by_lead_byte() {
        assert_eq!(utf8_len(b'A'), Some(1));
        assert_eq!(utf8_len(0x80), None);
        assert_eq!(utf8_len(0xBF), None);
        assert_eq!(utf8_len(0xC3), Some(2));
        assert_eq!(utf8_len(0xE2), Some(3));
        assert_eq!(utf8_len(0xF0), Some(4));
        assert_eq!(utf8_len(0xF8), Some(5));
    }

    #[test]
    fn test_write_read_widths() {
        for glyph in ["A", "é", "─", "漢", "😀"] {
            let slot = slot_with(glyph);
            assert_eq!(read(&slot), glyph);
        }
    }

    #[test]
    fn test_write_zero_pads() {
        let slot = slot_with("A");
        assert_eq!(slot, [b'A', 0, 0, 0]);
    }

    #[test]
    fn test_multi_codepoint_glyph_within_slot() {
        // "e" + combining acute: 3 bytes, fits.
        let slot = slot_with("e\u{301}");
        assert_eq!(read(&slot), "e\u{301}");
    }

    #[test]
    fn test_oversized_glyph_refused() {
        let mut slot = [0u8; CHAR_SIZE];
        assert!(!write(&mut slot, "👍🏽"));
        assert_eq!(read(&slot), PLACEHOLDER);
    }

    #[test]
    fn test_continuation_lead_reads_placeholder() {
        let slot = [0x80, b'A', 0, 0];
        assert_eq!(read(&slot), PLACEHOLDER);
        assert!(is_placeholder(&slot));
    }

    #[test]
    fn test_overlong_lead_reads_placeholder() {
        let slot = [0xF8, 0x80, 0x80, 0x80];
        assert_eq!(read(&slot), PLACEHOLDER);
    }

    #[test]
    fn test_truncated_sequence_reads_placeholder() {
        // Lead byte claims 3 bytes but the slot holds only one continuation.
        let slot = [0xE2, 0x94, 0, 0];
        assert_eq!(read(&slot), PLACEHOLDER);
    }

    #[test]
    fn test_empty_glyph_writes_placeholder() {
        let mut slot = [b'x'; CHAR_SIZE];
        assert!(!write(&mut slot, ""));
        assert_eq!(slot, [0, 0, 0, 0]);
    }
}
