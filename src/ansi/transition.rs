//! Style transitions between consecutive cells.
//!
//! Given the attribute last emitted to the terminal and the attribute of the
//! next cell, produce the escapes that switch from one to the other. The
//! full form resets and rebuilds everything; the minimal form touches only
//! what changed.

use super::EscapeTable;
use crate::attr::Attr;
use crate::color::Color;
use crate::style::TextStyle;

/// Bits sharing the single "normal intensity" off code.
const INTENSITY: TextStyle = TextStyle::BOLD.union(TextStyle::DIM);

fn write_fg(esc: &EscapeTable, out: &mut Vec<u8>, color: Color) {
    match color {
        Color::Register(n) => (esc.fg_256)(out, n),
        Color::Rgb(c) => (esc.fg_rgb)(out, c),
    }
}

fn write_bg(esc: &EscapeTable, out: &mut Vec<u8>, color: Color) {
    match color {
        Color::Register(n) => (esc.bg_256)(out, n),
        Color::Rgb(c) => (esc.bg_rgb)(out, c),
    }
}

fn write_style_on(esc: &EscapeTable, out: &mut Vec<u8>, style: TextStyle) {
    for (i, bit) in TextStyle::each_bit().enumerate() {
        if style.contains(bit) {
            out.extend_from_slice(esc.style_on[i]);
        }
    }
}

/// Reset, then set colors and every style bit of `attr`.
pub fn write_full(esc: &EscapeTable, out: &mut Vec<u8>, attr: &Attr) {
    out.extend_from_slice(esc.reset);
    write_fg(esc, out, attr.fg);
    write_bg(esc, out, attr.bg);
    write_style_on(esc, out, attr.style);
}

/// Emit only the changes needed to go from `prev` to `next`.
///
/// Turning off bold or dim uses the shared off code, which clears both; the
/// other one is re-asserted afterwards if `next` keeps it.
pub fn write_delta(esc: &EscapeTable, out: &mut Vec<u8>, prev: &Attr, next: &Attr) {
    let removed = prev.style.difference(next.style);
    let mut added = next.style.difference(prev.style);

    let mut intensity_cleared = false;
    for (i, bit) in TextStyle::each_bit().enumerate() {
        if !removed.contains(bit) {
            continue;
        }
        if INTENSITY.contains(bit) {
            if intensity_cleared {
                continue;
            }
            intensity_cleared = true;
        }
        out.extend_from_slice(esc.style_off[i]);
    }
    if intensity_cleared {
        added |= next.style & INTENSITY;
    }

    if prev.fg != next.fg {
        write_fg(esc, out, next.fg);
    }
    if prev.bg != next.bg {
        write_bg(esc, out, next.bg);
    }
    write_style_on(esc, out, added);
}

/// Emit the transition into `next`, given what was emitted last.
///
/// With no previous attribute, or without `minimal`, the full form is used.
pub fn write_transition(
    esc: &EscapeTable,
    out: &mut Vec<u8>,
    prev: Option<&Attr>,
    next: &Attr,
    minimal: bool,
) {
    match prev {
        Some(prev) if minimal => write_delta(esc, out, prev, next),
        _ => write_full(esc, out, next),
    }
}
