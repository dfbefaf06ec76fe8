//! ANSI escape sequence generation.
//!
//! The low-level `write_*` functions emit single sequences into any
//! [`Write`]r without `format!` overhead. [`EscapeTable`] bundles them into the
//! set of generators a terminal handle exposes; the blitter only ever goes
//! through a table, so a terminal with different syntax can supply its own.

pub mod sequences;
pub mod transition;

pub use sequences::*;

use crate::color::Rgba;
use crate::style::TextStyle;
use std::io::{self, Write};

/// Write a u8 as decimal digits to a writer without formatting overhead.
#[inline]
fn write_u8_decimal(w: &mut impl Write, n: u8) -> io::Result<()> {
    if n >= 100 {
        w.write_all(&[b'0' + n / 100, b'0' + (n / 10) % 10, b'0' + n % 10])
    } else if n >= 10 {
        w.write_all(&[b'0' + n / 10, b'0' + n % 10])
    } else {
        w.write_all(&[b'0' + n])
    }
}

/// Write a u32 as decimal digits to a writer without formatting overhead.
///
/// Stack buffer is sized for max u32 digits (10) to avoid heap allocation.
#[inline]
fn write_u32_decimal(w: &mut impl Write, n: u32) -> io::Result<()> {
    // Fast paths for common small values (most cursor positions)
    if n < 10 {
        return w.write_all(&[b'0' + n as u8]);
    }
    if n < 100 {
        return w.write_all(&[b'0' + (n / 10) as u8, b'0' + (n % 10) as u8]);
    }

    let mut buf = [0u8; 10]; // max u32 is 4294967295 (10 digits)
    let mut i = buf.len();
    let mut val = n;
    while val > 0 {
        i -= 1;
        buf[i] = b'0' + (val % 10) as u8;
        val /= 10;
    }
    w.write_all(&buf[i..])
}

/// Write an absolute cursor position sequence. Coordinates are 0-indexed.
pub fn write_cursor_position(w: &mut impl Write, col: u32, row: u32) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    write_u32_decimal(w, row.saturating_add(1))?;
    w.write_all(b";")?;
    write_u32_decimal(w, col.saturating_add(1))?;
    w.write_all(b"H")
}

/// Write a 256-register color selection. `base` is 38 (fg) or 48 (bg).
fn write_register(w: &mut impl Write, base: &[u8], index: u8) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    w.write_all(base)?;
    w.write_all(b";5;")?;
    write_u8_decimal(w, index)?;
    w.write_all(b"m")
}

/// Write a 24-bit color selection. `base` is 38 (fg) or 48 (bg).
fn write_truecolor(w: &mut impl Write, base: &[u8], color: Rgba) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    w.write_all(base)?;
    w.write_all(b";2;")?;
    write_u8_decimal(w, color.r)?;
    w.write_all(b";")?;
    write_u8_decimal(w, color.g)?;
    w.write_all(b";")?;
    write_u8_decimal(w, color.b)?;
    w.write_all(b"m")
}

/// Write SGR sequence selecting a foreground palette register.
pub fn write_fg_256(w: &mut impl Write, index: u8) -> io::Result<()> {
    write_register(w, b"38", index)
}

/// Write SGR sequence selecting a background palette register.
pub fn write_bg_256(w: &mut impl Write, index: u8) -> io::Result<()> {
    write_register(w, b"48", index)
}

/// Write SGR sequence selecting a 24-bit foreground. Alpha is ignored.
pub fn write_fg_rgb(w: &mut impl Write, color: Rgba) -> io::Result<()> {
    write_truecolor(w, b"38", color)
}

/// Write SGR sequence selecting a 24-bit background. Alpha is ignored.
pub fn write_bg_rgb(w: &mut impl Write, color: Rgba) -> io::Result<()> {
    write_truecolor(w, b"48", color)
}

/// Write a single SGR parameter.
pub fn write_sgr(w: &mut impl Write, code: u8) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    write_u8_decimal(w, code)?;
    w.write_all(b"m")
}

/// Generate an absolute cursor position sequence (0-indexed input).
#[must_use]
pub fn cursor_position(col: u32, row: u32) -> String {
    let mut buf = Vec::new();
    let _ = write_cursor_position(&mut buf, col, row);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Generator appending a cursor move to `(col, row)`.
pub type MoveFn = fn(&mut Vec<u8>, u32, u32);
/// Generator appending a palette register selection.
pub type RegisterFn = fn(&mut Vec<u8>, u8);
/// Generator appending a 24-bit color selection.
pub type RgbFn = fn(&mut Vec<u8>, Rgba);

/// The escape sequences a terminal handle offers to the blitter.
///
/// Writes into a `Vec<u8>` cannot fail, so the generators return nothing.
#[derive(Clone, Copy)]
pub struct EscapeTable {
    /// Absolute cursor positioning.
    pub move_to: MoveFn,
    /// Reset every attribute.
    pub reset: &'static [u8],
    pub fg_256: RegisterFn,
    pub bg_256: RegisterFn,
    pub fg_rgb: RgbFn,
    pub bg_rgb: RgbFn,
    /// Style toggles indexed in SGR order: bold, dim, italic, underline,
    /// blink, inverse, hidden, strike.
    pub style_on: [&'static [u8]; 8],
    /// Matching off toggles; bold and dim share one.
    pub style_off: [&'static [u8]; 8],
}

impl EscapeTable {
    /// Standard ECMA-48 / xterm sequences.
    #[must_use]
    pub fn ansi() -> Self {
        Self {
            move_to: |out, col, row| {
                let _ = write_cursor_position(out, col, row);
            },
            reset: RESET.as_bytes(),
            fg_256: |out, n| {
                let _ = write_fg_256(out, n);
            },
            bg_256: |out, n| {
                let _ = write_bg_256(out, n);
            },
            fg_rgb: |out, c| {
                let _ = write_fg_rgb(out, c);
            },
            bg_rgb: |out, c| {
                let _ = write_bg_rgb(out, c);
            },
            style_on: [
                b"\x1b[1m", b"\x1b[2m", b"\x1b[3m", b"\x1b[4m", b"\x1b[5m", b"\x1b[7m", b"\x1b[8m",
                b"\x1b[9m",
            ],
            style_off: [
                b"\x1b[22m",
                b"\x1b[22m",
                b"\x1b[23m",
                b"\x1b[24m",
                b"\x1b[25m",
                b"\x1b[27m",
                b"\x1b[28m",
                b"\x1b[29m",
            ],
        }
    }

    /// Position of a single style bit in the toggle arrays.
    #[must_use]
    pub fn style_slot(bit: TextStyle) -> Option<usize> {
        TextStyle::each_bit().position(|b| b == bit)
    }
}

impl std::fmt::Debug for EscapeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscapeTable")
            .field("reset", &String::from_utf8_lossy(self.reset))
            .finish_non_exhaustive()
    }
}

impl Default for EscapeTable {
    fn default() -> Self {
        Self::ansi()
    }
}
