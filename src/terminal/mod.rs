//! Terminal output handle.
//!
//! A [`Terminal`] owns the raw output sink, knows the screen size, and
//! exposes an [`EscapeTable`] to the blitter. Output is accumulated in
//! memory and handed to the sink once it grows past a threshold, so a full
//! redraw costs a handful of `write` calls instead of one per cell.

mod tty;

pub use tty::{is_tty, terminal_size};

use crate::ansi::{EscapeTable, sequences};
use crate::buffer::Surface;
use crate::rect::FALLBACK_SIZE;
use std::io::{self, Write};

/// Accumulated bytes that trigger a write to the sink.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 10_000;

/// Terminal output handle.
pub struct Terminal<W: Write> {
    writer: W,
    width: u32,
    height: u32,
    escapes: EscapeTable,
    out: Vec<u8>,
    flush_threshold: usize,
}

impl<W: Write> Terminal<W> {
    /// Create a terminal of the given size writing to `writer`.
    pub fn new(writer: W, width: u32, height: u32) -> Self {
        Self {
            writer,
            width,
            height,
            escapes: EscapeTable::ansi(),
            out: Vec::with_capacity(DEFAULT_FLUSH_THRESHOLD + 256),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    /// Set the accumulator size that triggers a write.
    #[must_use]
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    /// Replace the escape sequences offered to the blitter.
    #[must_use]
    pub fn with_escapes(mut self, escapes: EscapeTable) -> Self {
        self.escapes = escapes;
        self
    }

    /// Get terminal dimensions.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Update the known dimensions, e.g. after SIGWINCH.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Escape sequences for this terminal.
    #[must_use]
    pub fn escapes(&self) -> &EscapeTable {
        &self.escapes
    }

    /// Current flush threshold in bytes.
    #[must_use]
    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    /// Bytes accumulated but not yet written.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.out
    }

    /// Append raw bytes to the accumulator.
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.extend_from_slice(bytes);
        self.flush_if_over().map(|_| ())
    }

    /// Move the cursor to a 0-indexed cell.
    pub fn move_to(&mut self, x: u32, y: u32) -> io::Result<()> {
        (self.escapes.move_to)(&mut self.out, x, y);
        self.flush_if_over().map(|_| ())
    }

    /// Reset every style attribute.
    pub fn reset_style(&mut self) -> io::Result<()> {
        let reset = self.escapes.reset;
        self.write_raw(reset)
    }

    /// Clear the whole screen.
    pub fn clear(&mut self) -> io::Result<()> {
        self.write_raw(sequences::CLEAR_SCREEN.as_bytes())
    }

    /// Hide the cursor.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        self.write_raw(sequences::CURSOR_HIDE.as_bytes())
    }

    /// Show the cursor.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        self.write_raw(sequences::CURSOR_SHOW.as_bytes())
    }

    /// Write everything accumulated and flush the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.flush_pending().map(|_| ())
    }

    /// Get a reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Accumulator for the blitter.
    pub(crate) fn out_mut(&mut self) -> &mut Vec<u8> {
        &mut self.out
    }

    /// Write the accumulator if it is over the threshold.
    ///
    /// Returns whether a write happened.
    pub(crate) fn flush_if_over(&mut self) -> io::Result<bool> {
        if self.out.len() > self.flush_threshold {
            self.writer.write_all(&self.out)?;
            self.out.clear();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Write any accumulated bytes and flush the sink.
    ///
    /// Returns whether there was anything to write.
    pub(crate) fn flush_pending(&mut self) -> io::Result<bool> {
        if self.out.is_empty() {
            return Ok(false);
        }
        self.writer.write_all(&self.out)?;
        self.out.clear();
        self.writer.flush()?;
        Ok(true)
    }
}

impl Terminal<io::Stdout> {
    /// Terminal on stdout, sized from the controlling TTY (80x24 if unknown).
    #[must_use]
    pub fn stdout() -> Self {
        let (w, h) = terminal_size().unwrap_or(FALLBACK_SIZE);
        Self::new(io::stdout(), u32::from(w), u32::from(h))
    }
}

impl<W: Write> Surface for Terminal<W> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        let _ = self.flush_pending();
    }
}

impl<W: Write> std::fmt::Debug for Terminal<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pending", &self.out.len())
            .field("flush_threshold", &self.flush_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_until_threshold() {
        let mut term = Terminal::new(Vec::new(), 10, 2).with_flush_threshold(8);
        term.write_raw(b"abcd").unwrap();
        assert!(term.get_ref().is_empty());
        assert_eq!(term.pending(), b"abcd");

        term.write_raw(b"efghi").unwrap();
        assert_eq!(term.get_ref().as_slice(), b"abcdefghi");
        assert!(term.pending().is_empty());
    }

    #[test]
    fn test_flush_writes_remainder() {
        let mut term = Terminal::new(Vec::new(), 10, 2);
        term.move_to(3, 1).unwrap();
        term.reset_style().unwrap();
        term.flush().unwrap();
        assert_eq!(term.get_ref().as_slice(), b"\x1b[2;4H\x1b[0m");
        assert!(!term.flush_pending().unwrap());
    }

    #[test]
    fn test_cursor_visibility_and_clear() {
        let mut term = Terminal::new(Vec::new(), 10, 2);
        term.hide_cursor().unwrap();
        term.clear().unwrap();
        term.show_cursor().unwrap();
        term.flush().unwrap();
        assert_eq!(term.get_ref().as_slice(), b"\x1b[?25l\x1b[2J\x1b[?25h");
    }

    #[test]
    fn test_size() {
        let mut term = Terminal::new(Vec::new(), 80, 24);
        assert_eq!(Surface::size(&term), (80, 24));
        term.set_size(100, 30);
        assert_eq!(term.size(), (100, 30));
        assert_eq!(term.flush_threshold(), DEFAULT_FLUSH_THRESHOLD);
    }
}
