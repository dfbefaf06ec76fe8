//! Off-screen cell grid.
//!
//! This module provides [`ScreenBuffer`], a 2D grid of fixed-size binary cell
//! records that applications draw into and then blit onto another buffer or
//! onto a [`Terminal`]. The record layout is chosen by the [`Codec`] type
//! parameter:
//!
//! - [`ScreenBuffer256`]: 8-byte cells, 256-register colors
//! - [`ScreenBufferRgb`]: 14-byte cells, 24-bit RGBA colors
//!
//! Drawing calls (`fill`, `put`, `get`, buffer-to-buffer `draw`) never fail:
//! out-of-range coordinates are clamped or yield `None`. Only creation,
//! resizing, file I/O and terminal output return [`Result`]s.
//!
//! # Examples
//!
//! ```
//! use screenbuffer::attr::AttrRequest;
//! use screenbuffer::buffer::{BufferOptions, PutOptions, ScreenBuffer256};
//!
//! let mut buf = ScreenBuffer256::create(&BufferOptions::sized(4, 2), None).unwrap();
//! buf.put(&PutOptions::at(0, 0), "AB");
//!
//! let red = buf.resolve_attr(&AttrRequest::new().color("red"));
//! buf.put(&PutOptions::at(3, 0).attr(red).wrap(true), "CD");
//!
//! assert_eq!(buf.dump_chars(), "AB C\nD   \n");
//! ```

pub mod file;

use crate::attr::{Attr, AttrRequest};
use crate::blit::blend::Blending;
use crate::blit::{self, BlitParams, BlitStats, RedrawSource, Shadow};
use crate::codec::{Codec, Codec256, CodecRgb};
use crate::error::{Error, Result};
use crate::event::emit_event_with;
use crate::glyph;
use crate::rect::Rect;
use crate::style::CellFlags;
use crate::terminal::Terminal;
use std::borrow::Cow;
use std::io::Write;
use std::marker::PhantomData;
use std::ops::Range;
use unicode_normalization::{UnicodeNormalization, is_nfc};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Anything with a size in cells that a buffer can be sized from.
pub trait Surface {
    /// `(width, height)` in cells.
    fn size(&self) -> (u32, u32);
}

/// Buffer with 256-register colors.
pub type ScreenBuffer256 = ScreenBuffer<Codec256>;
/// Buffer with 24-bit RGBA colors.
pub type ScreenBufferRgb = ScreenBuffer<CodecRgb>;

/// Options for [`ScreenBuffer::create`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BufferOptions {
    /// Width in cells; `None` takes the destination's width.
    pub width: Option<u32>,
    /// Height in cells; `None` takes the destination's height.
    pub height: Option<u32>,
    /// Leave the backing array zeroed instead of filling it.
    pub no_fill: bool,
    /// Initial fill; `None` is a blank space with the default attribute.
    pub fill: Option<FillOptions>,
    /// Default draw position.
    pub x: f64,
    pub y: f64,
    /// Default tiling for draws.
    pub tile: bool,
    /// Default blending for draws; `None` copies raw records.
    pub blending: Option<Blending>,
}

impl BufferOptions {
    /// Options with an explicit size.
    #[must_use]
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn no_fill(mut self) -> Self {
        self.no_fill = true;
        self
    }

    #[must_use]
    pub fn fill(mut self, fill: FillOptions) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Default draw position.
    #[must_use]
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub fn tile(mut self, tile: bool) -> Self {
        self.tile = tile;
        self
    }

    #[must_use]
    pub fn blending(mut self, blending: Blending) -> Self {
        self.blending = Some(blending);
        self
    }
}

/// Options for [`ScreenBuffer::fill`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillOptions {
    /// `None` uses the codec's default attribute.
    pub attr: Option<Attr>,
    pub glyph: char,
    /// Restrict the fill to a region (clipped to the buffer).
    pub region: Option<Rect>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            attr: None,
            glyph: ' ',
            region: None,
        }
    }
}

impl FillOptions {
    /// Fill with `glyph` and the default attribute.
    #[must_use]
    pub fn glyph(glyph: char) -> Self {
        Self {
            glyph,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, attr: Attr) -> Self {
        self.attr = Some(attr);
        self
    }

    #[must_use]
    pub fn region(mut self, region: Rect) -> Self {
        self.region = Some(region);
        self
    }
}

/// Advance direction for [`ScreenBuffer::put`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right; wraps to the start of the next row.
    #[default]
    Right,
    /// Right to left; wraps to the end of the previous row.
    Left,
    /// Top to bottom; wraps to the top of the next column.
    Down,
    /// Bottom to top; wraps to the bottom of the next column.
    Up,
}

/// Options for [`ScreenBuffer::put`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Start column; clamped into the buffer.
    pub x: i32,
    /// Start row; clamped into the buffer.
    pub y: i32,
    /// `None` uses the codec's default attribute.
    pub attr: Option<Attr>,
    pub wrap: bool,
    pub direction: Direction,
}

impl PutOptions {
    /// Write starting at `(x, y)` with default attribute, no wrap, rightwards.
    #[must_use]
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, attr: Attr) -> Self {
        self.attr = Some(attr);
        self
    }

    #[must_use]
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Options for [`ScreenBuffer::draw`] and [`ScreenBuffer::draw_terminal`].
///
/// Unset fields fall back to the buffer's defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawOptions {
    /// Destination column of the source origin; floored.
    pub x: Option<f64>,
    /// Destination row of the source origin; floored.
    pub y: Option<f64>,
    /// Source region; whole buffer when unset.
    pub src_rect: Option<Rect>,
    /// Destination region; whole destination when unset.
    pub dst_rect: Option<Rect>,
    pub tile: Option<bool>,
    pub blending: Option<Blending>,
    /// Terminal targets only: skip unchanged cells, emit minimal escapes.
    pub delta: bool,
}

impl DrawOptions {
    /// Draw with the source origin at `(x, y)`.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn src_rect(mut self, rect: Rect) -> Self {
        self.src_rect = Some(rect);
        self
    }

    #[must_use]
    pub fn dst_rect(mut self, rect: Rect) -> Self {
        self.dst_rect = Some(rect);
        self
    }

    #[must_use]
    pub fn tile(mut self, tile: bool) -> Self {
        self.tile = Some(tile);
        self
    }

    #[must_use]
    pub fn blending(mut self, blending: Blending) -> Self {
        self.blending = Some(blending);
        self
    }

    #[must_use]
    pub fn delta(mut self, delta: bool) -> Self {
        self.delta = delta;
        self
    }
}

/// One cell as read back from a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub attr: Attr,
    /// Stored glyph; `"\0"` when the slot holds no readable glyph.
    pub glyph: &'a str,
}

/// 2D grid of binary cell records.
///
/// Cells are stored row-major, `C::ITEM_SIZE` bytes each, at offset
/// `(y * width + x) * ITEM_SIZE`.
#[derive(Clone, Debug)]
pub struct ScreenBuffer<C: Codec> {
    width: u32,
    height: u32,
    cells: Vec<u8>,
    /// Rows modified since the last terminal draw covering them.
    dirty: Vec<bool>,
    shadow: Option<Shadow>,

    x: f64,
    y: f64,
    tile: bool,
    blending: Option<Blending>,

    codec: PhantomData<C>,
}

/// Byte length of a `width` x `height` grid, or `None` if it overflows.
fn grid_len<C: Codec>(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(C::ITEM_SIZE)
}

/// Validate dimensions and return the backing array length.
fn checked_len<C: Codec>(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(Error::InvalidDimensions { width, height });
    }
    grid_len::<C>(width, height).ok_or(Error::InvalidDimensions { width, height })
}

impl<C: Codec> ScreenBuffer<C> {
    /// Create a buffer.
    ///
    /// Unset dimensions are taken from `destination`. Fails with
    /// [`Error::InvalidDimensions`] when a dimension is zero, missing, or the
    /// backing array size would overflow.
    pub fn create(opts: &BufferOptions, destination: Option<&dyn Surface>) -> Result<Self> {
        let dst_size = destination.map(Surface::size);
        let width = opts.width.or(dst_size.map(|s| s.0)).unwrap_or(0);
        let height = opts.height.or(dst_size.map(|s| s.1)).unwrap_or(0);
        let len = checked_len::<C>(width, height)?;

        let mut buf = Self {
            width,
            height,
            cells: vec![0; len],
            dirty: vec![true; height as usize],
            shadow: None,
            x: opts.x,
            y: opts.y,
            tile: opts.tile,
            blending: opts.blending,
            codec: PhantomData,
        };

        if !opts.no_fill {
            match &opts.fill {
                Some(fill) => buf.fill(fill),
                None => buf.fill(&FillOptions::default()),
            }
        }
        Ok(buf)
    }

    /// Create a blank `width` x `height` buffer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::create(&BufferOptions::sized(width, height), None)
    }

    /// Get buffer dimensions.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rectangle covering the whole buffer.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Raw backing array.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Resolve an attribute request using this codec's defaults.
    #[must_use]
    pub fn resolve_attr(&self, req: &AttrRequest) -> Attr {
        req.resolve_with(&C::default_attr())
    }

    #[inline]
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * C::ITEM_SIZE
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.offset(x as u32, y as u32))
    }

    pub(crate) fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    pub(crate) fn mark_row_dirty(&mut self, y: u32) {
        if let Some(d) = self.dirty.get_mut(y as usize) {
            *d = true;
        }
    }

    fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Check whether a row changed since it was last drawn to a terminal.
    #[must_use]
    pub fn is_row_dirty(&self, y: u32) -> bool {
        self.dirty.get(y as usize).copied().unwrap_or(false)
    }

    /// Rows changed since they were last drawn to a terminal.
    pub fn dirty_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.dirty
            .iter()
            .enumerate()
            .filter(|(_, d)| **d)
            .map(|(y, _)| y as u32)
    }

    /// Forget all dirty marks.
    pub fn clear_dirty(&mut self) {
        self.dirty.fill(false);
    }

    // ============================================
    // Cell access
    // ============================================

    /// Raw record at `(x, y)`.
    #[must_use]
    pub fn record(&self, x: i32, y: i32) -> Option<&[u8]> {
        self.index(x, y).map(|i| &self.cells[i..i + C::ITEM_SIZE])
    }

    /// Cell at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<CellRef<'_>> {
        let record = self.record(x, y)?;
        Some(CellRef {
            attr: C::decode(&record[..C::ATTR_SIZE]),
            glyph: glyph::read(&record[C::ATTR_SIZE..]),
        })
    }

    /// Attribute at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get_attr(&self, x: i32, y: i32) -> Option<Attr> {
        self.get(x, y).map(|c| c.attr)
    }

    /// Glyph at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get_char(&self, x: i32, y: i32) -> Option<&str> {
        self.record(x, y).map(|r| glyph::read(&r[C::ATTR_SIZE..]))
    }

    fn flags_at(&self, x: i32, y: i32) -> CellFlags {
        self.index(x, y)
            .map_or(CellFlags::empty(), |i| C::flags(&self.cells[i..i + C::ATTR_SIZE]))
    }

    /// Write one record; `flags` replaces the fullwidth markers of `attr`.
    fn write_cell(&mut self, x: i32, y: i32, attr: &Attr, text: &str, fullwidth: CellFlags) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let attr = attr.without_fullwidth().with_flags(fullwidth);
        let record = &mut self.cells[i..i + C::ITEM_SIZE];
        C::encode(&attr, &mut record[..C::ATTR_SIZE]);
        glyph::write(&mut record[C::ATTR_SIZE..], text);
    }

    /// Replace a cell by a blank with its own colors and no fullwidth marker.
    fn blank_cell(&mut self, x: i32, y: i32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let record = &mut self.cells[i..i + C::ITEM_SIZE];
        let mut flags = C::flags(&record[..C::ATTR_SIZE]);
        flags.remove(CellFlags::FULLWIDTH);
        C::set_flags(&mut record[..C::ATTR_SIZE], flags);
        glyph::write(&mut record[C::ATTR_SIZE..], " ");
    }

    /// Blank the other half of a fullwidth pair that `(x, y)` belongs to.
    fn break_pair(&mut self, x: i32, y: i32) {
        let flags = self.flags_at(x, y);
        if flags.contains(CellFlags::LEADING_FULLWIDTH)
            && self.flags_at(x + 1, y).contains(CellFlags::TRAILING_FULLWIDTH)
        {
            self.blank_cell(x + 1, y);
        }
        if flags.contains(CellFlags::TRAILING_FULLWIDTH)
            && self.flags_at(x - 1, y).contains(CellFlags::LEADING_FULLWIDTH)
        {
            self.blank_cell(x - 1, y);
        }
    }

    /// Blank half pairs left at the edges of a rewritten row segment.
    pub(crate) fn repair_fullwidth(&mut self, y: u32, xmin: i32, xmax: i32) {
        let y = y as i32;
        for x in [xmin - 1, xmin, xmax, xmax + 1] {
            let flags = self.flags_at(x, y);
            let orphan_leading = flags.contains(CellFlags::LEADING_FULLWIDTH)
                && !self.flags_at(x + 1, y).contains(CellFlags::TRAILING_FULLWIDTH);
            let orphan_trailing = flags.contains(CellFlags::TRAILING_FULLWIDTH)
                && !self.flags_at(x - 1, y).contains(CellFlags::LEADING_FULLWIDTH);
            if orphan_leading || orphan_trailing {
                self.blank_cell(x, y);
            }
        }
    }

    // ============================================
    // Mutation
    // ============================================

    /// Overwrite every cell (or every cell of `opts.region`) with one glyph
    /// and attribute. Marks the affected rows dirty.
    pub fn fill(&mut self, opts: &FillOptions) {
        let region = opts
            .region
            .map_or(self.bounds(), |r| r.intersect(&self.bounds()));
        if region.is_null() {
            return;
        }

        let attr = opts.attr.unwrap_or_else(C::default_attr).without_fullwidth();
        let mut record = vec![0u8; C::ITEM_SIZE];
        C::encode(&attr, &mut record[..C::ATTR_SIZE]);
        glyph::write_char(&mut record[C::ATTR_SIZE..], opts.glyph);

        for y in region.ymin..=region.ymax {
            let start = self.offset(region.xmin as u32, y as u32);
            let end = self.offset(region.xmax as u32, y as u32) + C::ITEM_SIZE;
            for cell in self.cells[start..end].chunks_exact_mut(C::ITEM_SIZE) {
                cell.copy_from_slice(&record);
            }
            self.repair_fullwidth(y as u32, region.xmin, region.xmax);
            self.mark_row_dirty(y as u32);
        }
    }

    /// Fill the whole buffer with blank default cells.
    pub fn clear(&mut self) {
        self.fill(&FillOptions::default());
    }

    /// Write `text` starting at `(opts.x, opts.y)`.
    ///
    /// The text is composed to NFC and split into grapheme clusters; each
    /// cluster takes one cell, or two for fullwidth clusters (marked leading
    /// and trailing). Clusters too long for a glyph slot keep their base
    /// character, control characters become spaces, and zero-width clusters
    /// are dropped. Writing stops at the edge of the buffer unless
    /// `opts.wrap` is set, and always stops past the last row or column.
    ///
    /// Returns the range of rows touched, which are also marked dirty.
    pub fn put(&mut self, opts: &PutOptions, text: &str) -> Option<Range<u32>> {
        let attr = opts.attr.unwrap_or_else(C::default_attr);
        let text: Cow<'_, str> = if is_nfc(text) {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.nfc().collect())
        };

        let mut cursor = PutCursor {
            x: opts.x.clamp(0, self.width as i32 - 1),
            y: opts.y.clamp(0, self.height as i32 - 1),
            width: self.width as i32,
            height: self.height as i32,
            wrap: opts.wrap,
            direction: opts.direction,
        };
        let mut rows: Option<Range<u32>> = None;

        for cluster in text.graphemes(true) {
            let Some((glyph, cells)) = cell_glyph(cluster) else {
                continue;
            };
            let Some((x, y)) = cursor.place(cells) else {
                break;
            };

            if cells == 2 && x + 1 < self.width as i32 {
                self.break_pair(x, y);
                self.break_pair(x + 1, y);
                self.write_cell(x, y, &attr, glyph, CellFlags::LEADING_FULLWIDTH);
                self.write_cell(x + 1, y, &attr, " ", CellFlags::TRAILING_FULLWIDTH);
            } else {
                // A wide glyph with no room beside it in a vertical run.
                let glyph = if cells == 2 { " " } else { glyph };
                self.break_pair(x, y);
                self.write_cell(x, y, &attr, glyph, CellFlags::empty());
            }

            self.mark_row_dirty(y as u32);
            let y = y as u32;
            rows = Some(match rows {
                None => y..y + 1,
                Some(r) => r.start.min(y)..r.end.max(y + 1),
            });
        }
        rows
    }

    /// Reallocate to a new size, keeping the overlapping top-left region.
    ///
    /// New cells are blank default cells. The shadow is invalidated and every
    /// row is marked dirty.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let len = checked_len::<C>(width, height)?;
        let (old_w, old_h) = self.size();
        let old_cells = std::mem::replace(&mut self.cells, vec![0; len]);

        self.width = width;
        self.height = height;
        self.dirty = vec![true; height as usize];
        self.clear();

        let keep = old_w.min(width);
        let run = keep as usize * C::ITEM_SIZE;
        for y in 0..old_h.min(height) {
            let src = y as usize * old_w as usize * C::ITEM_SIZE;
            let dst = self.offset(0, y);
            self.cells[dst..dst + run].copy_from_slice(&old_cells[src..src + run]);
            self.repair_fullwidth(y, 0, keep as i32 - 1);
        }

        if self.shadow.is_some() {
            self.shadow = Some(Shadow::new(len, height as usize));
        }
        Ok(())
    }

    /// Scroll the content vertically by `offset` rows.
    ///
    /// Positive offsets move content down, negative up. Vacated rows are
    /// filled with `fill` (blank default cells when `None`).
    pub fn vscroll(&mut self, offset: i32, fill: Option<&FillOptions>) {
        let h = self.height as i32;
        let shift = offset.clamp(-h, h);
        if shift == 0 {
            return;
        }

        let row_len = self.width as usize * C::ITEM_SIZE;
        let moved = (h - shift.abs()) as usize * row_len;
        let vacated = if shift > 0 {
            self.cells.copy_within(0..moved, shift as usize * row_len);
            Rect::new(0, 0, self.width as i32 - 1, shift - 1)
        } else {
            let from = (-shift) as usize * row_len;
            self.cells.copy_within(from..from + moved, 0);
            Rect::new(0, h + shift, self.width as i32 - 1, h - 1)
        };

        let fill = fill.cloned().unwrap_or_default().region(vacated);
        self.fill(&fill);
        self.mark_all_dirty();
    }

    /// Text dump of the grid, one line per row.
    ///
    /// Unreadable glyphs show as spaces and trailing fullwidth halves are
    /// omitted, so each line has the on-screen width of the row.
    #[must_use]
    pub fn dump_chars(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() / C::ITEM_SIZE + self.height as usize);
        for row in self.cells.chunks_exact(self.width as usize * C::ITEM_SIZE) {
            for record in row.chunks_exact(C::ITEM_SIZE) {
                let (attr, slot) = record.split_at(C::ATTR_SIZE);
                if C::flags(attr).contains(CellFlags::TRAILING_FULLWIDTH) {
                    continue;
                }
                let g = glyph::read(slot);
                out.push_str(if g == glyph::PLACEHOLDER { " " } else { g });
            }
            out.push('\n');
        }
        out
    }

    // ============================================
    // Drawing
    // ============================================

    fn draw_params(&self, opts: &DrawOptions, dst_size: (u32, u32), tile: bool) -> BlitParams {
        BlitParams {
            src_rect: opts.src_rect.unwrap_or_else(|| self.bounds()),
            dst_rect: opts
                .dst_rect
                .unwrap_or_else(|| Rect::from_size(dst_size.0, dst_size.1)),
            offset_x: opts.x.unwrap_or(self.x).floor() as i32,
            offset_y: opts.y.unwrap_or(self.y).floor() as i32,
            tile,
            blending: opts.blending.or(self.blending),
            delta: opts.delta,
        }
    }

    /// Blit onto another buffer of the same codec.
    pub fn draw(&self, dst: &mut ScreenBuffer<C>, opts: &DrawOptions) -> BlitStats {
        let tile = opts.tile.unwrap_or(self.tile);
        let params = self.draw_params(opts, dst.size(), tile);
        blit::blit_buffer(self, dst, &params)
    }

    /// Emit this buffer to a terminal.
    ///
    /// With `opts.delta`, a shadow of the emitted frame is kept (created on
    /// first use) and unchanged cells are skipped on later draws to the same
    /// origin. Tiling does not apply to terminals. Emits a `"draw"` event with
    /// the statistics as JSON.
    pub fn draw_terminal<W: Write>(
        &mut self,
        term: &mut Terminal<W>,
        opts: &DrawOptions,
    ) -> Result<BlitStats> {
        let params = self.draw_params(opts, term.size(), false);
        if params.delta && self.shadow.is_none() {
            self.enable_shadow();
        }

        let source = RedrawSource {
            width: self.width,
            height: self.height,
            cells: &self.cells,
            dirty: &mut self.dirty,
            shadow: self.shadow.as_mut(),
        };
        let stats = blit::blit_terminal::<C, W>(source, term, &params)?;

        emit_event_with("draw", || serde_json::to_string(&stats).unwrap_or_default());
        Ok(stats)
    }

    /// Keep a shadow of the last frame sent to a terminal.
    pub fn enable_shadow(&mut self) {
        if self.shadow.is_none() {
            self.shadow = Some(Shadow::new(self.cells.len(), self.height as usize));
        }
    }

    /// Drop the shadow; later delta draws start from a full redraw.
    pub fn disable_shadow(&mut self) {
        self.shadow = None;
    }

    /// Force the next terminal draw to emit every cell.
    pub fn invalidate_shadow(&mut self) {
        if let Some(shadow) = &mut self.shadow {
            shadow.invalidate();
        }
    }

    #[must_use]
    pub fn has_shadow(&self) -> bool {
        self.shadow.is_some()
    }
}

impl<C: Codec> Surface for ScreenBuffer<C> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Write position of a `put` run.
struct PutCursor {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    wrap: bool,
    direction: Direction,
}

impl PutCursor {
    /// Reserve `cells` cells and return where the glyph goes, or `None` when
    /// the run has to stop.
    fn place(&mut self, cells: i32) -> Option<(i32, i32)> {
        match self.direction {
            Direction::Right => {
                if self.x + cells > self.width {
                    if !self.wrap || self.y + 1 >= self.height || cells > self.width {
                        return None;
                    }
                    self.x = 0;
                    self.y += 1;
                }
                let pos = (self.x, self.y);
                self.x += cells;
                Some(pos)
            }
            Direction::Left => {
                if self.x - (cells - 1) < 0 {
                    if !self.wrap || self.y == 0 || cells > self.width {
                        return None;
                    }
                    self.x = self.width - 1;
                    self.y -= 1;
                }
                let lead = self.x - (cells - 1);
                let pos = (lead, self.y);
                self.x = lead - 1;
                Some(pos)
            }
            Direction::Down | Direction::Up => {
                if self.y < 0 || self.y >= self.height {
                    if !self.wrap || self.x + 1 >= self.width {
                        return None;
                    }
                    self.x += 1;
                    self.y = if self.direction == Direction::Down {
                        0
                    } else {
                        self.height - 1
                    };
                }
                let pos = (self.x, self.y);
                self.y += if self.direction == Direction::Down { 1 } else { -1 };
                Some(pos)
            }
        }
    }
}

/// Map a grapheme cluster to the text stored in its cell and its width.
///
/// Returns `None` for zero-width clusters.
fn cell_glyph(cluster: &str) -> Option<(&str, i32)> {
    let first = cluster.chars().next()?;
    if first.is_control() {
        return Some((" ", 1));
    }
    let width = UnicodeWidthStr::width(cluster);
    if width == 0 {
        return None;
    }
    let text = if cluster.len() <= glyph::CHAR_SIZE {
        cluster
    } else {
        &cluster[..first.len_utf8()]
    };
    Some((text, width.min(2) as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, Rgba};
    use crate::style::TextStyle;

    fn buf(w: u32, h: u32) -> ScreenBuffer256 {
        ScreenBuffer256::new(w, h).unwrap()
    }

    // ============================================
    // Creation
    // ============================================

    #[test]
    fn test_create_fills_with_blank_default() {
        let b = buf(3, 2);
        assert_eq!(b.size(), (3, 2));
        assert_eq!(b.as_bytes().len(), 3 * 2 * 8);
        let cell = b.get(2, 1).unwrap();
        assert_eq!(cell.glyph, " ");
        assert_eq!(cell.attr, Attr::DEFAULT);
    }

    #[test]
    fn test_create_rgb_default_is_opaque_white_on_black() {
        let b = ScreenBufferRgb::new(1, 1).unwrap();
        assert_eq!(b.get_attr(0, 0), Some(Attr::DEFAULT_RGB));
    }

    #[test]
    fn test_create_no_fill_leaves_zeroes() {
        let b = ScreenBuffer256::create(&BufferOptions::sized(2, 2).no_fill(), None).unwrap();
        assert!(b.as_bytes().iter().all(|&x| x == 0));
        assert_eq!(b.get_char(0, 0), Some(glyph::PLACEHOLDER));
    }

    #[test]
    fn test_create_sized_from_destination() {
        let parent = buf(7, 3);
        let child = ScreenBuffer256::create(&BufferOptions::default(), Some(&parent)).unwrap();
        assert_eq!(child.size(), (7, 3));

        let partial = ScreenBuffer256::create(
            &BufferOptions {
                width: Some(2),
                ..BufferOptions::default()
            },
            Some(&parent),
        )
        .unwrap();
        assert_eq!(partial.size(), (2, 3));
    }

    #[test]
    fn test_create_rejects_bad_sizes() {
        assert!(matches!(
            ScreenBuffer256::new(0, 5),
            Err(Error::InvalidDimensions { width: 0, height: 5 })
        ));
        assert!(ScreenBuffer256::create(&BufferOptions::default(), None).is_err());
        assert!(ScreenBuffer256::new(u32::MAX, u32::MAX).is_err());
    }

    // ============================================
    // Accessors
    // ============================================

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let b = buf(2, 2);
        assert!(b.get(2, 0).is_none());
        assert!(b.get(0, -1).is_none());
        assert!(b.get_attr(5, 5).is_none());
        assert!(b.get_char(-3, 0).is_none());
        assert!(b.record(0, 2).is_none());
    }

    // ============================================
    // Fill
    // ============================================

    #[test]
    fn test_fill_is_idempotent() {
        let mut a = buf(4, 3);
        let attr = AttrRequest::new().color(2).underline().resolve();
        let opts = FillOptions::glyph('#').attr(attr);
        a.fill(&opts);
        let once = a.as_bytes().to_vec();
        a.fill(&opts);
        assert_eq!(a.as_bytes(), once.as_slice());
    }

    #[test]
    fn test_fill_region_is_clipped() {
        let mut b = buf(4, 3);
        b.fill(&FillOptions::glyph('x').region(Rect::new(2, 1, 10, 10)));
        assert_eq!(b.dump_chars(), "    \n  xx\n  xx\n");
    }

    #[test]
    fn test_fill_marks_rows_dirty() {
        let mut b = buf(4, 3);
        b.clear_dirty();
        b.fill(&FillOptions::glyph('x').region(Rect::new(0, 1, 3, 1)));
        assert_eq!(b.dirty_rows().collect::<Vec<_>>(), vec![1]);
    }

    // ============================================
    // Put
    // ============================================

    #[test]
    fn test_put_wrap_example() {
        let mut b = buf(4, 2);
        b.fill(&FillOptions::glyph('x'));
        b.put(&PutOptions::at(0, 0), "AB");
        let rows = b.put(&PutOptions::at(3, 0).wrap(true), "CD");
        assert_eq!(rows, Some(0..2));
        assert_eq!(b.dump_chars(), "ABxC\nDxxx\n");
    }

    #[test]
    fn test_put_without_wrap_truncates() {
        let mut b = buf(4, 2);
        b.fill(&FillOptions::glyph('x'));
        let rows = b.put(&PutOptions::at(3, 0), "CD");
        assert_eq!(rows, Some(0..1));
        assert_eq!(b.dump_chars(), "xxxC\nxxxx\n");
    }

    #[test]
    fn test_put_wrap_stops_after_last_row() {
        let mut b = buf(2, 2);
        b.put(&PutOptions::at(0, 1).wrap(true), "abcdef");
        assert_eq!(b.dump_chars(), "  \nab\n");
    }

    #[test]
    fn test_put_clamps_coordinates() {
        let mut b = buf(3, 2);
        b.put(&PutOptions::at(-5, 9), "z");
        assert_eq!(b.get_char(0, 1), Some("z"));
        b.put(&PutOptions::at(99, 0), "q");
        assert_eq!(b.get_char(2, 0), Some("q"));
    }

    #[test]
    fn test_put_directions() {
        let mut b = buf(3, 3);
        b.put(&PutOptions::at(0, 0).direction(Direction::Down), "abc");
        b.put(&PutOptions::at(2, 2).direction(Direction::Left), "xyz");
        b.put(&PutOptions::at(2, 1).direction(Direction::Up), "u");
        assert_eq!(b.dump_chars(), "a  \nb u\nzyx\n");
    }

    #[test]
    fn test_put_vertical_wrap_moves_to_next_column() {
        let mut b = buf(2, 2);
        b.put(
            &PutOptions::at(0, 0).direction(Direction::Down).wrap(true),
            "abcde",
        );
        assert_eq!(b.dump_chars(), "ac\nbd\n");
    }

    #[test]
    fn test_put_uses_attr() {
        let mut b = buf(2, 1);
        let attr = AttrRequest::new().color("bright-green").bold().resolve();
        b.put(&PutOptions::at(0, 0).attr(attr), "!");
        let got = b.get_attr(0, 0).unwrap();
        assert_eq!(got.fg, Color::Register(10));
        assert_eq!(got.style, TextStyle::BOLD);
        assert_eq!(b.get_attr(1, 0), Some(Attr::DEFAULT));
    }

    #[test]
    fn test_put_fullwidth_pair() {
        let mut b = buf(4, 1);
        b.put(&PutOptions::at(0, 0), "漢a");
        assert_eq!(b.get_char(0, 0), Some("漢"));
        let lead = b.get_attr(0, 0).unwrap();
        let trail = b.get_attr(1, 0).unwrap();
        assert!(lead.flags.contains(CellFlags::LEADING_FULLWIDTH));
        assert!(trail.flags.contains(CellFlags::TRAILING_FULLWIDTH));
        assert_eq!(b.get_char(2, 0), Some("a"));
        assert_eq!(b.dump_chars(), "漢a \n");
    }

    #[test]
    fn test_put_fullwidth_wraps_when_it_does_not_fit() {
        let mut b = buf(3, 2);
        b.put(&PutOptions::at(2, 0).wrap(true), "漢");
        assert_eq!(b.get_char(2, 0), Some(" "));
        assert_eq!(b.get_char(0, 1), Some("漢"));

        let mut b = buf(3, 2);
        assert_eq!(b.put(&PutOptions::at(2, 0), "漢"), None);
    }

    #[test]
    fn test_overwriting_half_a_pair_blanks_the_other() {
        let mut b = buf(4, 1);
        b.put(&PutOptions::at(0, 0), "漢");
        b.put(&PutOptions::at(1, 0), "x");
        assert_eq!(b.dump_chars(), " x  \n");
        assert!(b.get_attr(0, 0).unwrap().flags.is_empty());

        b.put(&PutOptions::at(2, 0), "字");
        b.put(&PutOptions::at(2, 0), "y");
        assert_eq!(b.dump_chars(), " xy \n");
        assert!(b.get_attr(3, 0).unwrap().flags.is_empty());
    }

    #[test]
    fn test_put_normalizes_and_segments() {
        let mut b = buf(4, 1);
        // "e" + combining acute composes to a single code point.
        b.put(&PutOptions::at(0, 0), "e\u{301}");
        assert_eq!(b.get_char(0, 0), Some("\u{e9}"));

        // A family emoji cluster is too long for the slot: its base is kept.
        b.put(&PutOptions::at(0, 0), "👨\u{200d}👩\u{200d}👧");
        assert_eq!(b.get_char(0, 0), Some("👨"));
    }

    #[test]
    fn test_put_control_and_zero_width() {
        let mut b = buf(4, 1);
        b.fill(&FillOptions::glyph('.'));
        b.put(&PutOptions::at(0, 0), "a\tb\u{200b}c");
        assert_eq!(b.dump_chars(), "a bc\n");
    }

    #[test]
    fn test_put_returns_touched_rows() {
        let mut b = buf(3, 4);
        b.clear_dirty();
        let rows = b.put(&PutOptions::at(1, 1).direction(Direction::Down), "ab");
        assert_eq!(rows, Some(1..3));
        assert_eq!(b.dirty_rows().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(b.put(&PutOptions::at(0, 0), ""), None);
    }

    #[test]
    fn test_put_rgb_request_on_register_codec() {
        let mut b = buf(1, 1);
        let attr = AttrRequest::new().color(Rgba::rgb(0, 0, 255)).resolve();
        b.put(&PutOptions::at(0, 0).attr(attr), "b");
        assert_eq!(b.get_attr(0, 0).unwrap().fg, Color::Register(21));
    }

    // ============================================
    // Resize / scroll
    // ============================================

    #[test]
    fn test_resize_keeps_top_left() {
        let mut b = buf(3, 2);
        b.put(&PutOptions::at(0, 0).wrap(true), "abcdef");
        b.resize(2, 3).unwrap();
        assert_eq!(b.dump_chars(), "ab\nde\n  \n");
        assert!(b.resize(0, 3).is_err());
        assert_eq!(b.size(), (2, 3));
    }

    #[test]
    fn test_resize_blanks_cut_pair() {
        let mut b = buf(3, 1);
        b.put(&PutOptions::at(1, 0), "漢");
        b.resize(2, 1).unwrap();
        assert!(b.get_attr(1, 0).unwrap().flags.is_empty());
        assert_eq!(b.dump_chars(), "  \n");
    }

    #[test]
    fn test_vscroll_both_ways() {
        let mut b = buf(2, 3);
        b.put(&PutOptions::at(0, 0).wrap(true), "aabbcc");

        b.vscroll(1, None);
        assert_eq!(b.dump_chars(), "  \naa\nbb\n");

        b.vscroll(-2, Some(&FillOptions::glyph('~')));
        assert_eq!(b.dump_chars(), "bb\n~~\n~~\n");

        b.vscroll(10, None);
        assert_eq!(b.dump_chars(), "  \n  \n  \n");
    }

    // ============================================
    // Shadow
    // ============================================

    #[test]
    fn test_shadow_lifecycle() {
        let mut b = buf(2, 2);
        assert!(!b.has_shadow());
        b.enable_shadow();
        assert!(b.has_shadow());
        b.invalidate_shadow();
        b.disable_shadow();
        assert!(!b.has_shadow());
    }
}
