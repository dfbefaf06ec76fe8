//! Blitter: copy or composite a buffer region onto another buffer or a terminal.
//!
//! Both paths start the same way: the source region and the destination
//! region are clipped against each other through the draw offset with
//! [`Rect::clip`], so a source cell `(x, y)` always lands on `(x + ox, y + oy)`.
//!
//! - **Buffer targets** copy whole row segments when blending is off, and
//!   composite cell by cell through [`Codec::blend`] when it is on. With
//!   `tile`, the source region repeats to cover the destination region.
//! - **Terminal targets** walk the region row by row and append cursor
//!   moves, style transitions and glyphs to the terminal's accumulator. A
//!   [`RedrawSession`] tracks what the terminal currently shows, so moves and
//!   escapes are only emitted when something differs. With `delta`, cells
//!   equal to the shadow copy of the last frame are skipped entirely.

pub mod blend;

use crate::ansi::transition;
use crate::attr::Attr;
use crate::buffer::ScreenBuffer;
use crate::codec::Codec;
use crate::glyph;
use crate::rect::Rect;
use crate::style::CellFlags;
use crate::terminal::Terminal;
use blend::Blending;
use serde::Serialize;
use std::io::{self, Write};

/// Redraw statistics. Diagnostic only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlitStats {
    /// Cells visited. Delta terminal draws count only cells that changed.
    pub cells: usize,
    /// Cursor moves emitted.
    pub moves: usize,
    /// Style transitions emitted.
    pub attrs: usize,
    /// Glyphs written.
    pub chars: usize,
    /// Writes to the output sink.
    pub writes: usize,
}

/// Fully resolved parameters of one blit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlitParams {
    /// Source region, in source coordinates.
    pub src_rect: Rect,
    /// Destination region, in destination coordinates.
    pub dst_rect: Rect,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Repeat the source to cover the destination region (buffer targets).
    pub tile: bool,
    /// `None` copies raw records.
    pub blending: Option<Blending>,
    /// Skip cells unchanged since the last terminal draw, emit minimal escapes.
    pub delta: bool,
}

/// Copy of the last frame sent to a terminal, in source coordinates.
#[derive(Clone, Debug)]
pub(crate) struct Shadow {
    cells: Vec<u8>,
    /// Rows whose every cell was sent by an earlier draw.
    synced: Vec<bool>,
    origin: Option<(i32, i32)>,
}

impl Shadow {
    /// Never equal to a record produced by `put` or `fill`.
    const STALE: u8 = 0xFF;

    pub(crate) fn new(len: usize, rows: usize) -> Self {
        Self {
            cells: vec![Self::STALE; len],
            synced: vec![false; rows],
            origin: None,
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.cells.fill(Self::STALE);
        self.synced.fill(false);
    }

    /// Drop the contents when the destination origin moves.
    fn retarget(&mut self, origin: (i32, i32)) {
        if self.origin != Some(origin) {
            self.invalidate();
            self.origin = Some(origin);
        }
    }
}

/// What the terminal is known to show during one draw pass.
#[derive(Debug, Default)]
pub struct RedrawSession {
    /// Attribute bytes of the last emitted transition.
    last_bytes: Vec<u8>,
    last_attr: Option<Attr>,
    /// Where the next glyph would land without a move.
    cursor: Option<(i32, i32)>,
    stats: BlitStats,
}

impl RedrawSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> BlitStats {
        self.stats
    }

    /// Move the cursor unless it is already at `(x, y)`.
    fn move_to(&mut self, out: &mut Vec<u8>, esc: &crate::ansi::EscapeTable, x: i32, y: i32) {
        if self.cursor != Some((x, y)) {
            (esc.move_to)(out, x as u32, y as u32);
            self.stats.moves += 1;
            self.cursor = Some((x, y));
        }
    }

    /// Switch style unless the attribute bytes are unchanged.
    fn set_attr<C: Codec>(
        &mut self,
        out: &mut Vec<u8>,
        esc: &crate::ansi::EscapeTable,
        bytes: &[u8],
        minimal: bool,
    ) {
        if self.last_attr.is_some() && self.last_bytes == bytes {
            return;
        }
        let next = C::decode(bytes);
        transition::write_transition(esc, out, self.last_attr.as_ref(), &next, minimal);
        self.stats.attrs += 1;
        self.last_attr = Some(next);
        self.last_bytes.clear();
        self.last_bytes.extend_from_slice(bytes);
    }
}

/// Clip `src` and `dst` regions against their grids and each other.
fn clip_pair(p: &BlitParams, src_bounds: Rect, dst_bounds: Rect) -> (Rect, Rect) {
    let mut src = p.src_rect.intersect(&src_bounds);
    let mut dst = p.dst_rect.intersect(&dst_bounds);
    src.clip(&mut dst, p.offset_x, p.offset_y, true);
    (src, dst)
}

/// Copy or composite `src` onto another buffer.
pub(crate) fn blit_buffer<C: Codec>(
    src: &ScreenBuffer<C>,
    dst: &mut ScreenBuffer<C>,
    p: &BlitParams,
) -> BlitStats {
    if p.tile {
        return blit_tiled(src, dst, p);
    }

    let mut stats = BlitStats::default();
    let (src_rect, dst_rect) = clip_pair(p, src.bounds(), dst.bounds());
    if src_rect.is_null() {
        return stats;
    }

    let item = C::ITEM_SIZE;
    let run = src_rect.width() as usize * item;
    for sy in src_rect.ymin..=src_rect.ymax {
        let dy = sy + p.offset_y;
        let s_off = src.offset(src_rect.xmin as u32, sy as u32);
        let d_off = dst.offset(dst_rect.xmin as u32, dy as u32);
        let src_row = &src.cells()[s_off..s_off + run];
        let dst_row = &mut dst.cells_mut()[d_off..d_off + run];

        match &p.blending {
            None => dst_row.copy_from_slice(src_row),
            Some(blending) => {
                for (s, d) in src_row.chunks_exact(item).zip(dst_row.chunks_exact_mut(item)) {
                    C::blend(s, d, blending);
                }
            }
        }
        stats.cells += src_rect.width() as usize;
        dst.repair_fullwidth(dy as u32, dst_rect.xmin, dst_rect.xmax);
        dst.mark_row_dirty(dy as u32);
    }
    stats
}

/// Cover the destination region with repetitions of the source region.
fn blit_tiled<C: Codec>(
    src: &ScreenBuffer<C>,
    dst: &mut ScreenBuffer<C>,
    p: &BlitParams,
) -> BlitStats {
    let mut stats = BlitStats::default();
    let src_rect = p.src_rect.intersect(&src.bounds());
    let dst_rect = p.dst_rect.intersect(&dst.bounds());
    if src_rect.is_null() || dst_rect.is_null() {
        return stats;
    }

    let item = C::ITEM_SIZE;
    // Offsets may be anywhere in i32, so wrap in i64.
    let wrap = |d: i32, offset: i32, min: i32, len: i32| -> i32 {
        let rel = i64::from(d) - i64::from(offset) - i64::from(min);
        min + rel.rem_euclid(i64::from(len)) as i32
    };
    let (sw, sh) = (src_rect.width(), src_rect.height());
    for dy in dst_rect.ymin..=dst_rect.ymax {
        let sy = wrap(dy, p.offset_y, src_rect.ymin, sh);
        for dx in dst_rect.xmin..=dst_rect.xmax {
            let sx = wrap(dx, p.offset_x, src_rect.xmin, sw);
            let s_off = src.offset(sx as u32, sy as u32);
            let d_off = dst.offset(dx as u32, dy as u32);
            let s = &src.cells()[s_off..s_off + item];
            let d = &mut dst.cells_mut()[d_off..d_off + item];
            match &p.blending {
                None => d.copy_from_slice(s),
                Some(blending) => C::blend(s, d, blending),
            }
            stats.cells += 1;
        }
        dst.repair_fullwidth(dy as u32, dst_rect.xmin, dst_rect.xmax);
        dst.mark_row_dirty(dy as u32);
    }
    stats
}

/// Source side of a terminal redraw.
pub(crate) struct RedrawSource<'a> {
    pub width: u32,
    pub height: u32,
    pub cells: &'a [u8],
    pub dirty: &'a mut [bool],
    pub shadow: Option<&'a mut Shadow>,
}

/// Emit the source region to a terminal.
///
/// Tiling is not applied on terminal targets. I/O errors from the sink
/// propagate; whatever was accumulated before the error stays pending.
pub(crate) fn blit_terminal<C: Codec, W: Write>(
    src: RedrawSource<'_>,
    term: &mut Terminal<W>,
    p: &BlitParams,
) -> io::Result<BlitStats> {
    let RedrawSource {
        width,
        height,
        cells,
        dirty,
        mut shadow,
    } = src;

    let (tw, th) = term.size();
    let (src_rect, _) = clip_pair(p, Rect::from_size(width, height), Rect::from_size(tw, th));
    let mut session = RedrawSession::new();
    if src_rect.is_null() {
        return Ok(session.stats);
    }

    if let Some(shadow) = shadow.as_deref_mut() {
        shadow.retarget((p.offset_x, p.offset_y));
    }

    let esc = *term.escapes();
    let item = C::ITEM_SIZE;
    let attr_size = C::ATTR_SIZE;
    let full_rows = src_rect.xmin == 0 && src_rect.xmax == width as i32 - 1;

    for sy in src_rect.ymin..=src_rect.ymax {
        let row = sy as usize;
        if p.delta && full_rows && !dirty[row] {
            if let Some(shadow) = shadow.as_deref() {
                if shadow.synced[row] {
                    continue;
                }
            }
        }

        for sx in src_rect.xmin..=src_rect.xmax {
            let off = (row * width as usize + sx as usize) * item;
            let record = &cells[off..off + item];

            if let Some(shadow) = shadow.as_deref_mut() {
                let last = &mut shadow.cells[off..off + item];
                if p.delta && *last == *record {
                    continue;
                }
                last.copy_from_slice(record);
            }
            session.stats.cells += 1;

            let attr_bytes = &record[..attr_size];
            let flags = C::flags(attr_bytes);
            let at_left_edge = sx == src_rect.xmin;
            if flags.contains(CellFlags::TRAILING_FULLWIDTH) && !at_left_edge {
                continue;
            }

            let out = term.out_mut();
            session.move_to(out, &esc, sx + p.offset_x, sy + p.offset_y);
            session.set_attr::<C>(out, &esc, attr_bytes, p.delta);

            // A pair cut by either clip edge shows as a blank half.
            let cut_leading = flags.contains(CellFlags::LEADING_FULLWIDTH) && sx == src_rect.xmax;
            let slot = &record[attr_size..];
            let text = if flags.contains(CellFlags::TRAILING_FULLWIDTH)
                || cut_leading
                || glyph::is_placeholder(slot)
            {
                " "
            } else {
                glyph::read(slot)
            };
            out.extend_from_slice(text.as_bytes());
            session.stats.chars += 1;

            let advance = if flags.contains(CellFlags::LEADING_FULLWIDTH) && !cut_leading {
                2
            } else {
                1
            };
            session.cursor = session.cursor.map(|(x, y)| (x + advance, y));

            if term.flush_if_over()? {
                session.stats.writes += 1;
            }
        }

        if full_rows {
            dirty[row] = false;
            if let Some(shadow) = shadow.as_deref_mut() {
                shadow.synced[row] = true;
            }
        }
    }

    if term.flush_pending()? {
        session.stats.writes += 1;
    }
    Ok(session.stats)
}
