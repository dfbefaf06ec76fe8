//! Inclusive integer rectangles with paired clipping.
//!
//! A [`Rect`] stores inclusive corners. Width and height are derived, and a
//! rectangle whose corners cross (`xmax < xmin` or `ymax < ymin`) is null.
//!
//! [`Rect::clip`] is the primitive the blitter relies on: it intersects a
//! source rectangle with a destination rectangle seen through an offset, and
//! can shrink the destination by exactly the same amount so the two stay
//! aligned cell for cell.

use crate::terminal::terminal_size;

/// Size used when the terminal size cannot be queried.
pub const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Axis-aligned rectangle with inclusive corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl Rect {
    /// Create a rectangle from its inclusive corners.
    #[must_use]
    pub const fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Rectangle covering `width` x `height` cells from the origin.
    ///
    /// A zero dimension yields a null rectangle.
    #[must_use]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::from_origin_size(0, 0, width, height)
    }

    /// Rectangle covering `width` x `height` cells starting at `(x, y)`.
    #[must_use]
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        let (xmin, xmax) = span(x, w);
        let (ymin, ymax) = span(y, h);
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Rectangle covering the controlling terminal.
    ///
    /// Falls back to 80x24 when stdout is not a terminal.
    #[must_use]
    pub fn terminal() -> Self {
        let (w, h) = terminal_size().unwrap_or(FALLBACK_SIZE);
        Self::from_size(u32::from(w), u32::from(h))
    }

    /// Width in cells; zero or negative when null.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.xmax.saturating_sub(self.xmin).saturating_add(1)
    }

    /// Height in cells; zero or negative when null.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.ymax.saturating_sub(self.ymin).saturating_add(1)
    }

    /// Check whether the rectangle covers no cell.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Check whether the point lies inside.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Number of covered cells.
    #[must_use]
    pub fn area(&self) -> usize {
        if self.is_null() {
            0
        } else {
            (self.width() as usize).saturating_mul(self.height() as usize)
        }
    }

    /// Clip this rectangle against `dst` translated back by the offset.
    ///
    /// `self` lives in source coordinates and `dst` in destination
    /// coordinates; a source cell `(x, y)` lands on `(x + offset_x, y +
    /// offset_y)`. After the call `self` covers only source cells that land
    /// inside `dst`. With `mutate_dst`, `dst` is set to the image of the
    /// clipped `self`, so both rectangles have identical size and are null
    /// together when nothing overlaps.
    pub fn clip(&mut self, dst: &mut Rect, offset_x: i32, offset_y: i32, mutate_dst: bool) {
        self.xmin = self.xmin.max(dst.xmin.saturating_sub(offset_x));
        self.xmax = self.xmax.min(dst.xmax.saturating_sub(offset_x));
        self.ymin = self.ymin.max(dst.ymin.saturating_sub(offset_y));
        self.ymax = self.ymax.min(dst.ymax.saturating_sub(offset_y));

        if mutate_dst {
            dst.xmin = self.xmin.saturating_add(offset_x);
            dst.xmax = self.xmax.saturating_add(offset_x);
            dst.ymin = self.ymin.saturating_add(offset_y);
            dst.ymax = self.ymax.saturating_add(offset_y);
        }
    }

    /// Intersection of two rectangles in the same coordinate space.
    #[must_use]
    pub fn intersect(&self, other: &Rect) -> Rect {
        let mut out = *self;
        let mut other = *other;
        out.clip(&mut other, 0, 0, false);
        out
    }
}

/// Inclusive bounds of `len` cells starting at `start`, saturating at the
/// edges of the coordinate space. An empty span always has `max < min`.
const fn span(start: i32, len: i32) -> (i32, i32) {
    match len {
        0 if start == i32::MIN => (start + 1, start),
        0 => (start, start - 1),
        _ => (start, start.saturating_add(len - 1)),
    }
}
