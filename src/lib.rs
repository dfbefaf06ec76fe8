//! `screenbuffer` - cell-based terminal screen buffers
//!
//! Off-screen grids of fixed-size binary cell records that can be composited
//! onto each other with alpha blending and emitted to a terminal with
//! minimal escape sequences.
//!
//! # Overview
//!
//! - [`ScreenBuffer`] holds the cells. Its [`Codec`] type parameter picks the
//!   record layout: [`Codec256`] (256 palette registers, 8 bytes per cell) or
//!   [`CodecRgb`] (24-bit RGBA, 14 bytes per cell).
//! - [`AttrRequest`] is the loose, builder-style attribute description; it
//!   resolves to a typed [`Attr`] once, at the API boundary.
//! - [`ScreenBuffer::draw`] blits onto another buffer (copy, blend or tile);
//!   [`ScreenBuffer::draw_terminal`] emits onto a [`Terminal`], optionally
//!   skipping everything unchanged since the previous frame.
//!
//! # Example
//!
//! ```
//! use screenbuffer::{AttrRequest, DrawOptions, PutOptions, ScreenBuffer256, Terminal};
//!
//! let mut buf = ScreenBuffer256::new(10, 1).unwrap();
//! let attr = buf.resolve_attr(&AttrRequest::new().color("yellow").bold());
//! buf.put(&PutOptions::at(0, 0).attr(attr), "hello");
//!
//! let mut term = Terminal::new(Vec::new(), 80, 24);
//! let stats = buf.draw_terminal(&mut term, &DrawOptions::at(0.0, 0.0).delta(true)).unwrap();
//! assert_eq!(stats.chars, 10);
//!
//! // Nothing changed: the second frame writes nothing.
//! let stats = buf.draw_terminal(&mut term, &DrawOptions::at(0.0, 0.0).delta(true)).unwrap();
//! assert_eq!(stats.chars, 0);
//! ```

// Crate-level lint configuration
#![warn(unsafe_code)] // Unsafe code needs justification (required for the ioctl FFI)
#![allow(clippy::cast_possible_truncation)] // Intentional coordinate casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_precision_loss)] // Intentional for color math
#![allow(clippy::cast_possible_wrap)] // Intentional coordinate conversions
#![allow(clippy::module_name_repetitions)] // Allow buffer::BufferOptions etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::suboptimal_flops)] // Standard math notation is clearer than mul_add
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod ansi;
pub mod attr;
pub mod blit;
pub mod buffer;
pub mod codec;
pub mod color;
pub mod error;
pub mod event;
pub mod glyph;
pub mod rect;
pub mod style;
pub mod terminal;

// Re-export core types at crate root
pub use attr::{Attr, AttrRequest, ColorSpec};
pub use codec::{Codec, Codec256, CodecRgb};
pub use color::{Color, Rgba, named_color};
pub use error::{Error, Result};
pub use event::{
    LogLevel, clear_event_callback, clear_log_callback, emit_event, emit_log, set_event_callback,
    set_log_callback,
};
pub use rect::Rect;
pub use style::{CellFlags, TextStyle};

// Re-export buffer types
pub use buffer::{
    BufferOptions, CellRef, Direction, DrawOptions, FillOptions, PutOptions, ScreenBuffer,
    ScreenBuffer256, ScreenBufferRgb, Surface,
};

// Re-export blitter and terminal types
pub use blit::BlitStats;
pub use blit::blend::{BlendFn, Blending};
pub use terminal::{Terminal, is_tty, terminal_size};
