//! Saved buffer file format, version 2.
//!
//! ```text
//! "SB\n" <single-line JSON header> "\n" <raw cell records>
//! ```
//!
//! The header carries `version`, `width`, `height` and `bitsPerColor`.
//! Unknown header fields are ignored. The body must be exactly
//! `width * height * ITEM_SIZE` bytes; anything else is rejected.

use super::ScreenBuffer;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log_with};
use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

/// Leading bytes of every saved buffer.
pub const MAGIC: &[u8] = b"SB\n";
/// Format version written by [`ScreenBuffer::save`].
pub const FORMAT_VERSION: u64 = 2;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HeaderOut {
    version: u64,
    width: u32,
    height: u32,
    bits_per_color: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderIn {
    version: Option<u64>,
    width: Option<u64>,
    height: Option<u64>,
    bits_per_color: Option<u64>,
}

impl<C: Codec> ScreenBuffer<C> {
    /// Serialize to the saved buffer format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = HeaderOut {
            version: FORMAT_VERSION,
            width: self.width,
            height: self.height,
            bits_per_color: C::BITS_PER_COLOR,
        };
        // A struct of integers always serializes.
        let json = serde_json::to_vec(&header).unwrap_or_default();

        let mut out = Vec::with_capacity(MAGIC.len() + json.len() + 1 + self.cells.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&json);
        out.push(b'\n');
        out.extend_from_slice(&self.cells);
        out
    }

    /// Parse the saved buffer format.
    ///
    /// The result has no shadow, default draw settings, and every row dirty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let rest = bytes.strip_prefix(MAGIC).ok_or(Error::BadMagic)?;
        let newline = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(Error::MissingHeaderTerminator)?;
        let (line, body) = (&rest[..newline], &rest[newline + 1..]);

        let header: HeaderIn =
            serde_json::from_slice(line).map_err(|e| Error::InvalidHeader(e.to_string()))?;
        let version = header.version.ok_or(Error::MissingField("version"))?;
        let width = header.width.ok_or(Error::MissingField("width"))?;
        let height = header.height.ok_or(Error::MissingField("height"))?;

        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        if let Some(bits) = header.bits_per_color {
            if bits != u64::from(C::BITS_PER_COLOR) {
                return Err(Error::BitsPerColorMismatch {
                    expected: C::BITS_PER_COLOR,
                    found: bits,
                });
            }
        }

        let width = u32::try_from(width).unwrap_or(u32::MAX);
        let height = u32::try_from(height).unwrap_or(u32::MAX);
        let expected = super::checked_len::<C>(width, height)?;
        if body.len() != expected {
            return Err(Error::BodySizeMismatch {
                expected,
                found: body.len(),
            });
        }

        Ok(Self {
            width,
            height,
            cells: body.to_vec(),
            dirty: vec![true; height as usize],
            shadow: None,
            x: 0.0,
            y: 0.0,
            tile: false,
            blending: None,
            codec: PhantomData,
        })
    }

    /// Write the buffer to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())?;
        emit_log_with(LogLevel::Debug, || {
            format!(
                "saved {}x{} buffer to {}",
                self.width,
                self.height,
                path.display()
            )
        });
        Ok(())
    }

    /// Read a buffer from `path`.
    ///
    /// Fails on I/O errors and on any format violation; nothing is loaded
    /// partially.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let loaded = fs::read(path)
            .map_err(Error::from)
            .and_then(|bytes| Self::from_bytes(&bytes));

        match &loaded {
            Ok(buf) => emit_log_with(LogLevel::Debug, || {
                format!(
                    "loaded {}x{} buffer from {}",
                    buf.width,
                    buf.height,
                    path.display()
                )
            }),
            Err(e) => emit_log_with(LogLevel::Warn, || {
                format!("rejected buffer file {}: {e}", path.display())
            }),
        }
        loaded
    }
}
