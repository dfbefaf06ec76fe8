//! Error types for screen buffer operations.

use std::fmt;
use std::io;

/// Result type alias for screen buffer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for screen buffer operations.
///
/// Only the rare, strict entry points (creation, resize, file loading and
/// terminal output) produce errors. Drawing calls clamp instead.
#[derive(Debug)]
pub enum Error {
    /// I/O error from file or terminal operations.
    Io(io::Error),
    /// Buffer dimension error (zero or overflowing width/height).
    InvalidDimensions { width: u32, height: u32 },
    /// The file does not start with the `SB\n` magic.
    BadMagic,
    /// No newline terminates the JSON header.
    MissingHeaderTerminator,
    /// The header line is not a valid JSON object.
    InvalidHeader(String),
    /// A mandatory header field is absent.
    MissingField(&'static str),
    /// The header declares a format version this crate cannot read.
    UnsupportedVersion(u64),
    /// The header `bitsPerColor` does not match the codec.
    BitsPerColorMismatch { expected: u8, found: u64 },
    /// The cell body is not exactly `width * height * ITEM_SIZE` bytes.
    BodySizeMismatch { expected: usize, found: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid dimensions: {width}x{height}")
            }
            Self::BadMagic => write!(f, "not a screen buffer file: bad magic number"),
            Self::MissingHeaderTerminator => {
                write!(f, "screen buffer header is not terminated by a newline")
            }
            Self::InvalidHeader(msg) => write!(f, "invalid screen buffer header: {msg}"),
            Self::MissingField(name) => {
                write!(f, "screen buffer header is missing field `{name}`")
            }
            Self::UnsupportedVersion(v) => {
                write!(f, "unsupported screen buffer format version {v}")
            }
            Self::BitsPerColorMismatch { expected, found } => write!(
                f,
                "bits per color mismatch: file has {found}, codec expects {expected}"
            ),
            Self::BodySizeMismatch { expected, found } => write!(
                f,
                "cell data size mismatch: expected {expected} bytes, found {found}"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
