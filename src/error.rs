//! Error types for zipit compression.

use thiserror::Error;

/// Error variants for compress and decompress operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing to compress, or nothing came out of a decompression.
    #[error("empty input")]
    EmptyInput,

    /// A code tree was requested for a frequency table with no symbols.
    #[error("cannot build a code tree from an empty alphabet")]
    InvalidAlphabet,

    /// The container's method tag names no registered codec.
    #[error("unsupported compression method tag: {0}")]
    UnsupportedMethod(u8),

    /// The container could not be decoded.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// Compression level outside 0..=9.
    #[error("invalid compression level {0} (expected 0-9)")]
    InvalidLevel(u32),

    /// An I/O error occurred while writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptStream(msg.into())
    }
}

/// A specialized Result type for zipit operations.
pub type Result<T> = std::result::Result<T, Error>;
