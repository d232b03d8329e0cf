//! Error types for container parsing and decompression.
//!
//! [`LzmaError`] is the top-level error returned by the container helpers
//! and file sources. Engine failures arrive wrapped in
//! [`LzmaError::Decompress`].
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Container | [`HeaderTooShort`], [`InvalidUncompressedSize`] | The 13-byte header is unusable |
//! | Decompression | [`Decompress`] | Bad properties, truncated or corrupt stream |
//! | I/O | [`Io`] | Read/write errors outside the decoder |
//!
//! ## Example
//!
//! ```rust
//! use lzma_stream::{decompress_to_vec, LzmaError};
//!
//! match decompress_to_vec(&[0x5d, 0x00]) {
//!     Ok(data) => println!("{} bytes", data.len()),
//!     Err(LzmaError::HeaderTooShort { needed, have }) => {
//!         eprintln!("need {} header bytes, got {}", needed, have)
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! [`HeaderTooShort`]: LzmaError::HeaderTooShort
//! [`InvalidUncompressedSize`]: LzmaError::InvalidUncompressedSize
//! [`Decompress`]: LzmaError::Decompress
//! [`Io`]: LzmaError::Io

use crate::decompress::{DecompressError, FormatError};
use std::io;
use thiserror::Error;

/// Error type for LZMA operations.
#[derive(Debug, Error)]
pub enum LzmaError {
    /// The input ends inside the container header.
    #[error("header too short: need {needed} bytes, have {have}")]
    HeaderTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// The declared uncompressed size does not fit a signed 64-bit length.
    ///
    /// `u64::MAX` is reserved for "unknown, decode to end marker" and is
    /// never reported here.
    #[error("invalid uncompressed size: {0}")]
    InvalidUncompressedSize(u64),

    /// Decoding failed.
    #[error(transparent)]
    Decompress(#[from] DecompressError),

    /// An I/O error occurred outside the decoder.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<FormatError> for LzmaError {
    fn from(e: FormatError) -> Self {
        Self::Decompress(DecompressError::Format(e))
    }
}

impl LzmaError {
    /// Whether the compressed bytes themselves are bad.
    pub fn is_corrupt(&self) -> bool {
        match self {
            Self::Decompress(e) => e.is_corrupt(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LzmaError>;
