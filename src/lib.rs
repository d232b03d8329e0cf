//! Streaming LZMA decoder.
//!
//! Decodes raw LZMA streams (5-byte properties header, range-coded body,
//! optional end marker) from any [`std::io::Read`] into any
//! [`std::io::Write`], using a bounded sliding window.
//!
//! Typical use is unpacking a compressed resource shipped inside a binary:
//! see [`EmbeddedPayload`] and [`decompress_to_vec`].
//!
//! ## Features
//! - `async` - Async file reading with tokio
//!
//! ## Example
//!
//! ```rust,ignore
//! use lzma_stream::decompress_alone;
//!
//! let file = std::fs::File::open("payload.lzma")?;
//! let mut out = Vec::new();
//! let written = decompress_alone(std::io::BufReader::new(file), &mut out)?;
//! ```

mod container;
pub mod decompress;
pub mod error;
mod file_media;

pub use container::{
    decompress_alone, decompress_alone_with_options, decompress_to_vec, AloneHeader,
    EmbeddedPayload,
};
pub use error::LzmaError;
pub use file_media::LocalFileMedia;

#[cfg(feature = "async")]
pub use file_media::{decompress_media, FileMedia};

// Re-export decompression types
pub use decompress::{
    DecoderOptions, DecompressError, FormatError, LzmaDecoder, LzmaProperties,
};
