//! LZMA decompression engine.
//!
//! This module decodes a single self-contained LZMA stream: an adaptive
//! binary range coder feeding tree-structured probability models, an
//! LZ77 back-reference machine and a circular output window.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`RangeDecoder`] | Bit-level arithmetic decoding over a byte source |
//! | [`BitTreeDecoder`] | Fixed-depth tree-coded integers (forward and reverse) |
//! | [`LengthDecoder`] | Match and rep lengths (`2..=273`) |
//! | [`LiteralDecoder`] | Context-selected literal bytes, plain or match-assisted |
//! | [`OutputWindow`] | Dictionary buffer, back-copies and sink flushing |
//! | [`LzmaDecoder`] | Symbol state machine tying the above together |
//!
//! ## Example
//!
//! ```rust
//! use lzma_stream::LzmaDecoder;
//!
//! let mut decoder = LzmaDecoder::new();
//! // Properties are the 5-byte header: lc/lp/pb byte + dictionary size.
//! decoder.set_properties(&[0x5d, 0x00, 0x00, 0x01, 0x00]).unwrap();
//! // decoder.decode(&mut input, &mut output, -1)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Compressed Data
//!       ↓
//! ┌──────────────┐
//! │ RangeDecoder │ ← Adaptive bits, direct bits
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ Literal /    │ ← Bytes, lengths, position slots
//! │ Length / Pos │
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ LzmaDecoder  │ ← 12-state machine, rep distances
//! └──────────────┘
//!       ↓
//! ┌──────────────┐
//! │ OutputWindow │ ← Literals and back-references, flushed to the sink
//! └──────────────┘
//!       ↓
//! Decompressed Data
//! ```

mod bit_tree;
mod length;
mod literal;
mod lzma;
mod properties;
mod range_decoder;
mod state;
mod window;

#[cfg(test)]
pub(crate) mod test_stream;

pub use bit_tree::{reverse_decode, BitTreeDecoder};
pub use length::LengthDecoder;
pub use literal::LiteralDecoder;
pub use lzma::{DecoderOptions, LzmaDecoder};
pub use properties::{LzmaProperties, PROPERTIES_SIZE};
pub use range_decoder::RangeDecoder;
pub use state::State;
pub use window::OutputWindow;

use std::io;
use thiserror::Error;

/// Number of bits in a probability model.
pub const NUM_BIT_MODEL_TOTAL_BITS: u32 = 11;
/// Probability scale (2048).
pub const BIT_MODEL_TOTAL: u32 = 1 << NUM_BIT_MODEL_TOTAL_BITS;
/// Adaptation shift applied after every decoded bit.
pub const NUM_MOVE_BITS: u32 = 5;
/// Initial probability (one half).
pub const INITIAL_PROB: u16 = (BIT_MODEL_TOTAL / 2) as u16;

/// Shortest match the format can express.
pub const MATCH_MIN_LEN: u32 = 2;
/// Upper bound on `pb`.
pub const NUM_POS_STATES_BITS_MAX: u32 = 4;
pub const NUM_POS_STATES_MAX: usize = 1 << NUM_POS_STATES_BITS_MAX;
/// Upper bound on `lc`.
pub const NUM_LIT_CONTEXT_BITS_MAX: u32 = 8;
/// Upper bound on `lp`.
pub const NUM_LIT_POS_BITS_MAX: u32 = 4;

pub const NUM_LEN_TO_POS_STATES: usize = 4;
pub const NUM_POS_SLOT_BITS: u32 = 6;
pub const NUM_ALIGN_BITS: u32 = 4;
pub const START_POS_MODEL_INDEX: u32 = 4;
pub const END_POS_MODEL_INDEX: u32 = 14;
pub const NUM_FULL_DISTANCES: usize = 1 << (END_POS_MODEL_INDEX / 2);

/// Smallest window the decoder allocates, whatever the dictionary size.
pub const MIN_WINDOW_SIZE: usize = 1 << 12;

/// Reconstructed distance that marks the end of the stream.
pub const END_MARKER_DISTANCE: u32 = 0xFFFF_FFFF;

/// Invalid stream properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Fewer than the five header bytes were supplied.
    #[error("properties need 5 bytes, got {0}")]
    PropertiesTooShort(usize),
    /// The properties byte decodes outside `lc <= 8`, `lp <= 4`, `pb <= 4`.
    #[error("invalid lc/lp/pb: lc={lc}, lp={lp}, pb={pb}")]
    InvalidLcLpPb { lc: u32, lp: u32, pb: u32 },
    /// The stream asks for more dictionary than the decoder is allowed to allocate.
    #[error("dictionary size {size} exceeds limit {limit}")]
    DictionaryTooLarge { size: u32, limit: u32 },
}

/// Decompression errors.
#[derive(Debug, Error)]
pub enum DecompressError {
    /// Invalid properties.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// `decode` was called before `set_properties`.
    #[error("decoder properties not set")]
    NotConfigured,
    /// The input ended while the decoder still needed bytes.
    #[error("compressed stream truncated")]
    StreamTruncated,
    /// A back-reference points outside the produced data or the window.
    #[error("corrupt stream: distance {distance} at position {position} (dictionary {dictionary_size})")]
    CorruptStream {
        distance: u32,
        position: u64,
        dictionary_size: u32,
    },
    /// The end marker showed up before the declared length was reached.
    #[error("end marker at position {position}, expected {expected} bytes")]
    UnexpectedEndMarker { position: u64, expected: u64 },
    /// The byte source or sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DecompressError {
    /// Whether this error means the compressed data itself is bad (as opposed
    /// to I/O or misuse).
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::CorruptStream { .. } | Self::UnexpectedEndMarker { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DecompressError>;
