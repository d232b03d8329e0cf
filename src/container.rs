//! The 13-byte "alone" container.
//!
//! ```text
//! ┌────────────────────┬───────────────────────────┬─────────────┐
//! │ properties (5)     │ uncompressed size (8, LE) │ LZMA stream │
//! └────────────────────┴───────────────────────────┴─────────────┘
//! ```
//!
//! A size of `u64::MAX` means the length is not recorded and the stream ends
//! with an end marker.

use crate::decompress::{DecoderOptions, LzmaDecoder, LzmaProperties, PROPERTIES_SIZE};
use crate::error::{LzmaError, Result};
use std::io::{self, Read, Write};
use std::sync::OnceLock;

/// Parsed container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AloneHeader {
    pub properties: LzmaProperties,
    /// `None` when the header stores `u64::MAX`.
    pub uncompressed_size: Option<u64>,
}

impl AloneHeader {
    pub const HEADER_SIZE: usize = PROPERTIES_SIZE + 8;

    /// Sentinel for an unrecorded size.
    pub const UNKNOWN_SIZE: u64 = u64::MAX;

    /// Parse a header from the start of `buffer`.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < Self::HEADER_SIZE {
            return Err(LzmaError::HeaderTooShort {
                needed: Self::HEADER_SIZE,
                have: buffer.len(),
            });
        }

        let properties = LzmaProperties::from_bytes(&buffer[..PROPERTIES_SIZE])?;
        let mut size = [0u8; 8];
        size.copy_from_slice(&buffer[PROPERTIES_SIZE..Self::HEADER_SIZE]);
        let size = u64::from_le_bytes(size);

        let uncompressed_size = match size {
            Self::UNKNOWN_SIZE => None,
            s if s > i64::MAX as u64 => return Err(LzmaError::InvalidUncompressedSize(s)),
            s => Some(s),
        };

        Ok(Self {
            properties,
            uncompressed_size,
        })
    }

    /// Read exactly one header from `reader`, leaving it at the first
    /// stream byte.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buffer = [0u8; Self::HEADER_SIZE];
        let mut have = 0;
        while have < buffer.len() {
            match reader.read(&mut buffer[have..]) {
                Ok(0) => {
                    return Err(LzmaError::HeaderTooShort {
                        needed: Self::HEADER_SIZE,
                        have,
                    })
                }
                Ok(n) => have += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Self::parse(&buffer)
    }

    pub fn to_bytes(&self) -> [u8; Self::HEADER_SIZE] {
        let mut out = [0u8; Self::HEADER_SIZE];
        out[..PROPERTIES_SIZE].copy_from_slice(&self.properties.to_bytes());
        let size = self.uncompressed_size.unwrap_or(Self::UNKNOWN_SIZE);
        out[PROPERTIES_SIZE..].copy_from_slice(&size.to_le_bytes());
        out
    }

    /// Length argument for [`LzmaDecoder::decode`]: `-1` when unknown.
    pub fn expected_length(&self) -> i64 {
        // parse() rejects anything above i64::MAX
        self.uncompressed_size.map_or(-1, |s| s as i64)
    }
}

/// Decode a complete container from `input` into `output`.
///
/// Returns the number of bytes written.
pub fn decompress_alone<R: Read, W: Write>(input: R, output: &mut W) -> Result<u64> {
    decompress_alone_with_options(input, output, DecoderOptions::default())
}

/// [`decompress_alone`] with explicit decoder options.
pub fn decompress_alone_with_options<R: Read, W: Write>(
    mut input: R,
    output: &mut W,
    options: DecoderOptions,
) -> Result<u64> {
    let header = AloneHeader::read_from(&mut input)?;
    let mut decoder = LzmaDecoder::with_options(options);
    decoder.configure(header.properties)?;
    Ok(decoder.decode(input, output, header.expected_length())?)
}

/// Decode an in-memory container.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    let header = AloneHeader::parse(data)?;
    let capacity = header
        .uncompressed_size
        .and_then(|s| usize::try_from(s).ok())
        .unwrap_or(data.len() * 4)
        .min(1 << 28);
    let mut out = Vec::with_capacity(capacity);
    decompress_alone(data, &mut out)?;
    Ok(out)
}

/// Compressed bytes baked into the binary, decoded on first use.
///
/// ```rust,ignore
/// static MODEL: EmbeddedPayload = EmbeddedPayload::new(include_bytes!("model.lzma"));
///
/// let bytes = MODEL.get()?;
/// ```
pub struct EmbeddedPayload {
    compressed: &'static [u8],
    decoded: OnceLock<Vec<u8>>,
}

impl EmbeddedPayload {
    pub const fn new(compressed: &'static [u8]) -> Self {
        Self {
            compressed,
            decoded: OnceLock::new(),
        }
    }

    /// The decoded payload. A failed decode is not cached and is retried on
    /// the next call. Concurrent first calls may each decode, but all of them
    /// observe the same stored bytes.
    pub fn get(&self) -> Result<&[u8]> {
        if let Some(decoded) = self.decoded.get() {
            return Ok(decoded);
        }
        let decoded = decompress_to_vec(self.compressed)?;
        tracing::debug!(
            compressed = self.compressed.len(),
            decoded = decoded.len(),
            "embedded payload decoded"
        );
        Ok(self.decoded.get_or_init(|| decoded))
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }

    pub fn compressed(&self) -> &'static [u8] {
        self.compressed
    }
}

impl std::fmt::Debug for EmbeddedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedPayload")
            .field("compressed_len", &self.compressed.len())
            .field("decoded", &self.is_decoded())
            .finish()
    }
}
