//! Stream properties header.
//!
//! Format (5 bytes):
//! - Byte 0: `(pb * 5 + lp) * 9 + lc`
//! - Bytes 1-4: dictionary size, little-endian

use super::{
    FormatError, MIN_WINDOW_SIZE, NUM_LIT_CONTEXT_BITS_MAX, NUM_LIT_POS_BITS_MAX,
    NUM_POS_STATES_BITS_MAX,
};

/// Size of the properties header.
pub const PROPERTIES_SIZE: usize = 5;

/// Decoded stream properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LzmaProperties {
    /// Literal context bits (high bits of the previous byte).
    pub lc: u32,
    /// Literal position bits.
    pub lp: u32,
    /// Position-state bits.
    pub pb: u32,
    /// Dictionary size as stored in the header.
    pub dictionary_size: u32,
}

impl LzmaProperties {
    /// Validate and build properties.
    pub fn new(lc: u32, lp: u32, pb: u32, dictionary_size: u32) -> Result<Self, FormatError> {
        if lc > NUM_LIT_CONTEXT_BITS_MAX || lp > NUM_LIT_POS_BITS_MAX || pb > NUM_POS_STATES_BITS_MAX
        {
            return Err(FormatError::InvalidLcLpPb { lc, lp, pb });
        }
        Ok(Self {
            lc,
            lp,
            pb,
            dictionary_size,
        })
    }

    /// Split the packed properties byte into `(lc, lp, pb)`.
    pub fn decode_lc_lp_pb(value: u8) -> Result<(u32, u32, u32), FormatError> {
        let value = u32::from(value);
        let lc = value % 9;
        let remainder = value / 9;
        let lp = remainder % 5;
        let pb = remainder / 5;
        if pb > NUM_POS_STATES_BITS_MAX {
            return Err(FormatError::InvalidLcLpPb { lc, lp, pb });
        }
        Ok((lc, lp, pb))
    }

    /// Pack `(lc, lp, pb)` into the properties byte.
    pub fn encode_lc_lp_pb(&self) -> u8 {
        ((self.pb * 5 + self.lp) * 9 + self.lc) as u8
    }

    /// Parse the 5-byte header. Extra bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < PROPERTIES_SIZE {
            return Err(FormatError::PropertiesTooShort(bytes.len()));
        }
        let (lc, lp, pb) = Self::decode_lc_lp_pb(bytes[0])?;
        let dictionary_size = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        Self::new(lc, lp, pb, dictionary_size)
    }

    /// Serialize to the 5-byte header.
    pub fn to_bytes(&self) -> [u8; PROPERTIES_SIZE] {
        let dict = self.dictionary_size.to_le_bytes();
        [self.encode_lc_lp_pb(), dict[0], dict[1], dict[2], dict[3]]
    }

    /// Largest distance a back-reference may use, plus one.
    pub fn dictionary_size_check(&self) -> u32 {
        self.dictionary_size.max(1)
    }

    /// Bytes the output window allocates.
    pub fn window_size(&self) -> usize {
        (self.dictionary_size_check() as usize).max(MIN_WINDOW_SIZE)
    }

    pub fn pos_state_mask(&self) -> usize {
        (1 << self.pb) - 1
    }

    pub fn literal_pos_mask(&self) -> usize {
        (1 << self.lp) - 1
    }
}

impl Default for LzmaProperties {
    /// `lc=3, lp=0, pb=2` with an 8 MiB dictionary.
    fn default() -> Self {
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
            dictionary_size: 1 << 23,
        }
    }
}
