//! Literal decoder.
//!
//! Literals are coded with one of `2^(lc + lp)` sub-decoders chosen from the
//! low `lp` bits of the output position and the high `lc` bits of the
//! previous byte. Each sub-decoder holds `0x300` models: `0x100` for plain
//! decoding and two `0x100` banks used while the decoded bits still agree
//! with the byte at `rep0`.

use super::{RangeDecoder, Result, INITIAL_PROB};
use std::io::Read;

/// Models per sub-decoder.
const CODER_SIZE: usize = 0x300;

/// Literal decoder grid.
pub struct LiteralDecoder {
    probs: Vec<u16>,
    lc: u32,
    lp: u32,
    pos_mask: usize,
}

impl LiteralDecoder {
    pub fn new(lc: u32, lp: u32) -> Self {
        Self {
            probs: vec![INITIAL_PROB; CODER_SIZE << (lc + lp)],
            lc,
            lp,
            pos_mask: (1 << lp) - 1,
        }
    }

    /// Reallocate for new `lc`/`lp`, keeping the buffer when the shape matches.
    pub fn reconfigure(&mut self, lc: u32, lp: u32) {
        if self.lc == lc && self.lp == lp {
            return;
        }
        *self = Self::new(lc, lp);
    }

    pub fn reset(&mut self) {
        self.probs.fill(INITIAL_PROB);
    }

    /// Number of sub-decoders.
    pub fn num_coders(&self) -> usize {
        self.probs.len() / CODER_SIZE
    }

    #[inline]
    fn coder_offset(&self, position: u64, prev_byte: u8) -> usize {
        let pos_bits = (position as usize) & self.pos_mask;
        // lc = 0 must select no previous-byte bits; a u8 shift by 8 would overflow.
        let prev_bits = (usize::from(prev_byte)) >> (8 - self.lc);
        ((pos_bits << self.lc) + prev_bits) * CODER_SIZE
    }

    /// Decode a literal with no match context.
    #[inline]
    pub fn decode_normal<R: Read>(
        &mut self,
        rc: &mut RangeDecoder<R>,
        position: u64,
        prev_byte: u8,
    ) -> Result<u8> {
        let offset = self.coder_offset(position, prev_byte);
        let probs = &mut self.probs[offset..offset + CODER_SIZE];
        let mut symbol = 1usize;
        while symbol < 0x100 {
            symbol = (symbol << 1) | rc.decode_bit(probs, symbol)? as usize;
        }
        Ok(symbol as u8)
    }

    /// Decode a literal right after a match, using `match_byte` (the byte at
    /// `rep0`) as context until the first bit that disagrees with it.
    #[inline]
    pub fn decode_with_match_byte<R: Read>(
        &mut self,
        rc: &mut RangeDecoder<R>,
        position: u64,
        prev_byte: u8,
        match_byte: u8,
    ) -> Result<u8> {
        let offset = self.coder_offset(position, prev_byte);
        let probs = &mut self.probs[offset..offset + CODER_SIZE];
        let mut match_byte = match_byte;
        let mut symbol = 1usize;
        while symbol < 0x100 {
            let match_bit = usize::from((match_byte >> 7) & 1);
            match_byte <<= 1;
            let bit = rc.decode_bit(probs, ((1 + match_bit) << 8) + symbol)? as usize;
            symbol = (symbol << 1) | bit;
            if match_bit != bit {
                while symbol < 0x100 {
                    symbol = (symbol << 1) | rc.decode_bit(probs, symbol)? as usize;
                }
                break;
            }
        }
        Ok(symbol as u8)
    }
}
