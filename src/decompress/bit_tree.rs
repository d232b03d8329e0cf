//! Bit-tree decoders.
//!
//! A tree of `N = 2^depth` probability models (index 0 unused) decodes a
//! `depth`-bit integer one bit per level.

use super::{RangeDecoder, Result, INITIAL_PROB};
use std::io::Read;

/// Tree decoder with `N` models, decoding `log2(N)`-bit symbols.
#[derive(Clone)]
pub struct BitTreeDecoder<const N: usize> {
    probs: [u16; N],
}

impl<const N: usize> BitTreeDecoder<N> {
    const DEPTH: u32 = N.trailing_zeros();

    pub fn new() -> Self {
        debug_assert!(N.is_power_of_two());
        Self {
            probs: [INITIAL_PROB; N],
        }
    }

    pub fn reset(&mut self) {
        self.probs.fill(INITIAL_PROB);
    }

    /// Number of bits per symbol.
    pub fn depth(&self) -> u32 {
        Self::DEPTH
    }

    /// Decode MSB-first.
    #[inline]
    pub fn decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>) -> Result<u32> {
        let mut m = 1usize;
        for _ in 0..Self::DEPTH {
            m = (m << 1) + rc.decode_bit(&mut self.probs, m)? as usize;
        }
        Ok((m - N) as u32)
    }

    /// Decode LSB-first.
    #[inline]
    pub fn reverse_decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>) -> Result<u32> {
        reverse_decode(&mut self.probs, 0, Self::DEPTH, rc)
    }
}

impl<const N: usize> Default for BitTreeDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse tree decode over `probs[offset + 1..]`.
///
/// The distance decoder keeps one flat model array for all small position
/// slots and addresses each slot's tree by offset.
#[inline]
pub fn reverse_decode<R: Read>(
    probs: &mut [u16],
    offset: usize,
    depth: u32,
    rc: &mut RangeDecoder<R>,
) -> Result<u32> {
    let mut m = 1usize;
    let mut symbol = 0u32;
    for bit_index in 0..depth {
        let bit = rc.decode_bit(probs, offset + m)?;
        m = (m << 1) + bit as usize;
        symbol |= bit << bit_index;
    }
    Ok(symbol)
}
