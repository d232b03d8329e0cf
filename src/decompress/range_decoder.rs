//! Adaptive binary range decoder.
//!
//! Reads the compressed stream MSB-first through a 32-bit `range`/`code`
//! register pair, one byte at a time as the range narrows below `2^24`.

use super::{DecompressError, Result, BIT_MODEL_TOTAL, NUM_BIT_MODEL_TOTAL_BITS, NUM_MOVE_BITS};
use std::io::{ErrorKind, Read};

/// Normalization threshold.
const TOP_VALUE: u32 = 1 << 24;

/// Size of the internal input block.
const BUFFER_SIZE: usize = 1 << 14;

/// Range decoder state over a byte source.
pub struct RangeDecoder<R> {
    inner: R,
    buffer: Box<[u8]>,
    pos: usize,
    filled: usize,
    range: u32,
    code: u32,
    /// A renormalization shift could not be completed because the input ran
    /// out. Only an error if another bit is requested.
    owed: bool,
}

impl<R: Read> RangeDecoder<R> {
    /// Create a decoder and consume the 5-byte coder preamble.
    ///
    /// The first byte is padding from the encoder's carry cache and is
    /// discarded; the next four seed `code`.
    pub fn new(inner: R) -> Result<Self> {
        let mut decoder = Self {
            inner,
            buffer: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            range: 0xFFFF_FFFF,
            code: 0,
            owed: false,
        };
        decoder.init()?;
        Ok(decoder)
    }

    fn init(&mut self) -> Result<()> {
        self.range = 0xFFFF_FFFF;
        self.code = 0;
        self.owed = false;
        self.require_byte()?;
        for _ in 0..4 {
            self.code = (self.code << 8) | u32::from(self.require_byte()?);
        }
        Ok(())
    }

    /// Refill the input block. Returns `false` at end of input.
    fn fill(&mut self) -> Result<bool> {
        loop {
            match self.inner.read(&mut self.buffer) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.pos == self.filled && !self.fill()? {
            return Ok(None);
        }
        let byte = self.buffer[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    #[inline]
    fn require_byte(&mut self) -> Result<u8> {
        self.next_byte()?.ok_or(DecompressError::StreamTruncated)
    }

    #[inline]
    fn normalize(&mut self) -> Result<()> {
        while self.range < TOP_VALUE {
            match self.next_byte()? {
                Some(byte) => {
                    self.code = (self.code << 8) | u32::from(byte);
                    self.range <<= 8;
                }
                None => {
                    self.owed = true;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Fail if the previous bit left a shift unpaid and the input is gone.
    #[inline]
    fn settle(&self) -> Result<()> {
        if self.owed {
            return Err(DecompressError::StreamTruncated);
        }
        Ok(())
    }

    /// Decode `count` bits with fixed one-half probability, MSB-first.
    pub fn decode_direct_bits(&mut self, count: u32) -> Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            self.settle()?;
            self.range >>= 1;
            let bit = if self.code >= self.range {
                self.code -= self.range;
                1
            } else {
                0
            };
            result = (result << 1) | bit;
            self.normalize()?;
        }
        Ok(result)
    }

    /// Decode one bit with the adaptive model at `probs[index]` and update it.
    #[inline]
    pub fn decode_bit(&mut self, probs: &mut [u16], index: usize) -> Result<u32> {
        self.settle()?;
        let prob = u32::from(probs[index]);
        let bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * prob;
        let bit = if self.code < bound {
            self.range = bound;
            probs[index] = (prob + ((BIT_MODEL_TOTAL - prob) >> NUM_MOVE_BITS)) as u16;
            0
        } else {
            self.range -= bound;
            self.code -= bound;
            probs[index] = (prob - (prob >> NUM_MOVE_BITS)) as u16;
            1
        };
        self.normalize()?;
        Ok(bit)
    }

    /// Current `range` register.
    pub fn range(&self) -> u32 {
        self.range
    }

    /// Current `code` register.
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Whether the input ran out during the last renormalization.
    pub fn is_starved(&self) -> bool {
        self.owed
    }

    /// Give back the byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress::INITIAL_PROB;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_init_skips_first_byte() {
        let data = [0x00, 0x12, 0x34, 0x56, 0x78, 0x9A];
        let decoder = RangeDecoder::new(&data[..]).unwrap();
        assert_eq!(decoder.code(), 0x12345678);
        assert_eq!(decoder.range(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_init_truncated() {
        let data = [0x00, 0x12, 0x34];
        assert!(matches!(
            RangeDecoder::new(&data[..]),
            Err(DecompressError::StreamTruncated)
        ));
    }

    #[test]
    fn test_probability_adapts() {
        // code = 0 always decodes zeros
        let data = [0u8; 16];
        let mut decoder = RangeDecoder::new(&data[..]).unwrap();
        let mut probs = [INITIAL_PROB; 1];

        assert_eq!(decoder.decode_bit(&mut probs, 0).unwrap(), 0);
        assert_eq!(probs[0], INITIAL_PROB + ((2048 - 1024) >> 5));

        // code = 0xFFFFFFFF always decodes ones
        let data = [0xFFu8; 16];
        let mut decoder = RangeDecoder::new(&data[..]).unwrap();
        let mut probs = [INITIAL_PROB; 1];
        assert_eq!(decoder.decode_bit(&mut probs, 0).unwrap(), 1);
        assert_eq!(probs[0], INITIAL_PROB - (INITIAL_PROB >> 5));
    }

    #[test]
    fn test_direct_bits() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut decoder = RangeDecoder::new(&data[..]).unwrap();
        assert_eq!(decoder.decode_direct_bits(8).unwrap(), 0);

        let data = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut decoder = RangeDecoder::new(&data[..]).unwrap();
        assert_eq!(decoder.decode_direct_bits(4).unwrap(), 0b1111);
    }

    #[test]
    fn test_range_stays_normalized() {
        let mut rng = StdRng::seed_from_u64(0x1a2b_3c4d);
        let mut data = vec![0u8; 64 * 1024];
        rng.fill(&mut data[..]);
        data[0] = 0;

        let mut decoder = RangeDecoder::new(&data[..]).unwrap();
        let mut probs = [INITIAL_PROB; 64];
        for i in 0..20_000 {
            if i % 7 == 0 {
                decoder.decode_direct_bits(rng.gen_range(1..=26)).unwrap();
            } else {
                decoder.decode_bit(&mut probs, rng.gen_range(0..64)).unwrap();
            }
            assert!(decoder.range() >= TOP_VALUE, "range underflow at step {}", i);
            assert!(probs.iter().all(|&p| (p as u32) < BIT_MODEL_TOTAL && p > 0));
        }
    }

    #[test]
    fn test_owed_byte_only_fails_on_next_bit() {
        // Direct bits halve the range; after 8 of them a shift is due.
        let data = [0x00, 0x00, 0x00, 0x00, 0x00];
        let mut decoder = RangeDecoder::new(&data[..]).unwrap();
        assert_eq!(decoder.decode_direct_bits(8).unwrap(), 0);
        assert!(decoder.is_starved());
        assert!(matches!(
            decoder.decode_direct_bits(1),
            Err(DecompressError::StreamTruncated)
        ));
    }
}
