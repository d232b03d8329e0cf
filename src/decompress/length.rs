//! Match and rep length decoder.

use super::{BitTreeDecoder, RangeDecoder, Result, INITIAL_PROB, NUM_POS_STATES_MAX};
use std::io::Read;

const LEN_LOW_SYMBOLS: u32 = 8;
const LEN_MID_SYMBOLS: u32 = 8;

/// Length decoder: a two-step choice between a low tree (0-7), a mid tree
/// (8-15), both per position state, and a shared high tree (16-271).
#[derive(Clone)]
pub struct LengthDecoder {
    choice: [u16; 2],
    low: [BitTreeDecoder<8>; NUM_POS_STATES_MAX],
    mid: [BitTreeDecoder<8>; NUM_POS_STATES_MAX],
    high: BitTreeDecoder<256>,
}

impl LengthDecoder {
    pub fn new() -> Self {
        Self {
            choice: [INITIAL_PROB; 2],
            low: std::array::from_fn(|_| BitTreeDecoder::new()),
            mid: std::array::from_fn(|_| BitTreeDecoder::new()),
            high: BitTreeDecoder::new(),
        }
    }

    pub fn reset(&mut self) {
        self.choice = [INITIAL_PROB; 2];
        for tree in &mut self.low {
            tree.reset();
        }
        for tree in &mut self.mid {
            tree.reset();
        }
        self.high.reset();
    }

    /// Decode a length symbol in `0..=271`. Add [`MATCH_MIN_LEN`] for the
    /// byte count.
    ///
    /// [`MATCH_MIN_LEN`]: super::MATCH_MIN_LEN
    #[inline]
    pub fn decode<R: Read>(&mut self, rc: &mut RangeDecoder<R>, pos_state: usize) -> Result<u32> {
        if rc.decode_bit(&mut self.choice, 0)? == 0 {
            return self.low[pos_state].decode(rc);
        }
        if rc.decode_bit(&mut self.choice, 1)? == 0 {
            return Ok(LEN_LOW_SYMBOLS + self.mid[pos_state].decode(rc)?);
        }
        Ok(LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS + self.high.decode(rc)?)
    }
}

impl Default for LengthDecoder {
    fn default() -> Self {
        Self::new()
    }
}
