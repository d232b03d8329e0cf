//! Test-only stream builder.
//!
//! Emits hand-picked symbol sequences (literals, matches, reps, end marker)
//! so tests can reach decoder paths a real encoder rarely produces, such as
//! a back-reference before any output.

use super::{State, BIT_MODEL_TOTAL, INITIAL_PROB, NUM_BIT_MODEL_TOTAL_BITS, NUM_MOVE_BITS};
use std::collections::HashMap;
use std::io::Write;
use xz2::stream::{LzmaOptions, Stream};
use xz2::write::XzEncoder;

const TOP_VALUE: u32 = 1 << 24;

/// Range encoder that renormalizes after every bit.
pub struct RangeEncoder {
    low: u64,
    range: u32,
    cache: u8,
    cache_size: u64,
    output: Vec<u8>,
}

impl RangeEncoder {
    pub fn new() -> Self {
        Self {
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            cache_size: 1,
            output: Vec::new(),
        }
    }

    fn shift_low(&mut self) {
        if self.low < 0xFF00_0000 || self.low > 0xFFFF_FFFF {
            let carry = (self.low >> 32) as u8;
            let mut temp = self.cache;
            loop {
                self.output.push(temp.wrapping_add(carry));
                temp = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = ((self.low >> 24) & 0xFF) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low & 0x00FF_FFFF) << 8;
    }

    fn normalize(&mut self) {
        while self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift_low();
        }
    }

    pub fn encode_bit(&mut self, prob: &mut u16, bit: u32) {
        let p = u32::from(*prob);
        let bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * p;
        if bit == 0 {
            self.range = bound;
            *prob = (p + ((BIT_MODEL_TOTAL - p) >> NUM_MOVE_BITS)) as u16;
        } else {
            self.low += u64::from(bound);
            self.range -= bound;
            *prob = (p - (p >> NUM_MOVE_BITS)) as u16;
        }
        self.normalize();
    }

    pub fn encode_direct_bits(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            self.range >>= 1;
            if (value >> i) & 1 == 1 {
                self.low += u64::from(self.range);
            }
            self.normalize();
        }
    }

    pub fn encode_tree(&mut self, probs: &mut [u16], depth: u32, symbol: u32) {
        let mut m = 1usize;
        for i in (0..depth).rev() {
            let bit = (symbol >> i) & 1;
            self.encode_bit(&mut probs[m], bit);
            m = (m << 1) + bit as usize;
        }
    }

    pub fn encode_reverse_tree(&mut self, probs: &mut [u16], depth: u32, symbol: u32) {
        let mut m = 1usize;
        for i in 0..depth {
            let bit = (symbol >> i) & 1;
            self.encode_bit(&mut probs[m], bit);
            m = (m << 1) + bit as usize;
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..5 {
            self.shift_low();
        }
        self.output
    }
}

type ModelKey = (&'static str, usize, usize);

/// Symbol-level builder mirroring the decoder's contexts.
pub struct StreamBuilder {
    rc: RangeEncoder,
    models: HashMap<ModelKey, u16>,
    lc: u32,
    lp: u32,
    pb: u32,
    state: State,
    reps: [u32; 4],
    history: Vec<u8>,
}

impl StreamBuilder {
    pub fn new(lc: u32, lp: u32, pb: u32) -> Self {
        Self {
            rc: RangeEncoder::new(),
            models: HashMap::new(),
            lc,
            lp,
            pb,
            state: State::default(),
            reps: [0; 4],
            history: Vec::new(),
        }
    }

    /// Bytes the symbols so far expand to.
    pub fn expected(&self) -> &[u8] {
        &self.history
    }

    fn bit(&mut self, group: &'static str, sub: usize, index: usize, bit: u32) {
        let prob = self.models.entry((group, sub, index)).or_insert(INITIAL_PROB);
        self.rc.encode_bit(prob, bit);
    }

    fn tree(&mut self, group: &'static str, sub: usize, depth: u32, symbol: u32) {
        let mut m = 1usize;
        for i in (0..depth).rev() {
            let bit = (symbol >> i) & 1;
            self.bit(group, sub, m, bit);
            m = (m << 1) + bit as usize;
        }
    }

    fn reverse_tree(&mut self, group: &'static str, offset: usize, depth: u32, symbol: u32) {
        let mut m = 1usize;
        for i in 0..depth {
            let bit = (symbol >> i) & 1;
            self.bit(group, 0, offset + m, bit);
            m = (m << 1) + bit as usize;
        }
    }

    fn pos_state(&self) -> usize {
        self.history.len() & ((1 << self.pb) - 1)
    }

    fn state_index(&self) -> usize {
        self.state.index()
    }

    fn length(&mut self, sub: usize, len: u32) {
        let pos_state = self.pos_state();
        let l = len - 2;
        if l < 8 {
            self.bit("len_choice", sub, 0, 0);
            self.tree("len_low", sub * 16 + pos_state, 3, l);
        } else if l < 16 {
            self.bit("len_choice", sub, 0, 1);
            self.bit("len_choice", sub, 1, 0);
            self.tree("len_mid", sub * 16 + pos_state, 3, l - 8);
        } else {
            self.bit("len_choice", sub, 0, 1);
            self.bit("len_choice", sub, 1, 1);
            self.tree("len_high", sub, 8, l - 16);
        }
    }

    fn copy(&mut self, distance: u32, len: u32) {
        // Invalid distances are allowed here so tests can craft corrupt streams.
        if distance as usize >= self.history.len() {
            return;
        }
        for _ in 0..len {
            let byte = self.history[self.history.len() - distance as usize - 1];
            self.history.push(byte);
        }
    }

    pub fn literal(&mut self, byte: u8) {
        let pos_state = self.pos_state();
        let state = self.state_index();
        self.bit("is_match", state, pos_state, 0);

        let pos = self.history.len();
        let prev = self.history.last().copied().unwrap_or(0);
        let sub = ((pos & ((1 << self.lp) - 1)) << self.lc) + (usize::from(prev) >> (8 - self.lc));
        let mut symbol = 1usize;
        if self.state.is_char_state() {
            for i in (0..8).rev() {
                let bit = u32::from((byte >> i) & 1);
                self.bit("literal", sub, symbol, bit);
                symbol = (symbol << 1) | bit as usize;
            }
        } else {
            let mut match_byte = self.history[pos - self.reps[0] as usize - 1];
            let mut diverged = false;
            for i in (0..8).rev() {
                let bit = u32::from((byte >> i) & 1);
                if diverged {
                    self.bit("literal", sub, symbol, bit);
                } else {
                    let match_bit = usize::from((match_byte >> 7) & 1);
                    match_byte <<= 1;
                    self.bit("literal", sub, ((1 + match_bit) << 8) + symbol, bit);
                    diverged = match_bit != bit as usize;
                }
                symbol = (symbol << 1) | bit as usize;
            }
        }
        self.history.push(byte);
        self.state = self.state.after_literal();
    }

    /// New match; `distance` is zero-based (0 copies the previous byte).
    pub fn new_match(&mut self, distance: u32, len: u32) {
        let pos_state = self.pos_state();
        let state = self.state_index();
        self.bit("is_match", state, pos_state, 1);
        self.bit("is_rep", state, 0, 0);
        self.length(0, len);

        let len_state = (len as usize - 2).min(3);
        let slot = position_slot(distance);
        self.tree("pos_slot", len_state, 6, slot);
        if slot >= 4 {
            let direct_bits = (slot >> 1) - 1;
            let base = (2 | (slot & 1)) << direct_bits;
            let reduced = distance - base;
            if slot < 14 {
                let offset = (base - slot) as usize;
                self.reverse_tree("pos", offset, direct_bits, reduced);
            } else {
                self.rc.encode_direct_bits(reduced >> 4, direct_bits - 4);
                self.reverse_tree("align", 0, 4, reduced & 0xF);
            }
        }

        self.reps = [distance, self.reps[0], self.reps[1], self.reps[2]];
        self.state = self.state.after_match();
        if distance != u32::MAX {
            self.copy(distance, len);
        }
    }

    /// One byte from `rep0`.
    pub fn short_rep(&mut self) {
        let pos_state = self.pos_state();
        let state = self.state_index();
        self.bit("is_match", state, pos_state, 1);
        self.bit("is_rep", state, 0, 1);
        self.bit("is_rep_g0", state, 0, 0);
        self.bit("is_rep0_long", state, pos_state, 0);
        self.state = self.state.after_short_rep();
        self.copy(self.reps[0], 1);
    }

    /// Match reusing `reps[index]`.
    pub fn rep_match(&mut self, index: usize, len: u32) {
        let pos_state = self.pos_state();
        let state = self.state_index();
        self.bit("is_match", state, pos_state, 1);
        self.bit("is_rep", state, 0, 1);
        if index == 0 {
            self.bit("is_rep_g0", state, 0, 0);
            self.bit("is_rep0_long", state, pos_state, 1);
        } else {
            self.bit("is_rep_g0", state, 0, 1);
            if index == 1 {
                self.bit("is_rep_g1", state, 0, 0);
            } else {
                self.bit("is_rep_g1", state, 0, 1);
                self.bit("is_rep_g2", state, 0, u32::from(index == 3));
            }
            let distance = self.reps[index];
            for i in (1..=index).rev() {
                self.reps[i] = self.reps[i - 1];
            }
            self.reps[0] = distance;
        }
        self.length(1, len);
        self.state = self.state.after_rep();
        self.copy(self.reps[0], len);
    }

    pub fn end_marker(&mut self) {
        self.new_match(u32::MAX, 2);
    }

    pub fn finish(self) -> Vec<u8> {
        self.rc.finish()
    }
}

/// Compress with liblzma into the 13-byte-header container, end marker
/// included and size field left as unknown.
pub fn reference_alone(data: &[u8], lc: u32, lp: u32, pb: u32, dict_size: u32) -> Vec<u8> {
    let mut opts = LzmaOptions::new_preset(6).expect("preset");
    opts.dict_size(dict_size)
        .literal_context_bits(lc)
        .literal_position_bits(lp)
        .position_bits(pb);
    let stream = Stream::new_lzma_encoder(&opts).expect("lzma encoder");
    let mut encoder = XzEncoder::new_stream(Vec::new(), stream);
    encoder.write_all(data).expect("encode");
    encoder.finish().expect("finish")
}

fn position_slot(distance: u32) -> u32 {
    if distance < 4 {
        return distance;
    }
    let top = 31 - distance.leading_zeros();
    (top << 1) | ((distance >> (top - 1)) & 1)
}

#[test]
fn test_position_slot() {
    assert_eq!(position_slot(3), 3);
    assert_eq!(position_slot(4), 4);
    assert_eq!(position_slot(6), 5);
    assert_eq!(position_slot(127), 13);
    assert_eq!(position_slot(128), 14);
    assert_eq!(position_slot(u32::MAX), 63);
}
