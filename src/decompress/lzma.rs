//! LZMA stream decoder.
//!
//! Runs the symbol loop: each step decodes either a literal or a
//! back-reference (new match, one of four repeated distances, or a
//! single-byte "short rep") and feeds it to the output window.

use super::{
    reverse_decode, BitTreeDecoder, DecompressError, FormatError, LengthDecoder, LiteralDecoder,
    LzmaProperties, OutputWindow, RangeDecoder, Result, State, END_MARKER_DISTANCE,
    END_POS_MODEL_INDEX, INITIAL_PROB, MATCH_MIN_LEN, NUM_ALIGN_BITS, NUM_FULL_DISTANCES,
    NUM_LEN_TO_POS_STATES, NUM_POS_STATES_BITS_MAX, START_POS_MODEL_INDEX,
};
use super::state::NUM_STATES;
use std::io::{Read, Write};

/// Context slots per state for the per-position-state models.
const NUM_STATE_CONTEXTS: usize = NUM_STATES << NUM_POS_STATES_BITS_MAX;

/// Models for position slots 4..14. Index 0 is never addressed: slot trees
/// start at `base - slot`, which is 0 for slot 4.
const NUM_POS_MODELS: usize = 1 + NUM_FULL_DISTANCES - END_POS_MODEL_INDEX as usize;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderOptions {
    /// Reject streams whose dictionary is larger than this.
    pub max_dictionary_size: Option<u32>,
    /// Treat an end marker before the declared length as corruption.
    pub strict_end_marker: bool,
}

/// LZMA decoder.
///
/// Configure with [`set_properties`](Self::set_properties), then call
/// [`decode`](Self::decode) once per stream. All adaptive state is reset at
/// the start of every `decode`.
pub struct LzmaDecoder {
    options: DecoderOptions,
    properties: Option<LzmaProperties>,
    window: Option<OutputWindow>,

    is_match: [u16; NUM_STATE_CONTEXTS],
    is_rep: [u16; NUM_STATES],
    is_rep_g0: [u16; NUM_STATES],
    is_rep_g1: [u16; NUM_STATES],
    is_rep_g2: [u16; NUM_STATES],
    is_rep0_long: [u16; NUM_STATE_CONTEXTS],

    pos_slot: [BitTreeDecoder<64>; NUM_LEN_TO_POS_STATES],
    pos_models: [u16; NUM_POS_MODELS],
    align: BitTreeDecoder<16>,

    match_len: LengthDecoder,
    rep_len: LengthDecoder,
    literal: LiteralDecoder,
}

impl LzmaDecoder {
    /// Create an unconfigured decoder with default options.
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::default())
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self {
            options,
            properties: None,
            window: None,
            is_match: [INITIAL_PROB; NUM_STATE_CONTEXTS],
            is_rep: [INITIAL_PROB; NUM_STATES],
            is_rep_g0: [INITIAL_PROB; NUM_STATES],
            is_rep_g1: [INITIAL_PROB; NUM_STATES],
            is_rep_g2: [INITIAL_PROB; NUM_STATES],
            is_rep0_long: [INITIAL_PROB; NUM_STATE_CONTEXTS],
            pos_slot: std::array::from_fn(|_| BitTreeDecoder::new()),
            pos_models: [INITIAL_PROB; NUM_POS_MODELS],
            align: BitTreeDecoder::new(),
            match_len: LengthDecoder::new(),
            rep_len: LengthDecoder::new(),
            literal: LiteralDecoder::new(0, 0),
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Properties from the last successful [`set_properties`](Self::set_properties).
    pub fn properties(&self) -> Option<&LzmaProperties> {
        self.properties.as_ref()
    }

    /// Apply the 5-byte properties header.
    pub fn set_properties(&mut self, bytes: &[u8]) -> std::result::Result<(), FormatError> {
        let properties = LzmaProperties::from_bytes(bytes)?;
        self.configure(properties)
    }

    /// Apply already-parsed properties. The window and literal grid are
    /// reallocated only when their size changes.
    pub fn configure(&mut self, properties: LzmaProperties) -> std::result::Result<(), FormatError> {
        if let Some(limit) = self.options.max_dictionary_size {
            if properties.dictionary_size > limit {
                return Err(FormatError::DictionaryTooLarge {
                    size: properties.dictionary_size,
                    limit,
                });
            }
        }

        self.literal.reconfigure(properties.lc, properties.lp);
        let window_size = properties.window_size();
        if self.window.as_ref().map(OutputWindow::size) != Some(window_size) {
            self.window = Some(OutputWindow::new(window_size));
        }
        self.properties = Some(properties);

        tracing::debug!(
            lc = properties.lc,
            lp = properties.lp,
            pb = properties.pb,
            dictionary_size = properties.dictionary_size,
            "lzma properties set"
        );
        Ok(())
    }

    fn reset_models(&mut self) {
        self.is_match.fill(INITIAL_PROB);
        self.is_rep.fill(INITIAL_PROB);
        self.is_rep_g0.fill(INITIAL_PROB);
        self.is_rep_g1.fill(INITIAL_PROB);
        self.is_rep_g2.fill(INITIAL_PROB);
        self.is_rep0_long.fill(INITIAL_PROB);
        for tree in &mut self.pos_slot {
            tree.reset();
        }
        self.pos_models.fill(INITIAL_PROB);
        self.align.reset();
        self.match_len.reset();
        self.rep_len.reset();
        self.literal.reset();
    }

    /// Decode one stream from `input` into `output`.
    ///
    /// With `expected_length >= 0` decoding stops once that many bytes have
    /// been produced; a negative value decodes until the end marker. An end
    /// marker always stops decoding. Returns the number of bytes written.
    pub fn decode<R: Read, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
        expected_length: i64,
    ) -> Result<u64> {
        let properties = self.properties.ok_or(DecompressError::NotConfigured)?;
        let mut window = self.window.take().ok_or(DecompressError::NotConfigured)?;
        window.reset();
        self.reset_models();

        let limit = u64::try_from(expected_length).ok();
        let result = RangeDecoder::new(input).and_then(|mut rc| {
            self.decode_symbols(&mut rc, &mut window, output, &properties, limit)
        });
        self.window = Some(window);
        result
    }

    fn decode_symbols<R: Read, W: Write>(
        &mut self,
        rc: &mut RangeDecoder<R>,
        window: &mut OutputWindow,
        output: &mut W,
        properties: &LzmaProperties,
        limit: Option<u64>,
    ) -> Result<u64> {
        let pos_state_mask = properties.pos_state_mask();
        let dictionary_size_check = properties.dictionary_size_check();

        let mut state = State::default();
        let mut reps = [0u32; 4];
        let mut position = 0u64;
        let mut prev_byte = 0u8;
        let mut end_marker = false;

        while limit.map_or(true, |limit| position < limit) {
            let pos_state = (position as usize) & pos_state_mask;
            let ctx = (state.index() << NUM_POS_STATES_BITS_MAX) + pos_state;

            if rc.decode_bit(&mut self.is_match, ctx)? == 0 {
                prev_byte = if state.is_char_state() {
                    self.literal.decode_normal(rc, position, prev_byte)?
                } else {
                    let match_byte = window.get_byte(reps[0]);
                    self.literal
                        .decode_with_match_byte(rc, position, prev_byte, match_byte)?
                };
                window.put_byte(prev_byte, output)?;
                state = state.after_literal();
                position += 1;
                continue;
            }

            let len = if rc.decode_bit(&mut self.is_rep, state.index())? == 1 {
                if rc.decode_bit(&mut self.is_rep_g0, state.index())? == 0 {
                    if rc.decode_bit(&mut self.is_rep0_long, ctx)? == 0 {
                        state = state.after_short_rep();
                        1
                    } else {
                        state = state.after_rep();
                        MATCH_MIN_LEN + self.rep_len.decode(rc, pos_state)?
                    }
                } else {
                    let distance;
                    if rc.decode_bit(&mut self.is_rep_g1, state.index())? == 0 {
                        distance = reps[1];
                    } else {
                        if rc.decode_bit(&mut self.is_rep_g2, state.index())? == 0 {
                            distance = reps[2];
                        } else {
                            distance = reps[3];
                            reps[3] = reps[2];
                        }
                        reps[2] = reps[1];
                    }
                    reps[1] = reps[0];
                    reps[0] = distance;
                    state = state.after_rep();
                    MATCH_MIN_LEN + self.rep_len.decode(rc, pos_state)?
                }
            } else {
                reps[3] = reps[2];
                reps[2] = reps[1];
                reps[1] = reps[0];
                let len = MATCH_MIN_LEN + self.match_len.decode(rc, pos_state)?;
                state = state.after_match();
                let distance = self.decode_distance(rc, len)?;
                if distance == END_MARKER_DISTANCE {
                    end_marker = true;
                    break;
                }
                reps[0] = distance;
                len
            };

            let rep0 = reps[0];
            if u64::from(rep0) >= position || rep0 >= dictionary_size_check {
                tracing::warn!(
                    distance = rep0,
                    position,
                    dictionary_size = properties.dictionary_size,
                    "lzma back-reference out of range"
                );
                return Err(DecompressError::CorruptStream {
                    distance: rep0,
                    position,
                    dictionary_size: properties.dictionary_size,
                });
            }

            // Never write past a declared length.
            let len = match limit {
                Some(limit) => u64::from(len).min(limit - position) as u32,
                None => len,
            };
            window.copy_block(rep0, len, output)?;
            position += u64::from(len);
            prev_byte = window.get_byte(0);
        }

        if end_marker && self.options.strict_end_marker {
            if let Some(expected) = limit.filter(|&limit| limit != position) {
                return Err(DecompressError::UnexpectedEndMarker { position, expected });
            }
        }

        window.flush(output)?;
        tracing::debug!(bytes = position, end_marker, "lzma stream decoded");
        Ok(position)
    }

    /// Decode the distance of a new match of length `len`.
    fn decode_distance<R: Read>(&mut self, rc: &mut RangeDecoder<R>, len: u32) -> Result<u32> {
        let len_state = ((len - MATCH_MIN_LEN) as usize).min(NUM_LEN_TO_POS_STATES - 1);
        let slot = self.pos_slot[len_state].decode(rc)?;
        if slot < START_POS_MODEL_INDEX {
            return Ok(slot);
        }

        let direct_bits = (slot >> 1) - 1;
        let mut distance = (2 | (slot & 1)) << direct_bits;
        if slot < END_POS_MODEL_INDEX {
            let offset = (distance - slot) as usize;
            distance += reverse_decode(&mut self.pos_models, offset, direct_bits, rc)?;
        } else {
            distance += rc.decode_direct_bits(direct_bits - NUM_ALIGN_BITS)? << NUM_ALIGN_BITS;
            distance += self.align.reverse_decode(rc)?;
        }
        Ok(distance)
    }
}

impl Default for LzmaDecoder {
    fn default() -> Self {
        Self::new()
    }
}
