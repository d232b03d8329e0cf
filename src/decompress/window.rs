//! Sliding output window.
//!
//! Holds the last `window_size` bytes of output for back-references and
//! writes completed regions to the sink whenever the cursor wraps.

use super::Result;
use std::io::Write;

/// Circular dictionary buffer in front of a byte sink.
pub struct OutputWindow {
    /// Dictionary buffer
    buffer: Vec<u8>,
    /// Current write position
    pos: usize,
    /// Everything before this position has been written to the sink
    stream_pos: usize,
    /// Whether the buffer has wrapped at least once
    is_full: bool,
}

impl OutputWindow {
    /// Create a window of `window_size` bytes.
    pub fn new(window_size: usize) -> Self {
        debug_assert!(window_size > 0);
        Self {
            buffer: vec![0; window_size],
            pos: 0,
            stream_pos: 0,
            is_full: false,
        }
    }

    /// Reset for a new stream. Window contents are not cleared; the decoder
    /// validates every distance against the bytes produced so far.
    #[inline]
    pub fn reset(&mut self) {
        self.pos = 0;
        self.stream_pos = 0;
        self.is_full = false;
    }

    /// Window capacity.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Current write position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether any byte has been overwritten since the last reset.
    pub fn has_wrapped(&self) -> bool {
        self.is_full
    }

    /// Append one byte.
    #[inline]
    pub fn put_byte<W: Write>(&mut self, byte: u8, sink: &mut W) -> Result<()> {
        self.buffer[self.pos] = byte;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.flush(sink)?;
        }
        Ok(())
    }

    /// Copy `len` bytes starting `distance + 1` bytes back. The source may
    /// overlap the bytes being written, which repeats the last
    /// `distance + 1` bytes.
    #[inline]
    pub fn copy_block<W: Write>(&mut self, distance: u32, len: u32, sink: &mut W) -> Result<()> {
        let size = self.buffer.len();
        let dist = distance as usize + 1;
        let mut src = if dist <= self.pos {
            self.pos - dist
        } else {
            self.pos + size - dist
        };
        let mut remaining = len as usize;

        // Non-overlapping, non-wrapping run
        if dist >= remaining && src + remaining <= size && self.pos + remaining <= size {
            self.buffer.copy_within(src..src + remaining, self.pos);
            self.pos += remaining;
            if self.pos == size {
                self.flush(sink)?;
            }
            return Ok(());
        }

        while remaining > 0 {
            if src == size {
                src = 0;
            }
            self.buffer[self.pos] = self.buffer[src];
            self.pos += 1;
            src += 1;
            remaining -= 1;
            if self.pos == size {
                self.flush(sink)?;
            }
        }
        Ok(())
    }

    /// Byte `distance + 1` positions back (`0` is the last byte written).
    #[inline]
    pub fn get_byte(&self, distance: u32) -> u8 {
        let dist = distance as usize + 1;
        let idx = if dist <= self.pos {
            self.pos - dist
        } else {
            self.pos + self.buffer.len() - dist
        };
        self.buffer[idx]
    }

    /// Write the unflushed region to `sink`, wrapping the cursor if the
    /// buffer end was reached.
    pub fn flush<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        if self.pos > self.stream_pos {
            sink.write_all(&self.buffer[self.stream_pos..self.pos])?;
        }
        if self.pos >= self.buffer.len() {
            self.pos = 0;
            self.is_full = true;
        }
        self.stream_pos = self.pos;
        Ok(())
    }
}
