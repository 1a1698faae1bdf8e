//! BitReader: A module for the Rust version of the standard BZIP2 library.
//!
//! Reads a packed bitstream for the block-oriented deconstruction of BZIP2 compressed data.
//!
//! NOTE: This reader borrows an in-memory buffer. It never blocks and never refills; when the
//! buffer runs dry it reports TruncatedInput so the caller can supply more bytes and retry
//! from a saved position.
//!
use crate::error::{BzError, Result};

const BIT_MASK: u8 = 0xff;

/// Reads bits MSB-first from a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
    bit_index: usize,
    start: u64,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader positioned at the first bit of the buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            bit_index: 0,
            start: 0,
        }
    }

    /// Creates a BitReader that resumes at an arbitrary bit offset into the buffer.
    pub fn with_bit_offset(buffer: &'a [u8], offset: u64) -> Self {
        let mut br = Self::new(buffer);
        br.cursor = (offset / 8) as usize;
        br.bit_index = (offset % 8) as usize;
        br.start = offset;
        br
    }

    /// Number of unread bits left in the buffer.
    pub fn remaining_bits(&self) -> u64 {
        if self.cursor >= self.buffer.len() {
            return 0;
        }
        (self.buffer.len() - self.cursor) as u64 * 8 - self.bit_index as u64
    }

    /// Absolute bit position within the buffer.
    pub fn position(&self) -> u64 {
        self.cursor as u64 * 8 + self.bit_index as u64
    }

    /// Bits consumed since this reader was created.
    pub fn bits_consumed(&self) -> u64 {
        self.position() - self.start
    }

    fn ensure(&self, n: usize) -> Result<()> {
        let available = self.remaining_bits();
        if (n as u64) > available {
            return Err(BzError::TruncatedInput {
                needed: n,
                available,
            });
        }
        Ok(())
    }

    /// Return the next bit (1 or 0).
    pub fn bit(&mut self) -> Result<u32> {
        self.ensure(1)?;
        let bit = (self.buffer[self.cursor] & BIT_MASK >> self.bit_index) >> (7 - self.bit_index);
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.cursor += 1;
        }
        Ok(bit as u32)
    }

    /// Return *true* if the next bit is 1, *false* if 0, consuming the bit.
    pub fn bool_bit(&mut self) -> Result<bool> {
        self.bit().map(|bit| bit == 1)
    }

    /// Return the next n bits (0..=32) as an unsigned integer.
    pub fn bint(&mut self, mut n: usize) -> Result<u32> {
        /*
        Read as many bits as possible for each step. First drain what is left of a partial
        byte, then take full bytes, then finish with the top bits of one more byte.
        Nothing is consumed unless all n bits are present.
        */
        debug_assert!(n <= 32, "bint can return at most 32 bits");
        self.ensure(n)?;

        let mut result = 0_u64;

        if self.bit_index > 0 {
            let needed = n.min(8 - self.bit_index);
            result = ((self.buffer[self.cursor] & BIT_MASK >> self.bit_index)
                >> (8 - self.bit_index - needed)) as u64;
            self.bit_index += needed;
            if self.bit_index == 8 {
                self.bit_index = 0;
                self.cursor += 1;
            }
            n -= needed;
        }

        while n >= 8 {
            result = result << 8 | self.buffer[self.cursor] as u64;
            self.cursor += 1;
            n -= 8;
        }

        if n > 0 {
            result = result << n | (self.buffer[self.cursor] >> (8 - n)) as u64;
            self.bit_index = n;
        }
        Ok(result as u32)
    }

    /// Returns a byte. Convenience for bint(8).
    pub fn byte(&mut self) -> Result<u8> {
        self.bint(8).map(|byte| byte as u8)
    }

    /// Returns n bytes. All or nothing: on truncation no bits are consumed.
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure(n * 8)?;
        (0..n).map(|_| self.byte()).collect()
    }

    /// Skip forward to the next byte boundary (no-op when already aligned).
    pub fn align_to_byte(&mut self) {
        if self.bit_index > 0 {
            self.bit_index = 0;
            self.cursor += 1;
        }
    }

    /// Debugging function. Report current position in the buffer.
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.cursor, self.bit_index)
    }
}
