use log::{error, trace};

use crate::bitstream::bitreader::BitReader;
use crate::error::{BzError, Result};

/// Longest code length the bzip2 format allows.
pub const MAX_CODE_LEN: u32 = 20;

/// One code length "level" of a canonical huffman table.
/// Codes in start_code..end_code (after reading `bits` more bits) map to
/// symbols[offset + code - start_code].
#[derive(Debug, Clone, Default)]
struct Level {
    bits: u32,
    offset: u32,
    start_code: u32,
    end_code: u32,
}

/// Decode table for one of the (2-6) huffman tables of a block.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    levels: Vec<Level>,
    symbols: Vec<u16>,
}

impl HuffmanTable {
    /// Read the delta coded symbol lengths for alpha_size symbols and build the table.
    pub fn read(br: &mut BitReader<'_>, alpha_size: usize) -> Result<Self> {
        let mark_loc = br.loc();
        let mut lengths = Vec::with_capacity(alpha_size);

        // The origin length is five bits long. Every symbol's length is then given
        // relative to the previous one by pairs of "1x" bits, ended by a "0".
        let mut l = br.bint(5)?;
        for symbol in 0..alpha_size {
            loop {
                if !(1..=MAX_CODE_LEN).contains(&l) {
                    error!("Symbol length of {} is out of range for symbol {}.", l, symbol);
                    return Err(BzError::corrupt(format!(
                        "Invalid code length {} for symbol {}",
                        l, symbol
                    )));
                }
                if !br.bool_bit()? {
                    break;
                }
                if br.bool_bit()? {
                    l -= 1 // Found "11" - subtract 1
                } else {
                    l += 1 // Found "10" - add 1
                }
            }
            lengths.push(l);
        }
        trace!("\rFound huffman lengths at {}.  ", mark_loc);
        Self::from_lengths(&lengths)
    }

    /// Build the canonical decode table from the code length of each symbol.
    pub fn from_lengths(lengths: &[u32]) -> Result<Self> {
        if lengths.is_empty() {
            return Err(BzError::corrupt("Huffman table has no symbols"));
        }
        // Codes are assigned in order of length, and by symbol within a length.
        let mut map: Vec<(u16, u32)> = lengths
            .iter()
            .enumerate()
            .map(|(symbol, &len)| (symbol as u16, len))
            .collect();
        map.sort_by(|a, b| a.1.cmp(&b.1));

        Ok(Self {
            levels: huf_decode_map(&map),
            symbols: map.iter().map(|(s, _)| *s).collect(),
        })
    }

    /// Decode one symbol from the bit stream.
    pub fn decode(&self, br: &mut BitReader<'_>) -> Result<u16> {
        let mut code = 0_u32;
        for level in &self.levels {
            // Left shift any code bits we are holding so we can add in the next level of bits
            code = code << level.bits | br.bint(level.bits as usize)?;
            if code < level.end_code {
                return Ok(self.symbols[(level.offset + code - level.start_code) as usize]);
            }
        }
        Err(BzError::corrupt(format!(
            "Invalid huffman code {:b} at {}",
            code,
            br.loc()
        )))
    }
}

/// Decode a vec of symbols and lengths (sorted by length) into the level structure
/// needed to efficiently decode the bit stream.
fn huf_decode_map(map: &[(u16, u32)]) -> Vec<Level> {
    let mut result = Vec::new();

    // Number of bits of the codes at the current level
    let mut current_bit_length = map[0].1;

    // Bits we need to read to check codes at this level. (First time
    // it is also the bit length of the code)
    let mut bits_to_add = current_bit_length;

    // Starting code at this level
    let mut current_code = 0;

    let mut count = 0_u32;
    let mut last_count = count;

    for (_symbol, bit_length) in map.iter() {
        count += 1;
        if *bit_length == current_bit_length {
            continue;
        }
        // Done at this level. Record it (count includes the first symbol of the next level).
        result.push(Level {
            bits: bits_to_add,
            offset: last_count,
            start_code: current_code,
            end_code: current_code + count - 1,
        });

        bits_to_add = bit_length - current_bit_length;
        current_code = (current_code + count - 1) << bits_to_add;
        last_count += count - 1;
        count = 1;
        current_bit_length = *bit_length;
    }
    // Record the last level.
    result.push(Level {
        bits: bits_to_add,
        offset: last_count,
        start_code: current_code,
        end_code: current_code + count,
    });

    result
}
