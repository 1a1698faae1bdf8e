use log::{error, info, trace, warn};

use crate::bitstream::bitreader::BitReader;
use crate::bwt_algorithms::bwt_decode::bwt_decode;
use crate::error::{BzError, Result};
use crate::huffman_coding::huffman_decode::HuffmanTable;
use crate::tools::{
    crc::do_crc, freq_count::freqs, rle1::rle1_decode, rle2_mtf_decode::rle2_mtf_decode,
    symbol_map::read_sym_map,
};

/// 48 bit magic that starts every block (BCD of pi).
pub const BLOCK_MAGIC: u64 = 0x3141_5926_5359;
/// 48 bit magic that ends the stream (BCD of sqrt(pi)).
pub const STREAM_END_MAGIC: u64 = 0x1772_4538_5090;
/// Bzip2 chunk size: the huffman table may change every 50 symbols.
pub const CHUNK_SIZE: usize = 50;
/// Selectors past this count are read but ignored, as the reference decoder does.
pub const MAX_SELECTORS: usize = 18002;
const MIN_TABLES: u32 = 2;
const MAX_TABLES: u32 = 6;

/// One fully decoded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// CRC stored in the block header
    pub crc: u32,
    /// Fully expanded block data
    pub data: Vec<u8>,
}

/// Read a 48 bit magic number.
pub fn read_magic(br: &mut BitReader<'_>) -> Result<u64> {
    let hi = br.bint(24)? as u64;
    let lo = br.bint(24)? as u64;
    Ok(hi << 24 | lo)
}

/// Everything a block declares ahead of its symbol data.
#[derive(Debug)]
struct BlockHeader {
    crc: u32,
    key: u32,
    symbol_set: Vec<u8>,
    eob: u16,
    selectors: Vec<u8>,
    tables: Vec<HuffmanTable>,
}

/// A block whose header has been read, holding the symbols decoded so far.
///
/// Symbol decoding stops at a symbol boundary when the input runs out and picks up from there
/// once more input is available, so a block that arrives in small pieces is only walked once.
#[derive(Debug)]
pub struct BlockDecoder {
    header: BlockHeader,
    /// Largest block (in bytes before RLE1 expansion) the stream header allows
    block_size: usize,
    symbols: Vec<u16>,
    complete: bool,
}

impl BlockDecoder {
    /// Read a block header, starting at its magic number, up to the first symbol.
    pub fn start(br: &mut BitReader<'_>, block_size: usize) -> Result<Self> {
        let magic = read_magic(br)?;
        if magic != BLOCK_MAGIC {
            error!("Block magic {:012x} not found at {}.", magic, br.loc());
            return Err(BzError::corrupt(format!("Invalid block magic {:012x}", magic)));
        }

        let crc = br.bint(32)?;
        trace!("\rBlock CRC is {}.", crc);

        // Get randomize flag - should always be zero from any encoder of this century
        if br.bool_bit()? {
            warn!("Randomised blocks are not supported.");
            return Err(BzError::corrupt("Randomised blocks are not supported"));
        }

        // Get key (origin pointer)
        let key = br.bint(24)?;
        if key as usize > block_size + 10 {
            error!("Invalid key pointer {}", key);
            return Err(BzError::corrupt(format!("Origin pointer {} out of bounds", key)));
        }

        // Get the symbol info and the number of symbols the huffman tables cover.
        // The +2 adds in RUNA / RUNB plus EOB, less one because symbol 0 of the MTF list never
        // needs its own code.
        let symbol_set = read_sym_map(br)?;
        let alpha_size = symbol_set.len() + 2;
        let eob = (alpha_size - 1) as u16;

        let table_count = br.bint(3)?;
        if !(MIN_TABLES..=MAX_TABLES).contains(&table_count) {
            error!("Invalid table count {}", table_count);
            return Err(BzError::corrupt(format!("Invalid table count {}", table_count)));
        }

        let selectors = read_selectors(br, table_count as usize)?;

        let tables = (0..table_count)
            .map(|_| HuffmanTable::read(br, alpha_size))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header: BlockHeader {
                crc,
                key,
                symbol_set,
                eob,
                selectors,
                tables,
            },
            block_size,
            symbols: Vec::with_capacity(block_size / 4),
            complete: false,
        })
    }

    pub fn symbols_decoded(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Decode symbols until the end of block code. If the input runs out, `br` is left just
    /// after the last whole symbol and the symbols read so far are kept for the next call.
    pub fn resume(&mut self, br: &mut BitReader<'_>) -> Result<()> {
        while !self.complete {
            // The huffman table may change every 50 symbols, as the selector map says
            let chunk = self.symbols.len() / CHUNK_SIZE;
            let table = match self.header.selectors.get(chunk) {
                Some(&selector) => &self.header.tables[selector as usize],
                None => {
                    error!("Ran out of selectors at chunk {}.", chunk);
                    return Err(BzError::corrupt("Ran out of selectors before end of block"));
                }
            };
            let mark = br.clone();
            let sym = match table.decode(br) {
                Ok(sym) => sym,
                Err(e) => {
                    *br = mark;
                    return Err(e);
                }
            };
            if sym == self.header.eob {
                self.complete = true;
                break;
            }
            // Every symbol (but EOB) adds at least one byte, so this bounds a runaway block.
            if self.symbols.len() >= self.block_size {
                error!("Block holds more than {} symbols.", self.block_size);
                return Err(BzError::corrupt("Block has more symbols than its block size allows"));
            }
            self.symbols.push(sym);
        }
        Ok(())
    }

    /// Undo RLE2/MTF, the BWT and RLE1, and check the CRC.
    pub fn finish(self, verify_crc: bool) -> Result<DecodedBlock> {
        if !self.complete {
            return Err(BzError::invalid_state("Block symbols are not all decoded yet"));
        }
        let BlockHeader {
            crc: block_crc,
            key,
            mut symbol_set,
            ..
        } = self.header;
        let mtf_out = rle2_mtf_decode(&self.symbols, &mut symbol_set, self.block_size)?;
        drop(self.symbols);

        let freq = freqs(&mtf_out);
        let bwt_v = bwt_decode(key, &mtf_out, &freq)?;
        let data = rle1_decode(&bwt_v);

        if verify_crc {
            let this_block_crc = do_crc(0, &data);
            if this_block_crc != block_crc {
                error!(
                    "Block CRC failed!!! Found {:08x} looking for {:08x}.",
                    this_block_crc, block_crc
                );
                return Err(BzError::corrupt(format!(
                    "Block CRC mismatch: computed {:08x}, stored {:08x}",
                    this_block_crc, block_crc
                )));
            }
        }
        info!("Decoded a block of {} bytes.", data.len());

        Ok(DecodedBlock {
            crc: block_crc,
            data,
        })
    }
}

/// Decode one block in a single pass, starting at its magic number.
pub fn decode_block(
    br: &mut BitReader<'_>,
    block_size: usize,
    verify_crc: bool,
) -> Result<DecodedBlock> {
    let mut block = BlockDecoder::start(br, block_size)?;
    block.resume(br)?;
    block.finish(verify_crc)
}

/// Read the selector count and the MTF coded selectors.
fn read_selectors(br: &mut BitReader<'_>, table_count: usize) -> Result<Vec<u8>> {
    let selector_count = br.bint(15)? as usize;
    if selector_count == 0 {
        return Err(BzError::corrupt("Block has no selectors"));
    }
    if selector_count > MAX_SELECTORS {
        warn!(
            "Found {} selectors were reported, but the maximum is {}. Ignoring the excess.",
            selector_count, MAX_SELECTORS
        );
    }

    // Create an index vec for the number of tables we need
    let mut table_idx: Vec<u8> = (0..table_count as u8).collect();
    let mut selector_map = Vec::with_capacity(selector_count.min(MAX_SELECTORS));

    for i in 0..selector_count {
        // Each selector is a unary coded MTF index
        let mut idx = 0_usize;
        while br.bool_bit()? {
            idx += 1;
            if idx >= table_count {
                return Err(BzError::corrupt(format!(
                    "Selector MTF index {} out of range for {} tables",
                    idx, table_count
                )));
            }
        }
        if i >= MAX_SELECTORS {
            continue;
        }

        // Undo the move to the front.
        let selector = table_idx[idx];
        table_idx.copy_within(0..idx, 1);
        table_idx[0] = selector;
        selector_map.push(selector);
    }
    trace!(
        "\rDecoded {} selectors for the {} tables.",
        selector_map.len(),
        table_count
    );
    Ok(selector_map)
}
