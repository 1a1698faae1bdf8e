use log::{error, info, trace, warn};

use crate::bitstream::bitreader::BitReader;
use crate::compression::decompress_block::{
    read_magic, BlockDecoder, DecodedBlock, STREAM_END_MAGIC,
};
use crate::compression::framing::ChunkHeader;
use crate::error::{BzError, Result};
use crate::session::buffer::OutputBuffer;
use crate::tools::crc::do_stream_crc;
use crate::tools::options::{InputFormat, SessionOptions};

const SIGNATURE: &[u8; 3] = b"BZh";
/// Block sizes are declared in units of 100k.
pub const BLOCK_SIZE_UNIT: usize = 100_000;
/// Largest block any stream can declare (level 9).
pub const MAX_BLOCK_SIZE: usize = 9 * BLOCK_SIZE_UNIT;

/// Where the decoder is in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Expecting a chunk size header (framed input only)
    ChunkHeader,
    /// Expecting "BZh" and the block size digit
    StreamHeader,
    /// Expecting a block or the end of stream marker
    Blocks,
    /// The raw stream is complete
    StreamEnd,
}

/// One unit of input decoded but not yet committed.
enum Unit {
    ChunkHeader(ChunkHeader),
    StreamHeader(usize),
    Block(DecodedBlock),
    StreamEnd(u32),
}

#[derive(Debug, Clone, Copy)]
struct ChunkProgress {
    header: ChunkHeader,
    /// Absolute byte offset of the chunk's bzip2 stream
    data_start: u64,
    decoded: u64,
}

/// Incremental decoder for one session. Compressed bytes are appended with supply_input and
/// decoded a unit (stream header, block header, end marker) at a time. A unit is only committed
/// once it has been read in full, so running out of input never loses progress. Block symbol
/// data is the exception: it is committed a symbol at a time, and the partly decoded block is
/// kept until its end of block code shows up.
#[derive(Debug)]
pub struct StreamDecoder {
    options: SessionOptions,
    input: Vec<u8>,
    /// Bit cursor into `input`
    bit_pos: u64,
    /// Bytes already removed from the front of `input`
    drained_bytes: u64,
    phase: Phase,
    block_size: usize,
    /// Block whose symbols are still arriving
    block: Option<BlockDecoder>,
    stream_crc: u32,
    block_counter: usize,
    streams_completed: usize,
    staged: Vec<u8>,
    staged_pos: usize,
    chunk: Option<ChunkProgress>,
    produced: u64,
    failure: Option<BzError>,
    trailing_warned: bool,
}

impl StreamDecoder {
    /// `input_hint` presizes the compressed input buffer.
    pub fn new(options: SessionOptions, input_hint: usize) -> Self {
        let phase = match options.format {
            InputFormat::Raw => Phase::StreamHeader,
            InputFormat::Framed => Phase::ChunkHeader,
        };
        Self {
            options,
            input: Vec::with_capacity(input_hint.min(MAX_BLOCK_SIZE)),
            bit_pos: 0,
            drained_bytes: 0,
            phase,
            block_size: MAX_BLOCK_SIZE,
            block: None,
            stream_crc: 0,
            block_counter: 0,
            streams_completed: 0,
            staged: Vec::new(),
            staged_pos: 0,
            chunk: None,
            produced: 0,
            failure: None,
            trailing_warned: false,
        }
    }

    /// Append compressed bytes to the input buffer.
    pub fn supply_input(&mut self, data: &[u8]) {
        self.input.extend_from_slice(data);
        trace!("\rBuffered {} more input bytes.", data.len());
    }

    /// Bytes of input buffered but not yet consumed.
    pub fn buffered_input(&self) -> usize {
        self.input.len() - (self.bit_pos / 8) as usize
    }

    /// Cumulative compressed bytes consumed. A partly consumed byte counts as consumed.
    pub fn consumed_input(&self) -> u64 {
        (self.drained_bytes * 8 + self.bit_pos + 7) / 8
    }

    /// Cumulative decompressed bytes delivered to callers.
    pub fn consumed_output(&self) -> u64 {
        self.produced
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn blocks_decoded(&self) -> usize {
        self.block_counter
    }

    /// True once a whole stream (raw) or at least one whole chunk with nothing pending
    /// (framed) has been decoded and all of its output delivered.
    pub fn is_stream_end(&self) -> bool {
        if self.has_staged() {
            return false;
        }
        match self.phase {
            Phase::StreamEnd => true,
            Phase::ChunkHeader => self.streams_completed > 0 && self.buffered_input() == 0,
            _ => false,
        }
    }

    /// Decode into `out` until it is full or the input runs dry. Returns the number of bytes
    /// written by this call.
    pub fn decompress(&mut self, out: &mut OutputBuffer<'_>) -> Result<usize> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let start = out.written();
        let result = self.fill(out);
        self.compact();
        let produced = out.written() - start;
        match result {
            Ok(()) => Ok(produced),
            Err(e) => {
                if e.is_corrupt() {
                    self.failure = Some(e.clone());
                }
                // Report what we have; the error shows up again on the next call.
                if produced > 0 {
                    Ok(produced)
                } else {
                    Err(e)
                }
            }
        }
    }

    fn fill(&mut self, out: &mut OutputBuffer<'_>) -> Result<()> {
        loop {
            self.drain_staged(out);
            if self.has_staged() || out.is_full() {
                return Ok(());
            }
            if !self.step()? {
                return Ok(());
            }
        }
    }

    fn has_staged(&self) -> bool {
        self.staged_pos < self.staged.len()
    }

    fn drain_staged(&mut self, out: &mut OutputBuffer<'_>) {
        if self.has_staged() {
            let n = out.write(&self.staged[self.staged_pos..]);
            self.staged_pos += n;
            self.produced += n as u64;
        }
    }

    /// Decode and commit one unit. Returns false when there is nothing left to do.
    fn step(&mut self) -> Result<bool> {
        let read = match self.read_unit() {
            Err(e) if e.is_truncated() && self.chunk_exhausted() => {
                error!("Stream runs past the end of its chunk.");
                Err(BzError::corrupt("Stream overruns its chunk"))
            }
            other => other,
        };
        match read? {
            Some((unit, new_pos)) => {
                self.apply(unit, new_pos)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// End of the current chunk as an index into `input`.
    fn chunk_end(&self) -> Option<usize> {
        self.chunk.map(|chunk| {
            (chunk.data_start + chunk.header.compressed_len as u64 - self.drained_bytes) as usize
        })
    }

    fn chunk_exhausted(&self) -> bool {
        matches!(self.chunk_end(), Some(end) if self.input.len() >= end)
    }

    fn read_unit(&mut self) -> Result<Option<(Unit, u64)>> {
        let end = self
            .chunk_end()
            .map_or(self.input.len(), |end| end.min(self.input.len()));
        let mut br = BitReader::with_bit_offset(&self.input[..end], self.bit_pos);

        let unit = match self.phase {
            Phase::StreamEnd => {
                if !self.trailing_warned && self.buffered_input() > 0 {
                    warn!(
                        "Ignoring {} bytes after the end of the stream.",
                        self.buffered_input()
                    );
                }
                return Ok(None);
            }
            Phase::ChunkHeader => {
                if br.remaining_bits() == 0 {
                    return Ok(None);
                }
                Unit::ChunkHeader(ChunkHeader::read(&mut br)?)
            }
            Phase::StreamHeader => {
                let signature = br.bytes(SIGNATURE.len())?;
                if signature != SIGNATURE {
                    error!("Fatal error: input is not a valid bzip2 stream.");
                    return Err(BzError::corrupt("Invalid bzip2 signature"));
                }
                let level = br.byte()?;
                if !(b'1'..=b'9').contains(&level) {
                    error!("Fatal error: Found invalid block size.");
                    return Err(BzError::corrupt(format!("Invalid block size {:#04x}", level)));
                }
                Unit::StreamHeader((level - b'0') as usize * BLOCK_SIZE_UNIT)
            }
            Phase::Blocks => return self.read_block(end).map(Some),
        };
        Ok(Some((unit, br.position())))
    }

    /// Read the next block or the end of stream marker. A block's symbol progress is committed
    /// as it is made, even when the rest of the block has not arrived yet.
    fn read_block(&mut self, end: usize) -> Result<(Unit, u64)> {
        let mut br = BitReader::with_bit_offset(&self.input[..end], self.bit_pos);
        let mut block = match self.block.take() {
            Some(block) => block,
            None => {
                // Peek: the end of stream marker and a block magic have the same size.
                let mut peek = br.clone();
                if read_magic(&mut peek)? == STREAM_END_MAGIC {
                    let stored_crc = peek.bint(32)?;
                    peek.align_to_byte();
                    return Ok((Unit::StreamEnd(stored_crc), peek.position()));
                }
                BlockDecoder::start(&mut br, self.block_size)?
            }
        };
        let resumed = block.resume(&mut br);
        self.bit_pos = br.position();
        if let Err(e) = resumed {
            trace!("\rBlock paused after {} symbols.", block.symbols_decoded());
            self.block = Some(block);
            return Err(e);
        }
        Ok((Unit::Block(block.finish(self.options.verify_crc)?), br.position()))
    }

    fn apply(&mut self, unit: Unit, new_pos: u64) -> Result<()> {
        match unit {
            Unit::ChunkHeader(header) => {
                info!(
                    "Found a chunk of {} compressed bytes ({} uncompressed).",
                    header.compressed_len, header.uncompressed_len
                );
                self.chunk = Some(ChunkProgress {
                    header,
                    data_start: self.drained_bytes + new_pos / 8,
                    decoded: 0,
                });
                self.phase = Phase::StreamHeader;
            }
            Unit::StreamHeader(block_size) => {
                info!("Found a valid bzip2 signature (block size {}).", block_size);
                self.block_size = block_size;
                self.stream_crc = 0;
                self.phase = Phase::Blocks;
            }
            Unit::Block(block) => {
                self.block_counter += 1;
                self.stream_crc = do_stream_crc(self.stream_crc, block.crc);
                if let Some(chunk) = self.chunk.as_mut() {
                    chunk.decoded += block.data.len() as u64;
                }
                trace!(
                    "\rStaged block {} with {} bytes.",
                    self.block_counter,
                    block.data.len()
                );
                self.staged = block.data;
                self.staged_pos = 0;
            }
            Unit::StreamEnd(stored_crc) => {
                if self.options.verify_crc && stored_crc != self.stream_crc {
                    error!(
                        "Stream CRC failed!!! Found {:08x} looking for {:08x}.",
                        self.stream_crc, stored_crc
                    );
                    return Err(BzError::corrupt(format!(
                        "Stream CRC mismatch: computed {:08x}, stored {:08x}",
                        self.stream_crc, stored_crc
                    )));
                }
                info!("Stream CRCs matched: {:08x}.", stored_crc);
                self.streams_completed += 1;
                match self.chunk.take() {
                    Some(chunk) => {
                        self.check_chunk(&chunk, self.drained_bytes + new_pos / 8)?;
                        self.phase = Phase::ChunkHeader;
                    }
                    None => self.phase = Phase::StreamEnd,
                }
            }
        }
        self.bit_pos = new_pos;
        Ok(())
    }

    /// A chunk must hold exactly one stream of the declared sizes.
    fn check_chunk(&self, chunk: &ChunkProgress, stream_end: u64) -> Result<()> {
        let used = stream_end - chunk.data_start;
        if used != chunk.header.compressed_len as u64 {
            error!(
                "Chunk declared {} compressed bytes but its stream used {}.",
                chunk.header.compressed_len, used
            );
            return Err(BzError::corrupt(format!(
                "Chunk compressed size mismatch: declared {}, used {}",
                chunk.header.compressed_len, used
            )));
        }
        if chunk.decoded != chunk.header.uncompressed_len as u64 {
            error!(
                "Chunk declared {} uncompressed bytes but decoded {}.",
                chunk.header.uncompressed_len, chunk.decoded
            );
            return Err(BzError::corrupt(format!(
                "Chunk uncompressed size mismatch: declared {}, decoded {}",
                chunk.header.uncompressed_len, chunk.decoded
            )));
        }
        Ok(())
    }

    /// Drop input bytes that have been fully consumed.
    fn compact(&mut self) {
        let whole = (self.bit_pos / 8) as usize;
        if whole > 0 {
            self.input.drain(..whole);
            self.drained_bytes += whole as u64;
            self.bit_pos -= whole as u64 * 8;
        }
        if self.phase == Phase::StreamEnd && self.buffered_input() > 0 {
            self.trailing_warned = true;
        }
    }
}
