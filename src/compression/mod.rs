//! The compression module manages the decompression side of the the Rust version of the bzip2 library.
//!
//! Decompression is single threaded. It follows the inverse of the compression process.
//! - Huffman decoding: 50 symbols at a time, each chunk with the table its selector names.
//! - RLE 2: Expand all runs of the zero byte (RUNA/RUNB).
//! - MTF transform: Convert from the Move-To-Front indecies to the symbols represented by the indecies.
//! - BWT reversal: Restore the original data from the BWT transform.
//! - RLE 1: Expand all runs of 4+ identical bytes.
//!
//! The modules are:
//! - decompress_block: one block, from its magic to its expanded bytes.
//! - stream: the incremental stream decoder behind every session.
//! - framing: the 8 byte size header that prefixes each chunk of framed input.
//! - decompress: file level decompression through the session interface.
//!

pub mod decompress;
pub mod decompress_block;
pub mod framing;
pub mod stream;
