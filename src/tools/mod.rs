//! The tools module provides several helper functions for the Rust version of the bzip2 decompressor.
//!
//! BZIP2 is a block-oriented approach to compress data.
//!
//! The tools are:
//! - cli: Command line interface for the decompressor binary.
//! - crc: CRC32 checksum for BZIP2, both block and stream versions.
//! - freq_count: Frequency count feeding the BWT reversal.
//! - options: Per-session settings (input format, CRC checking).
//! - rle1: Run-Length-Decoding phase 1 (4 bytes plus a count).
//! - rle2_mtf_decode: Move-To-Front and Run-Length-Decoding phase 2 (integrated for speed).
//! - symbol_map: Decode the symbol map used in BZIP2.
//!
pub mod cli;
pub mod crc;
pub mod freq_count;
pub mod options;
pub mod rle1;
pub mod rle2_mtf_decode;
pub mod symbol_map;
