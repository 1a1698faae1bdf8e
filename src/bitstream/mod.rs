//! The bitstream module forms the input subsystem for the bzip2 decompressor.
//!
//! BZIP2 is a block-oriented approach to compress data. Blocks are not byte aligned, so every
//! field in the stream is read through a bit cursor.
//!
//! The reader works over an in-memory buffer owned by a decompression session. A session
//! remembers the bit position of the last fully decoded unit (stream header, block or
//! end-of-stream marker) and starts a fresh reader from there on every call.
//!
pub mod bitreader;
