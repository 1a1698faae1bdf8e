//! The huffman module decodes the entropy coding layer of the bzip2 decompressor.
//!
//! Huffman encoding is used in lieu of arithmetic encoding because of an historical problem with licensing restrictions.
//! While that has been resolved in more recent years, the BZIP2 standard was set based on the huffman standard.
//!
//! The huffman coding algorithm as used by BZIP2 is both block and chunk oriented. Each block carries between two and six
//! canonical huffman tables, and every chunk of 50 symbols within that block is coded with the table named by that chunk's
//! selector.
//!
//! The process of decoding each block is inherently sequential and does not benefit from multithreading.
//!
pub mod huffman_decode;
