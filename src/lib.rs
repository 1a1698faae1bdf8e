//! Streaming bzip2 decompressor with a session based native interface.
//!
//! Version 0.1.0
//!
//! Compressed bytes are handed to a session a piece at a time and decompressed bytes are pulled
//! out into caller-provided buffers of any size. The session calls mirror a native decompressor
//! binding: `init_ids`, `init`, `decompress_bytes_direct`, `get_amount_of_consumed_input`,
//! `get_amount_of_consumed_output`, `finish` and `finish_all`.
//!
//! Basic usage of the command line tool:
//!
//! `$> bzip2-decompressor -k test.txt.bz2`
//!
//! This will decompress the file and create the file test.txt, keeping the input.
//!
//! Library usage:
//!
//! ```
//! use bzip2_decompressor::session::native;
//!
//! let handle = native::init(100_000).unwrap();
//! native::supply_input(handle, b"BZh9\x17\x72\x45\x38\x50\x90\0\0\0\0").unwrap();
//! let mut out = [0_u8; 64];
//! assert_eq!(native::decompress_bytes_direct(handle, &mut out).unwrap(), 0);
//! assert!(native::is_stream_end(handle).unwrap());
//! native::finish(handle).unwrap();
//! ```
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod error;
pub mod ffi;
pub mod huffman_coding;
pub mod session;
pub mod tools;

pub use compression::framing::{SIZE_LENGTH, UNCOMPRESSED_BLOCKSIZE_LENGTH};
pub use error::{BzError, Result};
pub use session::{SessionHandle, SessionRegistry, SessionState};
pub use tools::options::{InputFormat, SessionOptions};
