//! Error taxonomy for the decompressor.
//!
//! Every failure surfaces as one of three kinds:
//! - InvalidState: an operation was called on an unknown handle, or on a session in the wrong lifecycle state.
//! - TruncatedInput: the buffered input ran out before a field or bit string was complete.
//! - CorruptBlock: the data violates the bzip2 format (bad magic, bad huffman code, out of range index, bad CRC).
//!
use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BzError {
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Truncated input: needed {needed} bits, only {available} available")]
    TruncatedInput { needed: usize, available: u64 },

    #[error("Corrupt block: {0}")]
    CorruptBlock(String),
}

impl BzError {
    pub fn invalid_state<T: fmt::Display>(msg: T) -> Self {
        BzError::InvalidState(msg.to_string())
    }

    pub fn corrupt<T: fmt::Display>(msg: T) -> Self {
        BzError::CorruptBlock(msg.to_string())
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, BzError::TruncatedInput { .. })
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, BzError::CorruptBlock(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, BzError::InvalidState(_))
    }
}

impl From<BzError> for io::Error {
    fn from(err: BzError) -> Self {
        let kind = match err {
            BzError::InvalidState(_) => io::ErrorKind::Other,
            BzError::TruncatedInput { .. } => io::ErrorKind::UnexpectedEof,
            BzError::CorruptBlock(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, BzError>;
