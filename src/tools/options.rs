//! Per-session decompressor settings
use std::{fmt::Display, fmt::Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Defines the two accepted input layouts
pub enum InputFormat {
    /// One plain bzip2 stream
    #[default]
    Raw,
    /// Chunks, each a size header followed by one bzip2 stream
    Framed,
}
impl Display for InputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Defines all caller settable options that control one decompression session
pub struct SessionOptions {
    /// Layout of the compressed input
    pub format: InputFormat,
    /// Check block and stream CRCs
    pub verify_crc: bool,
}

impl SessionOptions {
    /// Default parameters: raw bzip2 input with CRC checking
    pub fn new() -> Self {
        Self {
            format: InputFormat::Raw,
            verify_crc: true,
        }
    }

    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_crc_check(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let o = SessionOptions::default();
        assert_eq!(o.format, InputFormat::Raw);
        assert!(o.verify_crc);
    }

    #[test]
    fn builders() {
        let o = SessionOptions::new()
            .with_format(InputFormat::Framed)
            .with_crc_check(false);
        assert_eq!(o.format, InputFormat::Framed);
        assert!(!o.verify_crc);
        assert_eq!(o.format.to_string(), "Framed");
    }
}
