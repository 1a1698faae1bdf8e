//! Chunk framing for the framed input format.
//!
//! A framed input is a sequence of chunks. Each chunk starts with a size header of
//! `SIZE_LENGTH` bytes: the big-endian length of the compressed payload, followed by the
//! big-endian uncompressed length in the last `UNCOMPRESSED_BLOCKSIZE_LENGTH` bytes. The
//! payload is one complete bzip2 stream.
//!
use crate::bitstream::bitreader::BitReader;
use crate::error::Result;

/// Bytes occupied by a chunk's size header.
pub const SIZE_LENGTH: usize = 8;
/// Bytes occupied by the uncompressed-size field at the end of the size header.
pub const UNCOMPRESSED_BLOCKSIZE_LENGTH: usize = 4;
/// Bytes occupied by the compressed-size field at the start of the size header.
pub const COMPRESSED_SIZE_LENGTH: usize = SIZE_LENGTH - UNCOMPRESSED_BLOCKSIZE_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub compressed_len: u32,
    pub uncompressed_len: u32,
}

impl ChunkHeader {
    pub fn new(compressed_len: u32, uncompressed_len: u32) -> Self {
        Self {
            compressed_len,
            uncompressed_len,
        }
    }

    /// Read a size header. Reads nothing unless all SIZE_LENGTH bytes are present.
    pub fn read(br: &mut BitReader<'_>) -> Result<Self> {
        let bytes = br.bytes(SIZE_LENGTH)?;
        let mut compressed = [0_u8; COMPRESSED_SIZE_LENGTH];
        let mut uncompressed = [0_u8; UNCOMPRESSED_BLOCKSIZE_LENGTH];
        compressed.copy_from_slice(&bytes[..COMPRESSED_SIZE_LENGTH]);
        uncompressed.copy_from_slice(&bytes[COMPRESSED_SIZE_LENGTH..]);
        Ok(Self {
            compressed_len: u32::from_be_bytes(compressed),
            uncompressed_len: u32::from_be_bytes(uncompressed),
        })
    }

    pub fn to_bytes(self) -> [u8; SIZE_LENGTH] {
        let mut out = [0_u8; SIZE_LENGTH];
        out[..COMPRESSED_SIZE_LENGTH].copy_from_slice(&self.compressed_len.to_be_bytes());
        out[COMPRESSED_SIZE_LENGTH..].copy_from_slice(&self.uncompressed_len.to_be_bytes());
        out
    }
}

/// Prefix a complete bzip2 stream with its size header.
pub fn frame_chunk(stream: &[u8], uncompressed_len: u32) -> Vec<u8> {
    let header = ChunkHeader::new(stream.len() as u32, uncompressed_len);
    let mut out = Vec::with_capacity(SIZE_LENGTH + stream.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(stream);
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constants_match_wire_format() {
        assert_eq!(SIZE_LENGTH, 8);
        assert_eq!(UNCOMPRESSED_BLOCKSIZE_LENGTH, 4);
    }

    #[test]
    fn header_layout_is_big_endian() {
        let header = ChunkHeader::new(0x0102_0304, 0x0a0b_0c0d);
        assert_eq!(
            header.to_bytes(),
            [0x01, 0x02, 0x03, 0x04, 0x0a, 0x0b, 0x0c, 0x0d]
        );
        let bytes = header.to_bytes();
        let mut br = BitReader::new(&bytes);
        assert_eq!(ChunkHeader::read(&mut br), Ok(header));
    }

    #[test]
    fn short_header_is_truncated() {
        let bytes = [0_u8; SIZE_LENGTH - 1];
        let mut br = BitReader::new(&bytes);
        assert!(ChunkHeader::read(&mut br).unwrap_err().is_truncated());
        assert_eq!(br.position(), 0);
    }

    #[test]
    fn frame_prefixes_stream() {
        let framed = frame_chunk(b"BZh9", 0);
        assert_eq!(framed.len(), SIZE_LENGTH + 4);
        assert_eq!(&framed[..4], &[0, 0, 0, 4]);
        assert_eq!(&framed[SIZE_LENGTH..], b"BZh9");
    }
}
