//! CRC32 checksums for BZIP2, both block and stream versions.
//!
//! BZIP2 uses the big-endian (MSB first) CRC32 with polynomial 0x04c11db7. The block CRC
//! covers the fully decoded bytes of a block. The stream CRC combines the block CRCs.

const POLYNOMIAL: u32 = 0x04c1_1db7;

const CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Continue a block CRC over more data. Start a block with a crc of 0.
/// Calls can be chained: do_crc(do_crc(0, a), b) == do_crc(0, a ++ b).
pub fn do_crc(crc: u32, data: &[u8]) -> u32 {
    let mut crc = !crc;
    for &byte in data {
        crc = (crc << 8) ^ CRC_TABLE[((crc >> 24) as u8 ^ byte) as usize];
    }
    !crc
}

/// Fold a block CRC into the running stream CRC.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_block_crc() {
        // CRC of "aaaa" as stored in the block header written by the reference bzip2.
        assert_eq!(do_crc(0, b"aaaa"), 0x8812_33a6);
    }

    #[test]
    fn crc_is_chainable() {
        let data = b"Making a silly test.";
        let whole = do_crc(0, data);
        let parts = do_crc(do_crc(0, &data[..7]), &data[7..]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn single_block_stream_crc_equals_block_crc() {
        assert_eq!(do_stream_crc(0, 0x8812_33a6), 0x8812_33a6);
    }

    #[test]
    fn stream_crc_rotates() {
        assert_eq!(do_stream_crc(0x8000_0001, 0), 0x0000_0003);
    }
}
