use crate::bitstream::bitreader::BitReader;
use crate::error::{BzError, Result};

const BIT_MASK: u16 = 0x8000;

/// Read the two-level symbol map from the block header and return the sorted set of
/// byte values used in the block.
pub fn read_sym_map(br: &mut BitReader<'_>) -> Result<Vec<u8>> {
    // The "index" word says which of the 16 ranges of 16 bytes have a map following it.
    let mut sym_map: Vec<u16> = vec![br.bint(16)? as u16];
    for _ in 0..sym_map[0].count_ones() {
        sym_map.push(br.bint(16)? as u16);
    }
    let symbols = decode_sym_map(&sym_map);
    if symbols.is_empty() {
        return Err(BzError::corrupt("Symbol map is empty"));
    }
    Ok(symbols)
}

/// Takes the unique bzip2 symbol map and returns a sorted vec of all
/// u8s used in the input.
pub fn decode_sym_map(symbol_map: &[u16]) -> Vec<u8> {
    /*
    symbol_map[0] marks the presence/absence of ranges of 16 u8s. If its first bit is
    zero, none of 0-15 were present and no u16 follows for them. If its second bit is one,
    at least one u8 from 16-31 was present and the next u16 is a bit map for that range.
    */
    let mut symbols: Vec<u8> = Vec::with_capacity(256);
    let mut map_idx = 0;

    for block in 0..16_u8 {
        if (symbol_map[0] & (BIT_MASK >> block)) > 0 {
            map_idx += 1;
            for byte_idx in 0..16_u8 {
                if (symbol_map[map_idx] & (BIT_MASK >> byte_idx)) > 0 {
                    symbols.push((block << 4) + byte_idx);
                };
            }
        }
    }
    symbols
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_symbol_map_test() {
        let maps = vec![11008, 32770, 4, 17754, 6208];
        let mut compare = "Making a silly test.".as_bytes().to_vec();
        compare.sort_unstable();
        compare.dedup();
        assert_eq!(compare, decode_sym_map(&maps));
    }

    #[test]
    fn decode_symbol_map_full_test() {
        let maps = vec![0xffff; 17];
        let compare = (0..=255).collect::<Vec<u8>>();
        assert_eq!(compare, decode_sym_map(&maps));
    }

    #[test]
    fn read_single_symbol() {
        // Range 6 (0x60..0x6f) present, and within it only 'a' (0x61).
        let data = [0x02, 0x00, 0x40, 0x00];
        let mut br = BitReader::new(&data);
        assert_eq!(read_sym_map(&mut br), Ok(vec![b'a']));
        assert_eq!(br.position(), 32);
    }

    #[test]
    fn empty_map_is_corrupt() {
        let data = [0x00, 0x00];
        let mut br = BitReader::new(&data);
        assert!(read_sym_map(&mut br).unwrap_err().is_corrupt());
    }

    #[test]
    fn truncated_map() {
        let data = [0x02, 0x00, 0x40];
        let mut br = BitReader::new(&data);
        assert!(read_sym_map(&mut br).unwrap_err().is_truncated());
    }
}
