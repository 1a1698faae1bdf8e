use log::error;

use crate::error::{BzError, Result};

pub const RUNA: u16 = 0;
pub const RUNB: u16 = 1;

/// Does run-length decoding of RUNA/RUNB zero runs and Move-To-Front decoding.
/// Takes the huffman decoded symbols (without the EOB symbol), the symbol set of the block
/// and the maximum block size.
/// Returns the BWT-permuted bytes ready for the inverse transform.
pub fn rle2_mtf_decode(data_in: &[u16], mtf_index: &mut Vec<u8>, max_size: usize) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(data_in.len().min(max_size));

    // RUNA/RUNB form a bijective base-2 number, least significant digit first.
    let mut zeros = 0_usize;
    let mut bit_multiplier = 1_usize;

    for &rle2_code in data_in {
        match rle2_code {
            RUNA => {
                zeros += bit_multiplier;
                bit_multiplier <<= 1;
                run_guard(zeros, out.len(), max_size)?;
            }
            RUNB => {
                zeros += bit_multiplier << 1;
                bit_multiplier <<= 1;
                run_guard(zeros, out.len(), max_size)?;
            }

            n => {
                // Output zeros from RUNA/RUNB sequences, if any
                if zeros > 0 {
                    let sym = mtf_index[0];
                    out.resize(out.len() + zeros, sym);
                    bit_multiplier = 1;
                    zeros = 0;
                }

                // Convert the RLE2 code into an MTF code
                let mut mtf_code = n as usize - 1;
                if mtf_code >= mtf_index.len() {
                    error!(
                        "MTF index {} is outside the symbol set of {} bytes.",
                        mtf_code,
                        mtf_index.len()
                    );
                    return Err(BzError::corrupt(format!(
                        "MTF index {} out of range ({} symbols)",
                        mtf_code,
                        mtf_index.len()
                    )));
                }
                if out.len() >= max_size {
                    return Err(BzError::corrupt("Block exceeds the declared block size"));
                }
                out.push(mtf_index[mtf_code]);

                if mtf_code < 16 {
                    // Shift each index at the front of mtfa "forward" one. Do this first in blocks of 4 for speed.
                    let temp_sym = mtf_index[mtf_code];

                    while mtf_code > 3 {
                        mtf_index[mtf_code] = mtf_index[mtf_code - 1];
                        mtf_index[mtf_code - 1] = mtf_index[mtf_code - 2];
                        mtf_index[mtf_code - 2] = mtf_index[mtf_code - 3];
                        mtf_index[mtf_code - 3] = mtf_index[mtf_code - 4];
                        mtf_code -= 4;
                    }
                    // ...then clean up any odd ones
                    while mtf_code > 0 {
                        mtf_index[mtf_code] = mtf_index[mtf_code - 1];
                        mtf_code -= 1;
                    }
                    // ...and finally move this index to the front.
                    mtf_index[0] = temp_sym;
                } else {
                    /* general case */
                    let sym = mtf_index.remove(mtf_code);
                    mtf_index.insert(0, sym)
                }
            }
        }
    }
    // Output trailing zeros from RUNA/RUNB sequences, if any
    if zeros > 0 {
        let sym = mtf_index[0];
        out.resize(out.len() + zeros, sym);
    }

    Ok(out)
}

/// Watch for malicious input: a run may never push the block past its declared size.
fn run_guard(zeros: usize, written: usize, max_size: usize) -> Result<()> {
    if written + zeros > max_size {
        error!("Run of {} zeros overflows a block of at most {} bytes.", zeros, max_size);
        return Err(BzError::corrupt("Run of zeros exceeds the declared block size"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_run() {
        // RUNB = two zeros, i.e. two more copies of the first symbol.
        let mut index = vec![b'a'];
        let out = rle2_mtf_decode(&[RUNB, RUNA], &mut index, 100).unwrap();
        // RUNB(2) + RUNA*2 = 4
        assert_eq!(out, b"aaaa");
    }

    #[test]
    fn mtf_moves_to_front() {
        // Symbols a b c; 2 -> index 1 ('b'), 2 -> index 1 ('a'), 3 -> index 2 ('c')
        let mut index = vec![b'a', b'b', b'c'];
        let out = rle2_mtf_decode(&[2, 2, 3, RUNA], &mut index, 100).unwrap();
        assert_eq!(out, b"bacc");
        assert_eq!(index, vec![b'c', b'a', b'b']);
    }

    #[test]
    fn large_mtf_index_uses_general_case() {
        let mut index: Vec<u8> = (0..=255).collect();
        let out = rle2_mtf_decode(&[201], &mut index, 100).unwrap();
        assert_eq!(out, vec![200]);
        assert_eq!(index[0], 200);
        assert_eq!(index[1], 0);
        assert_eq!(index[200], 199);
        assert_eq!(index[201], 201);
    }

    #[test]
    fn out_of_range_index_is_corrupt() {
        let mut index = vec![b'a', b'b'];
        let err = rle2_mtf_decode(&[5], &mut index, 100).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn zero_bomb_is_corrupt() {
        let mut index = vec![b'a'];
        let data = vec![RUNB; 40];
        let err = rle2_mtf_decode(&data, &mut index, 100_000).unwrap_err();
        assert!(err.is_corrupt());
    }
}
