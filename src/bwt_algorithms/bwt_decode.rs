use log::error;

use crate::error::{BzError, Result};

/// Decode a Burrows-Wheeler-Transform given the origin pointer (key), the transformed data
/// and its byte frequency count.
pub fn bwt_decode(key: u32, bwt_in: &[u8], freq_in: &[u32; 256]) -> Result<Vec<u8>> {
    let end = bwt_in.len();
    if key as usize >= end {
        error!("Origin pointer {} is outside a block of {} bytes.", key, end);
        return Err(BzError::corrupt(format!(
            "Origin pointer {} out of bounds for block of {} bytes",
            key, end
        )));
    }

    // Convert frequency count to a cumulative sum of frequencies
    let mut freq = [0_u32; 256];
    for i in 0..255 {
        freq[i + 1] = freq[i] + freq_in[i];
    }

    // Build the transformation vector to find the next character in the original data
    let mut t_vec = vec![0_u32; end];
    for (i, &s) in bwt_in.iter().enumerate() {
        t_vec[freq[s as usize] as usize] = i as u32;
        freq[s as usize] += 1
    }

    // Follow the chain starting from the origin
    let mut orig = Vec::with_capacity(end);
    let mut pos = t_vec[key as usize] as usize;
    for _ in 0..end {
        orig.push(bwt_in[pos]);
        pos = t_vec[pos] as usize;
    }

    Ok(orig)
}

#[cfg(test)]
mod test {
    use super::bwt_decode;
    use crate::tools::freq_count::freqs;

    #[test]
    fn banana() {
        // Rotations of "banana" sorted: abanan, anaban, ananab, banana, nabana, nanaba
        // Last column "nnbaaa", original string is row 3.
        let bwt = b"nnbaaa";
        assert_eq!(bwt_decode(3, bwt, &freqs(bwt)).unwrap(), b"banana");
    }

    #[test]
    fn single_byte() {
        assert_eq!(bwt_decode(0, b"x", &freqs(b"x")).unwrap(), b"x");
    }

    #[test]
    fn key_out_of_bounds() {
        let bwt = b"nnbaaa";
        assert!(bwt_decode(6, bwt, &freqs(bwt)).unwrap_err().is_corrupt());
        assert!(bwt_decode(0, b"", &freqs(b"")).unwrap_err().is_corrupt());
    }
}
