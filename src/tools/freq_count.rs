use rayon::prelude::*;

/// Blocks smaller than this are counted on the calling thread.
const PARALLEL_THRESHOLD: usize = 64_000;
// 16k is pretty much the sweet spot for chunk size.
const CHUNK: usize = 16_000;

/// Returns a frequency count of every byte value in the data. Uses parallelism when the
/// data set is over 64k.
pub fn freqs(data: &[u8]) -> [u32; 256] {
    if data.len() > PARALLEL_THRESHOLD {
        data.par_chunks(CHUNK)
            .fold(
                || [0_u32; 256],
                |mut freqs, chunk| {
                    chunk.iter().for_each(|&el| freqs[el as usize] += 1);
                    freqs
                },
            )
            .reduce(
                || [0_u32; 256],
                |mut s, f| {
                    s.iter_mut().zip(f.iter()).for_each(|(a, b)| *a += b);
                    s
                },
            )
    } else {
        let mut freqs = [0_u32; 256];
        data.iter().for_each(|&el| freqs[el as usize] += 1);
        freqs
    }
}
