/*
Logic: Walk the BWT output counting identical bytes. After the fourth identical byte, the
next byte is not data but a count (0-251) of how many more copies of that byte follow.
Once the count is expanded the run counter restarts, so a fifth identical byte after a
count starts a fresh run.
A block may end directly after four identical bytes; the missing count then means zero.
*/
/// Unencodes runs of four or more characters from the RLE1 phase
pub fn rle1_decode(v: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() + v.len() / 4);
    let mut run = 0_usize;
    let mut last = 0_u8;

    for &byte in v {
        if run == 4 {
            out.resize(out.len() + byte as usize, last);
            run = 0;
            continue;
        }
        if run > 0 && byte == last {
            run += 1;
        } else {
            last = byte;
            run = 1;
        }
        out.push(byte);
    }
    out
}

#[cfg(test)]
mod test {
    use super::rle1_decode;

    #[test]
    fn rle1_de_simple() {
        let input: Vec<u8> = vec![
            71, 111, 111, 102, 121, 32, 116, 101, 101, 101, 101, 4, 115, 116,
        ];
        assert_eq!(rle1_decode(&input), "Goofy teeeeeeeest".as_bytes());
    }

    #[test]
    fn back_to_back_runs() {
        let input = b"aaaa\x01bbbb\x00aaaa\x02";
        assert_eq!(rle1_decode(input), b"aaaaabbbbaaaaaa".to_vec());
    }

    #[test]
    fn run_restarts_after_count() {
        // Eight a's are encoded as "aaaa" 0 "aaaa" 0.
        let input = b"aaaa\x00aaaa\x00";
        assert_eq!(rle1_decode(input), vec![b'a'; 8]);
    }

    #[test]
    fn short_and_empty_input() {
        assert_eq!(rle1_decode(b""), Vec::<u8>::new());
        assert_eq!(rle1_decode(b"abc"), b"abc".to_vec());
        assert_eq!(rle1_decode(b"zzzz"), b"zzzz".to_vec());
    }
}
