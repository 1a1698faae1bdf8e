/// A caller-owned output buffer that the decompressor writes into in place.
/// Every write is checked against the capacity of the underlying slice.
#[derive(Debug)]
pub struct OutputBuffer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> OutputBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Copy as much of `src` as fits. Returns the number of bytes copied.
    pub fn write(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.remaining());
        self.buf[self.pos..self.pos + n].copy_from_slice(&src[..n]);
        self.pos += n;
        n
    }

    /// The filled part of the buffer.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

#[cfg(test)]
mod test {
    use super::OutputBuffer;

    #[test]
    fn writes_never_exceed_capacity() {
        let mut raw = [0_u8; 5];
        let mut out = OutputBuffer::new(&mut raw);
        assert_eq!(out.write(b"abc"), 3);
        assert_eq!(out.write(b"defg"), 2);
        assert!(out.is_full());
        assert_eq!(out.write(b"h"), 0);
        assert_eq!(out.filled(), b"abcde");
        assert_eq!(out.written(), 5);
        assert_eq!(out.capacity(), 5);
    }

    #[test]
    fn zero_capacity() {
        let mut raw: [u8; 0] = [];
        let mut out = OutputBuffer::new(&mut raw);
        assert!(out.is_full());
        assert_eq!(out.write(b"x"), 0);
    }
}
