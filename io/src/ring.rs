use alloc::vec;
use alloc::vec::Vec;

/// Fixed-capacity FIFO of bytes.
pub struct ByteRing {
    buf: Vec<u8>,
    head: usize,
    len: usize,
}

impl ByteRing {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Append as much of `data` as fits. Returns the number of bytes taken.
    pub fn push_slice(&mut self, data: &[u8]) -> usize {
        let cap = self.buf.len();
        let n = data.len().min(self.free());
        for (i, &byte) in data[..n].iter().enumerate() {
            let idx = (self.head + self.len + i) % cap;
            self.buf[idx] = byte;
        }
        self.len += n;
        n
    }

    /// Move up to `out.len()` bytes out of the ring, oldest first.
    pub fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let cap = self.buf.len();
        let n = out.len().min(self.len);
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = self.buf[(self.head + i) % cap];
        }
        if n != 0 {
            self.head = (self.head + n) % cap;
            self.len -= n;
        }
        n
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
