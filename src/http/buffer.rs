//! Growable byte accumulator used to collect partial reads.
//!
//! Bytes are appended at the logical end and consumed from the front.
//! Consumption never reallocates: the unread tail is shifted back to
//! offset 0 instead.

/// Smallest backing allocation, in bytes.
pub const MIN_CAPACITY: usize = 32;

#[derive(Debug)]
pub struct DynBuf {
    data: Vec<u8>,
    len: usize,
}

impl Default for DynBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl DynBuf {
    /// Starts with [`MIN_CAPACITY`] bytes of backing storage.
    pub fn new() -> Self {
        Self {
            data: vec![0; MIN_CAPACITY],
            len: 0,
        }
    }

    /// Appends `bytes`, doubling the backing storage until it fits.
    pub fn push(&mut self, bytes: &[u8]) {
        let new_len = self.len + bytes.len();

        if self.data.len() < new_len {
            let mut cap = self.data.len().max(MIN_CAPACITY);
            while cap < new_len {
                cap *= 2;
            }
            self.data.resize(cap, 0);
        }

        self.data[self.len..new_len].copy_from_slice(bytes);
        self.len = new_len;
    }

    /// Drops the first `n` bytes and moves the rest to the front.
    ///
    /// Callers must never pop more than [`DynBuf::len`] bytes.
    pub fn pop(&mut self, n: usize) {
        debug_assert!(n <= self.len, "pop({n}) past logical length {}", self.len);
        let n = n.min(self.len);

        self.data.copy_within(n..self.len, 0);
        self.len -= n;
    }

    /// Index of the first occurrence of `pattern` in the logical region.
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        if pattern.is_empty() || pattern.len() > self.len {
            return None;
        }

        self.as_slice()
            .windows(pattern.len())
            .position(|window| window == pattern)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing storage. Only ever grows.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}
