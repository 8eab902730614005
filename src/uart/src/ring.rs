//! Fixed-capacity receive ring.
//!
//! The interrupt handler is the only producer and the foreground is the only consumer;
//! the owning [`Channel`](crate::channel::Channel) serializes the two through its lock.

/// Circular byte queue with a power-of-two capacity between 4 and 256.
///
/// `remaining` is kept alongside the indices so that an empty ring (`head == tail`)
/// and a full one (also `head == tail`) stay distinguishable.
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
    remaining: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Compile-time capacity check, evaluated by [`RingBuffer::new`].
    const VALID_CAPACITY: () = assert!(
        N >= 4 && N <= 256 && N.is_power_of_two(),
        "ring capacity must be a power of two between 4 and 256"
    );

    const MASK: usize = N - 1;

    /// Create an empty ring.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            remaining: N,
        }
    }

    /// Store `byte` at the head.
    ///
    /// A full ring is left untouched and the byte is handed back in `Err`.
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        if self.remaining == 0 {
            return Err(byte);
        }
        self.buf[self.head] = byte;
        self.head = (self.head + 1) & Self::MASK;
        self.remaining -= 1;
        Ok(())
    }

    /// Store `byte`, discarding the oldest unread byte if the ring is full.
    ///
    /// Returns the discarded byte.
    pub fn push_overwrite(&mut self, byte: u8) -> Option<u8> {
        let evicted = if self.is_full() { self.pop() } else { None };
        // Cannot fail: at least one slot is free here.
        let _ = self.push(byte);
        evicted
    }

    /// Take the byte at the tail.
    pub fn pop(&mut self) -> Option<u8> {
        if !self.available() {
            return None;
        }
        let byte = self.buf[self.tail];
        self.tail = (self.tail + 1) & Self::MASK;
        self.remaining += 1;
        Some(byte)
    }

    /// Returns `true` if at least one unread byte is stored.
    #[inline]
    pub fn available(&self) -> bool {
        self.remaining != N
    }

    /// Returns `true` if no slot is free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining == 0
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        N - self.remaining
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.available()
    }

    /// Free slots.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Total slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Next write index.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Next read index.
    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Drop all stored bytes.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.remaining = N;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
