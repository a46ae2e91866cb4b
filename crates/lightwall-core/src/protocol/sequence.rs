//! Thread-safe sequence counter for numbering outgoing frames.
//!
//! Receivers use the sequence number to drop datagrams that arrive out of
//! order: UDP does not guarantee that frame 41 is delivered before frame 42.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, monotonically increasing counter for frame sequence numbers.
///
/// Starts at 0 and wraps from `u64::MAX` back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use lightwall_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SequenceCounter {
    inner: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number and atomically increments the counter.
    ///
    /// `Relaxed` is enough: the value orders frames, it does not publish memory.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the current value without incrementing.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}
