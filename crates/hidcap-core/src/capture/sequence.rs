//! URB id counter for the capture writer.
//!
//! Every record the writer emits carries a strictly increasing URB id in the
//! first 8 bytes of its envelope.  Real usbmon ids are kernel pointers; a
//! plain counter is enough for tools that only need ids to be distinct and
//! ordered.

/// A monotonically increasing counter for URB ids.
///
/// Ids start at the configured origin (0 by default) and increment by 1 with
/// each call to [`SequenceCounter::next`].  The counter wraps around at
/// `u64::MAX` back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use hidcap_core::capture::SequenceCounter;
///
/// let mut counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter whose first id is `origin`.
    pub fn starting_at(origin: u64) -> Self {
        Self { next: origin }
    }

    /// Returns the next id and advances the counter.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Returns the id the next call to [`SequenceCounter::next`] will hand out.
    pub fn current(&self) -> u64 {
        self.next
    }
}
