//! Channel handle allocation

use crate::types::ChannelHandle;

/// Monotonic handle counter scoped to one mixer
///
/// Hands out 0, 1, 2, ... and never the [`ChannelHandle::INVALID`] sentinel.
/// When the counter reaches the sentinel it wraps to 0 and logs a warning.
/// A wrapped handle can alias a channel that is still playing; the mixer
/// logs that case too and lets the new channel replace the old one.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `next` (used to exercise the wrap boundary)
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    /// The id the next call to [`allocate`](Self::allocate) will try
    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn allocate(&mut self) -> ChannelHandle {
        let mut id = self.next;
        if id == ChannelHandle::INVALID.raw() {
            log::warn!("Channel handle space exhausted, wrapping handles to 0");
            id = 0;
        }
        self.next = id.wrapping_add(1);
        ChannelHandle::from_raw(id)
    }
}
