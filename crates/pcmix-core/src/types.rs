//! Common types for pcmix
//!
//! Channel handles and the fixed-point volume scale shared by the mixer,
//! the channels and the rate converters.

use std::fmt;

/// Maximum per-channel volume (`u8` full scale)
pub const MAX_CHANNEL_VOLUME: u8 = 0xFF;

/// Mixer-wide fixed-point unity gain
///
/// A channel gain of `MAX_MIXER_VOLUME` passes samples through unchanged;
/// converters scale every sample by `gain / MAX_MIXER_VOLUME`.
pub const MAX_MIXER_VOLUME: u16 = 0x100;

/// Balance limit in either direction (-127 = hard left, 127 = hard right)
pub const MAX_BALANCE: i8 = 127;

/// Number of interleaved channels the mixer produces
pub const OUTPUT_CHANNELS: u16 = 2;

/// Opaque identifier for a playing channel
///
/// Returned by [`Mixer::play`](crate::mixer::Mixer::play). The reserved value
/// [`ChannelHandle::INVALID`] means "no channel"; every handle-taking mixer
/// operation treats it (and any handle that was stopped) as a no-op.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelHandle(u32);

impl ChannelHandle {
    /// The "no channel" sentinel (all bits set)
    pub const INVALID: ChannelHandle = ChannelHandle(u32::MAX);

    /// Wrap a raw id
    #[inline]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// The raw 32-bit id
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this handle is anything other than the sentinel
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for ChannelHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "ChannelHandle({})", self.0)
        } else {
            write!(f, "ChannelHandle(INVALID)")
        }
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#invalid")
        }
    }
}

/// Derived per-side gains of a channel, in units of [`MAX_MIXER_VOLUME`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelGains {
    pub left: u16,
    pub right: u16,
}

/// Where a channel stands with respect to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Source has samples; mixed normally
    Active,
    /// Source has no samples right now; skipped this tick but kept
    Starved,
    /// Source is permanently exhausted; removed by the next mix pass
    Exhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handle() {
        assert!(!ChannelHandle::INVALID.is_valid());
        assert_eq!(ChannelHandle::INVALID.raw(), 0xFFFF_FFFF);
        assert_eq!(ChannelHandle::default(), ChannelHandle::INVALID);
        assert!(ChannelHandle::from_raw(0).is_valid());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(ChannelHandle::from_raw(7).to_string(), "#7");
        assert_eq!(ChannelHandle::INVALID.to_string(), "#invalid");
        assert_eq!(format!("{:?}", ChannelHandle::INVALID), "ChannelHandle(INVALID)");
    }
}
