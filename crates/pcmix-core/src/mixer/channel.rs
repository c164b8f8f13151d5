//! A playing source with its volume, balance and converter

use crate::convert::{make_rate_converter, RateConverter};
use crate::source::AudioSource;
use crate::types::{ChannelGains, ChannelState, MAX_BALANCE, MAX_CHANNEL_VOLUME, MAX_MIXER_VOLUME};

/// Derive per-side gains from volume and balance
///
/// The loud side always gets the full channel gain; the other side is
/// attenuated linearly with how far the balance points away from it, reaching
/// zero at ±127. All arithmetic is integer and truncating.
pub fn channel_gains(volume: u8, balance: i8) -> ChannelGains {
    let balance = balance.clamp(-MAX_BALANCE, MAX_BALANCE) as i32;
    let vol = MAX_MIXER_VOLUME as i32 * volume as i32;
    let full = vol / MAX_CHANNEL_VOLUME as i32;
    let attenuated = |toward: i32| (toward * vol) / (MAX_CHANNEL_VOLUME as i32 * MAX_BALANCE as i32);

    let (left, right) = match balance {
        0 => (full, full),
        b if b < 0 => (full, attenuated(MAX_BALANCE as i32 + b)),
        b => (attenuated(MAX_BALANCE as i32 - b), full),
    };
    ChannelGains {
        left: left as u16,
        right: right as u16,
    }
}

/// One entry in the mixer's channel table
///
/// Owns its source and converter; both are dropped with the channel.
pub struct Channel {
    source: Box<dyn AudioSource>,
    converter: Box<dyn RateConverter>,
    volume: u8,
    balance: i8,
    gains: ChannelGains,
}

impl Channel {
    /// Bind `source` for playback at `output_rate`
    pub fn new(source: Box<dyn AudioSource>, output_rate: u32, volume: u8, balance: i8) -> Self {
        let converter = make_rate_converter(source.sample_rate(), output_rate, source.is_stereo());
        let balance = balance.clamp(-MAX_BALANCE, MAX_BALANCE);
        Self {
            source,
            converter,
            volume,
            balance,
            gains: channel_gains(volume, balance),
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        self.update_gains();
    }

    pub fn balance(&self) -> i8 {
        self.balance
    }

    /// Set balance, clamped to [-127, 127]
    pub fn set_balance(&mut self, balance: i8) {
        self.balance = balance.clamp(-MAX_BALANCE, MAX_BALANCE);
        self.update_gains();
    }

    pub fn gains(&self) -> ChannelGains {
        self.gains
    }

    /// Nothing to mix right now, counting frames the converter has staged
    ///
    /// A finished source with a held tail frame is not starved: the next pass
    /// flushes the tail.
    pub fn end_of_data(&self) -> bool {
        self.converter.pending_frames() == 0
            && self.source.end_of_data()
            && (self.converter.held_frames() == 0 || !self.source.end_of_stream())
    }

    /// Nothing will ever be mixed again
    pub fn end_of_stream(&self) -> bool {
        self.converter.pending_frames() == 0
            && self.converter.held_frames() == 0
            && self.source.end_of_stream()
    }

    pub fn state(&self) -> ChannelState {
        if self.end_of_stream() {
            ChannelState::Exhausted
        } else if self.end_of_data() {
            ChannelState::Starved
        } else {
            ChannelState::Active
        }
    }

    /// Mix into an interleaved stereo int16 buffer, returning frames produced
    pub fn mix(&mut self, dst: &mut [i16]) -> usize {
        self.converter
            .flow(&mut *self.source, dst, self.gains.left, self.gains.right)
    }

    fn update_gains(&mut self) {
        self.gains = channel_gains(self.volume, self.balance);
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("volume", &self.volume)
            .field("balance", &self.balance)
            .field("gains", &self.gains)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    fn channel(samples: Vec<i16>, volume: u8, balance: i8) -> Channel {
        let source = BufferSource::stereo(samples, 44100).unwrap();
        Channel::new(Box::new(source), 44100, volume, balance)
    }

    #[test]
    fn test_full_volume_is_unity() {
        let gains = channel_gains(255, 0);
        assert_eq!(gains, ChannelGains { left: 256, right: 256 });
    }

    #[test]
    fn test_centered_gains_equal_and_monotonic() {
        let mut last = 0;
        for v in 0..=255u8 {
            let gains = channel_gains(v, 0);
            assert_eq!(gains.left, gains.right);
            assert!(gains.left >= last, "gain dropped at volume {v}");
            last = gains.left;
        }
    }

    #[test]
    fn test_balance_favours_panned_side() {
        for v in [1u8, 64, 128, 200, 255] {
            for b in -127..0i8 {
                let g = channel_gains(v, b);
                assert!(g.left >= g.right, "v={v} b={b}");
            }
            for b in 1..=127i8 {
                let g = channel_gains(v, b);
                assert!(g.right >= g.left, "v={v} b={b}");
            }
        }
    }

    #[test]
    fn test_hard_pan_silences_other_side() {
        assert_eq!(channel_gains(255, -127), ChannelGains { left: 256, right: 0 });
        assert_eq!(channel_gains(255, 127), ChannelGains { left: 0, right: 256 });
        // -128 is clamped to -127
        assert_eq!(channel_gains(255, -128), channel_gains(255, -127));
    }

    #[test]
    fn test_exact_pan_law_values() {
        // vol = 256 * 128 = 32768
        // left  = 32768 / 255 = 128
        // right = (127 - 64) * 32768 / (255 * 127) = 2064384 / 32385 = 63
        assert_eq!(channel_gains(128, -64), ChannelGains { left: 128, right: 63 });
        assert_eq!(channel_gains(128, 64), ChannelGains { left: 63, right: 128 });
        assert_eq!(channel_gains(0, 50), ChannelGains { left: 0, right: 0 });
    }

    #[test]
    fn test_setters_recompute_gains() {
        let mut ch = channel(vec![0; 4], 255, 0);
        ch.set_volume(128);
        assert_eq!(ch.volume(), 128);
        assert_eq!(ch.gains(), channel_gains(128, 0));

        ch.set_balance(-128);
        assert_eq!(ch.balance(), -127);
        assert_eq!(ch.gains().right, 0);
    }

    #[test]
    fn test_mix_applies_gains() {
        let mut ch = channel(vec![1000, 1000, 1000, 1000], 255, 127);
        let mut dst = [0i16; 4];
        assert_eq!(ch.mix(&mut dst), 2);
        assert_eq!(dst, [0, 1000, 0, 1000]);
    }

    #[test]
    fn test_staged_frames_keep_channel_active() {
        let mut ch = channel(vec![1; 10], 255, 0);
        let mut dst = [0i16; 4];
        assert_eq!(ch.mix(&mut dst), 2);
        assert_eq!(ch.state(), ChannelState::Active);

        let mut dst = [0i16; 8];
        assert_eq!(ch.mix(&mut dst), 3);
        assert_eq!(ch.state(), ChannelState::Exhausted);
    }

    #[test]
    fn test_resampled_tail_is_flushed_before_exhaustion() {
        let source = BufferSource::mono(vec![0, 1000, 2000], 22050).unwrap();
        let mut ch = Channel::new(Box::new(source), 44100, 255, 0);

        let mut dst = [0i16; 8];
        assert_eq!(ch.mix(&mut dst), 4);
        assert_eq!(ch.state(), ChannelState::Active);

        let mut dst = [0i16; 8];
        assert_eq!(ch.mix(&mut dst), 2);
        assert_eq!(&dst[..4], &[2000, 2000, 2000, 2000]);
        assert_eq!(ch.state(), ChannelState::Exhausted);
    }

    #[test]
    fn test_state_follows_source() {
        let mut ch = channel(vec![1, 1], 255, 0);
        assert_eq!(ch.state(), ChannelState::Active);
        let mut dst = [0i16; 8];
        ch.mix(&mut dst);
        assert_eq!(ch.state(), ChannelState::Exhausted);
    }
}
