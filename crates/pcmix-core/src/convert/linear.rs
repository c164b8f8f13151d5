//! Linear-interpolating converter
//!
//! Tracks the output position between the two most recent input frames as a
//! 16.16 fixed-point fraction. Each output frame advances the position by
//! `source_rate / output_rate`; whenever it crosses a whole frame the next
//! input frame is pulled in.
//!
//! The last input frame only becomes `cur` when there is nothing after it to
//! interpolate towards. Once the source reports end of stream the converter
//! repeats that frame once, so it reaches the output and is held for one
//! input interval. A clip of `n` frames therefore yields about
//! `n * output_rate / source_rate` frames.

use super::{blend_frame, InputBuffer, RateConverter};
use crate::source::AudioSource;

const FRAC_BITS: u32 = 16;
const FRAC_ONE: u32 = 1 << FRAC_BITS;

pub struct LinearRateConverter {
    input: InputBuffer,
    /// Input frames advanced per output frame (16.16)
    step: u32,
    /// Position past `prev` (16.16); at least `FRAC_ONE` means more input is needed
    position: u32,
    prev: [i16; 2],
    cur: [i16; 2],
    /// `cur` came from the source and has not been flushed at end of stream
    tail: bool,
}

impl LinearRateConverter {
    pub fn new(source_rate: u32, output_rate: u32, stereo: bool) -> Self {
        let step = ((source_rate as u64) << FRAC_BITS) / output_rate.max(1) as u64;
        Self {
            input: InputBuffer::new(stereo),
            step: step.clamp(1, u32::MAX as u64 / 2) as u32,
            // Two frames must be loaded before the first output frame
            position: 2 * FRAC_ONE,
            prev: [0; 2],
            cur: [0; 2],
            tail: false,
        }
    }

    #[inline]
    fn interpolate(&self, side: usize) -> i16 {
        let prev = self.prev[side] as i64;
        let cur = self.cur[side] as i64;
        (prev + (((cur - prev) * self.position as i64) >> FRAC_BITS)) as i16
    }
}

impl RateConverter for LinearRateConverter {
    fn flow(
        &mut self,
        source: &mut dyn AudioSource,
        dst: &mut [i16],
        left_gain: u16,
        right_gain: u16,
    ) -> usize {
        let mut produced = 0;
        for frame in dst.chunks_exact_mut(2) {
            while self.position >= FRAC_ONE {
                let next = match self.input.next_frame(source) {
                    Some(input) => {
                        self.tail = true;
                        input
                    }
                    None if self.tail && source.end_of_stream() => {
                        self.tail = false;
                        self.cur
                    }
                    None => return produced,
                };
                self.prev = self.cur;
                self.cur = next;
                self.position -= FRAC_ONE;
            }

            let input = [self.interpolate(0), self.interpolate(1)];
            blend_frame(frame, input, left_gain, right_gain);
            self.position += self.step;
            produced += 1;
        }
        produced
    }

    fn pending_frames(&self) -> usize {
        self.input.buffered_frames()
    }

    fn held_frames(&self) -> usize {
        self.tail as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{queued_source, BufferSource};

    #[test]
    fn test_upsample_by_two_interpolates_midpoints() {
        let mut source = BufferSource::mono(vec![0, 1000, 2000], 22050).unwrap();
        let mut converter = LinearRateConverter::new(22050, 44100, false);
        let mut dst = [0i16; 8];
        let produced = converter.flow(&mut source, &mut dst, 256, 256);

        assert_eq!(produced, 4);
        assert_eq!(dst, [0, 0, 500, 500, 1000, 1000, 1500, 1500]);
    }

    #[test]
    fn test_last_frame_reaches_output_at_end_of_stream() {
        let mut source = BufferSource::mono(vec![0, 1000, 2000], 22050).unwrap();
        let mut converter = LinearRateConverter::new(22050, 44100, false);
        let mut dst = [0i16; 16];
        let produced = converter.flow(&mut source, &mut dst, 256, 256);

        assert_eq!(produced, 6);
        assert_eq!(
            &dst[..12],
            &[0, 0, 500, 500, 1000, 1000, 1500, 1500, 2000, 2000, 2000, 2000]
        );
        assert_eq!(converter.held_frames(), 0);
        assert_eq!(converter.flow(&mut source, &mut dst, 256, 256), 0);
    }

    #[test]
    fn test_starved_source_keeps_last_frame_held() {
        let (mut feeder, mut source) = queued_source(22050, 1, 16).unwrap();
        let mut converter = LinearRateConverter::new(22050, 44100, false);
        let mut dst = [0i16; 16];

        feeder.push_samples(&[0, 1000]);
        assert_eq!(converter.flow(&mut source, &mut dst, 256, 256), 2);
        // More may still arrive, so 1000 is not repeated yet
        assert_eq!(converter.held_frames(), 1);

        feeder.finish();
        dst = [0; 16];
        assert_eq!(converter.flow(&mut source, &mut dst, 256, 256), 2);
        assert_eq!(&dst[..4], &[1000, 1000, 1000, 1000]);
        assert_eq!(converter.held_frames(), 0);
    }

    #[test]
    fn test_downsample_by_two_skips_frames() {
        let samples: Vec<i16> = (0..8).flat_map(|i| [i * 100, -i * 100]).collect();
        let mut source = BufferSource::stereo(samples, 88200).unwrap();
        let mut converter = LinearRateConverter::new(88200, 44100, true);
        let mut dst = [0i16; 6];
        assert_eq!(converter.flow(&mut source, &mut dst, 256, 256), 3);
        assert_eq!(dst, [0, 0, 200, -200, 400, -400]);
    }

    #[test]
    fn test_output_count_tracks_rate_ratio() {
        let mut source = BufferSource::mono(vec![100; 22050], 22050).unwrap();
        let mut converter = LinearRateConverter::new(22050, 44100, false);
        let mut dst = vec![0i16; 2 * 50_000];
        let produced = converter.flow(&mut source, &mut dst, 256, 256);
        // Two output frames per input frame, the last one held to the end
        assert_eq!(produced, 44_100);
        assert!(dst[..produced * 2].iter().all(|&s| s == 100));
    }

    #[test]
    fn test_gains_apply_per_side() {
        let mut source = BufferSource::mono(vec![1000, 1000, 1000], 11025).unwrap();
        let mut converter = LinearRateConverter::new(11025, 22050, false);
        let mut dst = [0i16; 4];
        converter.flow(&mut source, &mut dst, 256, 0);
        assert_eq!(dst, [1000, 0, 1000, 0]);
    }
}
