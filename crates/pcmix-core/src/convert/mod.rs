//! Rate conversion into the mixer's int16 stereo intermediate
//!
//! A converter pulls frames from a source at the source's native rate and
//! writes frames at the output rate into an interleaved stereo `i16` buffer.
//! Output is **added** to whatever the buffer already holds, with saturation,
//! after scaling each side by its channel gain:
//!
//! ```text
//! dst[l] = sat(dst[l] + in_l * left_gain  / MAX_MIXER_VOLUME)
//! dst[r] = sat(dst[r] + in_r * right_gain / MAX_MIXER_VOLUME)
//! ```
//!
//! Mono sources feed the same sample to both sides.

mod copy;
mod linear;

pub use copy::CopyRateConverter;
pub use linear::LinearRateConverter;

use crate::source::AudioSource;
use crate::types::MAX_MIXER_VOLUME;

/// Frames staged from the source per refill
const INPUT_FRAMES: usize = 512;

/// Resamples one source into the shared intermediate buffer
pub trait RateConverter: Send {
    /// Mix up to `dst.len() / 2` frames from `source` into `dst`
    ///
    /// Returns the number of frames produced. Fewer than requested means the
    /// source ran dry; the rest of `dst` is left untouched and conversion
    /// resumes where it stopped on the next call.
    fn flow(
        &mut self,
        source: &mut dyn AudioSource,
        dst: &mut [i16],
        left_gain: u16,
        right_gain: u16,
    ) -> usize;

    /// Input frames already pulled from the source but not yet consumed
    ///
    /// A channel is only starved or exhausted once these are drained too.
    fn pending_frames(&self) -> usize;

    /// Frames kept back until the source reaches end of stream
    ///
    /// These are flushed by `flow` once the source is finished; a merely
    /// starved source does not release them.
    fn held_frames(&self) -> usize {
        0
    }
}

/// Pick a converter for the given rates
pub fn make_rate_converter(source_rate: u32, output_rate: u32, stereo: bool) -> Box<dyn RateConverter> {
    if source_rate == output_rate {
        Box::new(CopyRateConverter::new(stereo))
    } else {
        log::debug!(
            "Resampling {}Hz -> {}Hz ({})",
            source_rate,
            output_rate,
            if stereo { "stereo" } else { "mono" }
        );
        Box::new(LinearRateConverter::new(source_rate, output_rate, stereo))
    }
}

/// Apply a channel gain to one sample
#[inline]
pub(crate) fn apply_gain(sample: i16, gain: u16) -> i32 {
    sample as i32 * gain as i32 / MAX_MIXER_VOLUME as i32
}

/// Saturating accumulate into an int16 sample
#[inline]
pub(crate) fn clamped_add(acc: &mut i16, value: i32) {
    *acc = (*acc as i32 + value).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
}

/// Blend one gain-scaled stereo frame into `frame`
#[inline]
pub(crate) fn blend_frame(frame: &mut [i16], input: [i16; 2], left_gain: u16, right_gain: u16) {
    clamped_add(&mut frame[0], apply_gain(input[0], left_gain));
    clamped_add(&mut frame[1], apply_gain(input[1], right_gain));
}

/// Staging buffer between a source and a converter
///
/// Reads from the source in blocks and hands out one stereo frame at a time,
/// duplicating mono samples.
pub(crate) struct InputBuffer {
    samples: Vec<i16>,
    position: usize,
    len: usize,
    stereo: bool,
}

impl InputBuffer {
    pub(crate) fn new(stereo: bool) -> Self {
        let channels = if stereo { 2 } else { 1 };
        Self {
            samples: vec![0; INPUT_FRAMES * channels],
            position: 0,
            len: 0,
            stereo,
        }
    }

    /// Frames staged but not yet handed out
    #[inline]
    pub(crate) fn buffered_frames(&self) -> usize {
        let channels = if self.stereo { 2 } else { 1 };
        self.len.saturating_sub(self.position) / channels
    }

    /// Next frame, or `None` if the source has nothing right now
    #[inline]
    pub(crate) fn next_frame(&mut self, source: &mut dyn AudioSource) -> Option<[i16; 2]> {
        if self.position >= self.len {
            self.len = source.read_samples(&mut self.samples);
            self.position = 0;
            if self.len == 0 {
                return None;
            }
        }
        let left = self.samples[self.position];
        let frame = if self.stereo {
            // Sources only ever hand out whole frames
            let right = self.samples.get(self.position + 1).copied().unwrap_or(left);
            self.position += 2;
            [left, right]
        } else {
            self.position += 1;
            [left, left]
        };
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    #[test]
    fn test_apply_gain_unity_and_half() {
        assert_eq!(apply_gain(1000, MAX_MIXER_VOLUME), 1000);
        assert_eq!(apply_gain(1000, 128), 500);
        assert_eq!(apply_gain(-1001, 128), -500);
        assert_eq!(apply_gain(i16::MIN, 0), 0);
    }

    #[test]
    fn test_clamped_add_saturates() {
        let mut acc = 30000i16;
        clamped_add(&mut acc, 10000);
        assert_eq!(acc, i16::MAX);
        let mut acc = -30000i16;
        clamped_add(&mut acc, -10000);
        assert_eq!(acc, i16::MIN);
    }

    #[test]
    fn test_input_buffer_duplicates_mono() {
        let mut source = BufferSource::mono(vec![5, 6], 8000).unwrap();
        let mut input = InputBuffer::new(false);
        assert_eq!(input.next_frame(&mut source), Some([5, 5]));
        assert_eq!(input.buffered_frames(), 1);
        assert_eq!(input.next_frame(&mut source), Some([6, 6]));
        assert_eq!(input.buffered_frames(), 0);
        assert_eq!(input.next_frame(&mut source), None);
    }

    #[test]
    fn test_make_rate_converter_picks_copy_for_equal_rates() {
        let mut source = BufferSource::stereo(vec![100, 200, 300, 400], 44100).unwrap();
        let mut converter = make_rate_converter(44100, 44100, true);
        let mut dst = [0i16; 4];
        assert_eq!(converter.flow(&mut source, &mut dst, 256, 256), 2);
        assert_eq!(dst, [100, 200, 300, 400]);
    }
}
