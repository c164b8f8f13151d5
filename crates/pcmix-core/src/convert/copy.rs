//! Pass-through converter for sources already at the output rate

use super::{blend_frame, InputBuffer, RateConverter};
use crate::source::AudioSource;

/// One input frame per output frame
pub struct CopyRateConverter {
    input: InputBuffer,
}

impl CopyRateConverter {
    pub fn new(stereo: bool) -> Self {
        Self {
            input: InputBuffer::new(stereo),
        }
    }
}

impl RateConverter for CopyRateConverter {
    fn flow(
        &mut self,
        source: &mut dyn AudioSource,
        dst: &mut [i16],
        left_gain: u16,
        right_gain: u16,
    ) -> usize {
        let mut produced = 0;
        for frame in dst.chunks_exact_mut(2) {
            let Some(input) = self.input.next_frame(source) else {
                break;
            };
            blend_frame(frame, input, left_gain, right_gain);
            produced += 1;
        }
        produced
    }

    fn pending_frames(&self) -> usize {
        self.input.buffered_frames()
    }
}
