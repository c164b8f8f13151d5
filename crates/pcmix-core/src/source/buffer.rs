//! In-memory PCM source

use super::{validate_layout, AudioSource, SourceError, SourceResult};

/// A fully decoded clip held in memory
///
/// End of data and end of stream coincide: once the buffer is drained it
/// never produces samples again.
#[derive(Debug, Clone)]
pub struct BufferSource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
    channels: u16,
}

impl BufferSource {
    /// Wrap interleaved samples
    ///
    /// Fails if the layout is not mono/stereo at a non-zero rate, or if the
    /// data does not hold a whole number of frames.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> SourceResult<Self> {
        validate_layout(sample_rate, channels)?;
        if samples.len() % channels as usize != 0 {
            return Err(SourceError::PartialFrame {
                len: samples.len(),
                channels,
            });
        }
        Ok(Self {
            samples,
            position: 0,
            sample_rate,
            channels,
        })
    }

    /// Mono clip
    pub fn mono(samples: Vec<i16>, sample_rate: u32) -> SourceResult<Self> {
        Self::new(samples, sample_rate, 1)
    }

    /// Interleaved stereo clip
    pub fn stereo(samples: Vec<i16>, sample_rate: u32) -> SourceResult<Self> {
        Self::new(samples, sample_rate, 2)
    }

    /// Frames not yet read
    pub fn remaining_frames(&self) -> usize {
        (self.samples.len() - self.position) / self.channels as usize
    }

    /// Total length in frames
    pub fn len_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Restart from the first frame
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl AudioSource for BufferSource {
    fn read_samples(&mut self, buf: &mut [i16]) -> usize {
        let channels = self.channels as usize;
        let available = self.samples.len() - self.position;
        let n = (buf.len().min(available) / channels) * channels;
        buf[..n].copy_from_slice(&self.samples[self.position..self.position + n]);
        self.position += n;
        n
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn end_of_data(&self) -> bool {
        self.position >= self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_whole_frames() {
        let mut src = BufferSource::stereo(vec![1, 2, 3, 4, 5, 6], 22050).unwrap();
        let mut buf = [0i16; 3];
        // Only one whole stereo frame fits in three slots
        assert_eq!(src.read_samples(&mut buf), 2);
        assert_eq!(&buf[..2], &[1, 2]);
        assert_eq!(src.remaining_frames(), 2);
    }

    #[test]
    fn test_drains_to_end_of_stream() {
        let mut src = BufferSource::mono(vec![10, 20], 8000).unwrap();
        assert!(!src.end_of_data());
        let mut buf = [0i16; 8];
        assert_eq!(src.read_samples(&mut buf), 2);
        assert!(src.end_of_data());
        assert!(src.end_of_stream());
        assert_eq!(src.read_samples(&mut buf), 0);

        src.rewind();
        assert!(!src.end_of_stream());
        assert_eq!(src.len_frames(), 2);
    }

    #[test]
    fn test_rejects_bad_layouts() {
        assert!(matches!(
            BufferSource::new(vec![0; 4], 0, 2),
            Err(SourceError::InvalidSampleRate(0))
        ));
        assert!(matches!(
            BufferSource::new(vec![0; 6], 44100, 6),
            Err(SourceError::UnsupportedChannels(6))
        ));
        assert!(matches!(
            BufferSource::stereo(vec![0; 3], 44100),
            Err(SourceError::PartialFrame { len: 3, channels: 2 })
        ));
    }
}
