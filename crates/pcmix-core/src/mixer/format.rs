//! Conversion from the int16 intermediate to the device sample format
//!
//! Every channel is mixed into one interleaved stereo `i16` buffer. Once per
//! pass that buffer is written into the device's byte buffer in whatever
//! representation the device negotiated. All formats are native-endian.

/// Sample representation the output device negotiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Signed 16-bit, written as-is
    I16,
    /// 32-bit float, `sample / 32768` clamped to [-1, 1]
    F32,
    /// Signed 32-bit, the 16-bit value shifted into the high half
    I32,
    /// Anything else: the mixer outputs silence
    Unsupported(cpal::SampleFormat),
}

impl From<cpal::SampleFormat> for OutputFormat {
    fn from(format: cpal::SampleFormat) -> Self {
        match format {
            cpal::SampleFormat::I16 => OutputFormat::I16,
            cpal::SampleFormat::F32 => OutputFormat::F32,
            cpal::SampleFormat::I32 => OutputFormat::I32,
            other => OutputFormat::Unsupported(other),
        }
    }
}

impl OutputFormat {
    /// Bytes per sample in the device buffer
    pub fn sample_size(&self) -> usize {
        match self {
            OutputFormat::I16 => 2,
            OutputFormat::F32 | OutputFormat::I32 => 4,
            OutputFormat::Unsupported(format) => format.sample_size(),
        }
    }

    /// Bytes per interleaved stereo frame
    pub fn frame_size(&self) -> usize {
        self.sample_size() * 2
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, OutputFormat::Unsupported(_))
    }

    /// Write `mix` into `out`, one device sample per intermediate sample
    ///
    /// Writes `min(mix.len(), out.len() / sample_size)` samples and returns
    /// that count. Unsupported formats write nothing and return 0; the caller
    /// has already zero-filled `out`.
    pub fn write(&self, mix: &[i16], out: &mut [u8]) -> usize {
        match self {
            OutputFormat::I16 => write_samples(mix, out, |s| s.to_ne_bytes()),
            OutputFormat::F32 => write_samples(mix, out, |s| i16_to_f32(s).to_ne_bytes()),
            OutputFormat::I32 => write_samples(mix, out, |s| i16_to_i32(s).to_ne_bytes()),
            OutputFormat::Unsupported(_) => 0,
        }
    }
}

/// Normalize to [-1.0, 1.0]
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    (sample as f32 / 32768.0).clamp(-1.0, 1.0)
}

/// Move into the high 16 bits
#[inline]
pub fn i16_to_i32(sample: i16) -> i32 {
    (sample as i32) << 16
}

#[inline]
fn write_samples<const N: usize>(mix: &[i16], out: &mut [u8], encode: impl Fn(i16) -> [u8; N]) -> usize {
    let mut written = 0;
    for (dst, &sample) in out.chunks_exact_mut(N).zip(mix) {
        dst.copy_from_slice(&encode(sample));
        written += 1;
    }
    written
}
