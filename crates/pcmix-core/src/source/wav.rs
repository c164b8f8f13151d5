//! WAV file sources (via hound)
//!
//! Decodes the whole file up front into a [`BufferSource`]. Integer WAVs of
//! 8, 16, 24 or 32 bits and 32-bit float WAVs are accepted and converted to
//! signed 16-bit; mono and stereo only.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use super::{validate_layout, AudioSource, BufferSource, SourceError, SourceResult};

/// Load a WAV file from disk
pub fn load_wav(path: impl AsRef<Path>) -> SourceResult<BufferSource> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let source = decode(reader)?;
    log::info!(
        "Loaded {:?}: {} frames, {}Hz, {} channel(s)",
        path,
        source.len_frames(),
        source.sample_rate(),
        source.channel_count()
    );
    Ok(source)
}

/// Decode WAV data from any reader
pub fn read_wav<R: Read>(reader: R) -> SourceResult<BufferSource> {
    decode(WavReader::new(reader)?)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> SourceResult<BufferSource> {
    let spec = reader.spec();
    validate_layout(spec.sample_rate, spec.channels)?;

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.samples::<i16>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 24 | 32)) => {
            let shift = bits as i32 - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| scale_int(v, shift)))
                .collect::<Result<_, _>>()?
        }
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(float_to_i16))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits) => {
            return Err(SourceError::UnsupportedEncoding { bits, kind: "integer" })
        }
        (SampleFormat::Float, bits) => {
            return Err(SourceError::UnsupportedEncoding { bits, kind: "float" })
        }
    };

    BufferSource::new(samples, spec.sample_rate, spec.channels)
}

/// Bring an integer sample of arbitrary width to 16 bits
#[inline]
fn scale_int(value: i32, shift: i32) -> i16 {
    if shift >= 0 {
        (value >> shift) as i16
    } else {
        (value << -shift) as i16
    }
}

#[inline]
fn float_to_i16(value: f32) -> i16 {
    (value * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
