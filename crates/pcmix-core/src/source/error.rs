//! Audio source error types

use thiserror::Error;

/// Errors that can occur while constructing an audio source
#[derive(Error, Debug)]
pub enum SourceError {
    /// WAV container could not be read
    #[error("Failed to read WAV data: {0}")]
    Wav(#[from] hound::Error),

    /// Channel layouts other than mono or stereo
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    /// Sample rate of zero
    #[error("Invalid sample rate: {0}Hz")]
    InvalidSampleRate(u32),

    /// Sample encoding the decoder does not handle
    #[error("Unsupported sample encoding: {bits}-bit {kind}")]
    UnsupportedEncoding { bits: u16, kind: &'static str },

    /// Interleaved data whose length is not a whole number of frames
    #[error("Sample data length {len} is not a multiple of {channels} channels")]
    PartialFrame { len: usize, channels: u16 },
}

/// Result type for source construction
pub type SourceResult<T> = Result<T, SourceError>;
