//! Decoded audio sources
//!
//! A source produces interleaved signed 16-bit PCM on demand. The mixer never
//! decodes anything itself: it pulls from sources through a rate converter on
//! the audio thread, so `read_samples` must not block.
//!
//! Sources report two different "no samples" conditions:
//!
//! - **end of data**: nothing available right now (a streaming producer is
//!   behind). The channel is skipped for this tick and kept.
//! - **end of stream**: permanently exhausted. The channel is removed by the
//!   next mix pass.

mod buffer;
mod error;
mod queue;
mod wav;

pub use buffer::BufferSource;
pub use error::{SourceError, SourceResult};
pub use queue::{queued_source, QueuedSource, SourceFeeder};
pub use wav::{load_wav, read_wav};

/// A pull-based stream of interleaved i16 PCM
pub trait AudioSource: Send {
    /// Fill `buf` with interleaved samples, returning how many were written
    ///
    /// Implementations only ever write whole frames, so the return value is a
    /// multiple of [`channel_count`](Self::channel_count). Returning fewer
    /// samples than requested is not an error; the caller checks
    /// [`end_of_data`](Self::end_of_data) and retries on a later tick.
    fn read_samples(&mut self, buf: &mut [i16]) -> usize;

    /// Native sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Interleaved channel count (1 or 2)
    fn channel_count(&self) -> u16;

    /// No samples are available right now
    fn end_of_data(&self) -> bool;

    /// No samples will ever be available again
    ///
    /// Defaults to [`end_of_data`](Self::end_of_data), which is right for any
    /// source whose whole content is known up front.
    fn end_of_stream(&self) -> bool {
        self.end_of_data()
    }

    /// Whether samples come in left/right pairs
    fn is_stereo(&self) -> bool {
        self.channel_count() == 2
    }
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn read_samples(&mut self, buf: &mut [i16]) -> usize {
        (**self).read_samples(buf)
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn channel_count(&self) -> u16 {
        (**self).channel_count()
    }

    fn end_of_data(&self) -> bool {
        (**self).end_of_data()
    }

    fn end_of_stream(&self) -> bool {
        (**self).end_of_stream()
    }
}

/// Check that a source layout is one the converters can handle
pub(crate) fn validate_layout(sample_rate: u32, channels: u16) -> SourceResult<()> {
    if sample_rate == 0 {
        return Err(SourceError::InvalidSampleRate(sample_rate));
    }
    if !(1..=2).contains(&channels) {
        return Err(SourceError::UnsupportedChannels(channels));
    }
    Ok(())
}
