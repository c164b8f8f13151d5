//! Streaming source fed from another thread
//!
//! A decoder thread owns the [`SourceFeeder`] and pushes PCM as it becomes
//! available; the mixer owns the [`QueuedSource`] and pulls from it on the
//! audio thread. The two halves share a lock-free SPSC ring buffer, so neither
//! side ever blocks the other.
//!
//! ```text
//! ┌────────────────┐  push_samples()  ┌──────────────┐  read_samples()  ┌──────────────┐
//! │ decoder thread │─────────────────►│ rtrb (i16)   │─────────────────►│ audio thread │
//! └────────────────┘                  └──────────────┘                  └──────────────┘
//! ```
//!
//! The queue reports end-of-data whenever the ring is empty. It reports
//! end-of-stream only after the feeder has been finished (or dropped) and the
//! remaining samples have been drained.

use super::{validate_layout, AudioSource, SourceResult};

/// Create a connected feeder/source pair
///
/// `capacity_frames` bounds how far the producer may run ahead of playback.
pub fn queued_source(
    sample_rate: u32,
    channels: u16,
    capacity_frames: usize,
) -> SourceResult<(SourceFeeder, QueuedSource)> {
    validate_layout(sample_rate, channels)?;
    let capacity = capacity_frames.max(1) * channels as usize;
    let (producer, consumer) = rtrb::RingBuffer::<i16>::new(capacity);
    log::debug!(
        "Queued source created: {}Hz, {} channel(s), {} frames of headroom",
        sample_rate,
        channels,
        capacity_frames
    );
    Ok((
        SourceFeeder { producer, channels },
        QueuedSource {
            consumer,
            sample_rate,
            channels,
        },
    ))
}

/// Producer half, owned by whoever decodes the audio
pub struct SourceFeeder {
    producer: rtrb::Producer<i16>,
    channels: u16,
}

impl SourceFeeder {
    /// Queue as many whole frames from `samples` as fit, returning how many
    /// samples were taken
    pub fn push_samples(&mut self, samples: &[i16]) -> usize {
        let channels = self.channels as usize;
        let n = (samples.len().min(self.producer.slots()) / channels) * channels;
        if n == 0 {
            return 0;
        }
        let Ok(mut chunk) = self.producer.write_chunk(n) else {
            return 0;
        };
        let (first, second) = chunk.as_mut_slices();
        let split = first.len();
        first.copy_from_slice(&samples[..split]);
        second.copy_from_slice(&samples[split..n]);
        chunk.commit_all();
        n
    }

    /// Free space in frames
    pub fn free_frames(&self) -> usize {
        self.producer.slots() / self.channels as usize
    }

    /// The playing side has been dropped (channel stopped or exhausted)
    pub fn is_closed(&self) -> bool {
        self.producer.is_abandoned()
    }

    /// Signal that no more samples will be queued
    ///
    /// Equivalent to dropping the feeder.
    pub fn finish(self) {}
}

/// Consumer half, handed to [`Mixer::play`](crate::mixer::Mixer::play)
pub struct QueuedSource {
    consumer: rtrb::Consumer<i16>,
    sample_rate: u32,
    channels: u16,
}

impl QueuedSource {
    /// Frames queued and not yet played
    pub fn queued_frames(&self) -> usize {
        self.consumer.slots() / self.channels as usize
    }
}

impl AudioSource for QueuedSource {
    fn read_samples(&mut self, buf: &mut [i16]) -> usize {
        let channels = self.channels as usize;
        let n = (buf.len().min(self.consumer.slots()) / channels) * channels;
        if n == 0 {
            return 0;
        }
        let Ok(chunk) = self.consumer.read_chunk(n) else {
            return 0;
        };
        let (first, second) = chunk.as_slices();
        let split = first.len();
        buf[..split].copy_from_slice(first);
        buf[split..n].copy_from_slice(second);
        chunk.commit_all();
        n
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn end_of_data(&self) -> bool {
        self.consumer.is_empty()
    }

    fn end_of_stream(&self) -> bool {
        self.consumer.is_abandoned() && self.consumer.is_empty()
    }
}
