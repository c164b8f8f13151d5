//! Output device trait
//!
//! An output device owns the real-time clock. The mixer negotiates a stream
//! with it once, then hands it a render callback which the device invokes once
//! per buffer period with the raw bytes to fill:
//!
//! - [`CpalDevice`](super::CpalDevice): hardware output through cpal
//! - [`ManualDevice`](super::ManualDevice): clocked by the caller (offline
//!   rendering, tests)

use crate::mixer::OutputFormat;

use super::config::StreamRequest;
use super::error::AudioResult;

/// Render callback handed to a device
///
/// Receives the device buffer as bytes, interleaved in the negotiated format.
/// Never fails and never blocks for longer than one mix pass.
pub type RenderFn = Box<dyn FnMut(&mut [u8]) + Send + 'static>;

/// What the device actually agreed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Sample representation of the device buffer
    pub format: OutputFormat,
    /// Interleaved channel count (the mixer only accepts 2)
    pub channels: u16,
    /// Buffer size in frames as negotiated
    pub buffer_frames: u32,
}

impl OutputSpec {
    /// One-way output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_frames as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Bytes in one full device buffer
    pub fn buffer_bytes(&self) -> usize {
        self.buffer_frames as usize * self.channels as usize * self.format.sample_size()
    }
}

/// A device the mixer can drive
pub trait OutputDevice {
    /// Agree on stream parameters
    ///
    /// The device may change rate and format; channel count is checked by the
    /// caller.
    fn negotiate(&mut self, request: &StreamRequest) -> AudioResult<OutputSpec>;

    /// Begin invoking `render` from the device clock
    fn start(&mut self, render: RenderFn) -> AudioResult<()>;
}
