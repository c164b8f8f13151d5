//! Caller-clocked output device
//!
//! Stands in for hardware when nothing should reach the speakers: offline
//! renders pull buffers as fast as they like, and tests pull them one tick at
//! a time. Offers can be narrowed to emulate devices that only do mono, a
//! fixed rate, or a fixed format.

use super::backend::{OutputDevice, OutputSpec, RenderFn};
use super::config::StreamRequest;
use super::error::{AudioError, AudioResult};

/// Output device whose clock is [`ManualDevice::pull`]
#[derive(Default)]
pub struct ManualDevice {
    channels: Option<u16>,
    sample_rate: Option<u32>,
    format: Option<cpal::SampleFormat>,
    spec: Option<OutputSpec>,
    render: Option<RenderFn>,
}

impl ManualDevice {
    /// A device that accepts whatever is requested
    pub fn new() -> Self {
        Self::default()
    }

    /// Only offer `channels` interleaved channels
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Only offer `rate` Hz
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Only offer `format`
    pub fn with_format(mut self, format: cpal::SampleFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// The negotiated spec, once negotiated
    pub fn spec(&self) -> Option<OutputSpec> {
        self.spec
    }

    pub fn is_started(&self) -> bool {
        self.render.is_some()
    }

    /// Run one device period into `out`
    ///
    /// Returns false (and zero-fills) if the device has not been started.
    pub fn pull(&mut self, out: &mut [u8]) -> bool {
        match self.render.as_mut() {
            Some(render) => {
                render(out);
                true
            }
            None => {
                out.fill(0);
                false
            }
        }
    }

    /// Run one period of `frames` frames and return the bytes
    pub fn pull_frames(&mut self, frames: usize) -> Vec<u8> {
        let frame_size = self
            .spec
            .map(|spec| spec.channels as usize * spec.format.sample_size())
            .unwrap_or(4);
        let mut out = vec![0u8; frames * frame_size];
        self.pull(&mut out);
        out
    }
}

impl OutputDevice for ManualDevice {
    fn negotiate(&mut self, request: &StreamRequest) -> AudioResult<OutputSpec> {
        let spec = OutputSpec {
            sample_rate: self.sample_rate.unwrap_or(request.sample_rate),
            format: self.format.unwrap_or(request.sample_format).into(),
            channels: self.channels.unwrap_or(request.channels),
            buffer_frames: request.buffer_frames,
        };
        self.spec = Some(spec);
        Ok(spec)
    }

    fn start(&mut self, render: RenderFn) -> AudioResult<()> {
        if self.spec.is_none() {
            return Err(AudioError::NotNegotiated("start before negotiate"));
        }
        if self.render.is_some() {
            return Err(AudioError::NotNegotiated("already started"));
        }
        self.render = Some(render);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::OutputFormat;

    #[test]
    fn test_negotiate_honours_offers() {
        let mut device = ManualDevice::new()
            .with_channels(1)
            .with_sample_rate(22050)
            .with_format(cpal::SampleFormat::F32);
        let spec = device.negotiate(&StreamRequest::default()).unwrap();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.format, OutputFormat::F32);
        assert_eq!(spec.buffer_frames, 4096);
    }

    #[test]
    fn test_pull_before_start_is_silent() {
        let mut device = ManualDevice::new();
        let mut out = [7u8; 8];
        assert!(!device.pull(&mut out));
        assert_eq!(out, [0; 8]);
    }

    #[test]
    fn test_start_requires_negotiation() {
        let mut device = ManualDevice::new();
        assert!(matches!(
            device.start(Box::new(|_| {})),
            Err(AudioError::NotNegotiated(_))
        ));

        device.negotiate(&StreamRequest::default()).unwrap();
        device.start(Box::new(|out| out.fill(1))).unwrap();
        assert!(device.is_started());
        assert_eq!(device.pull_frames(2), vec![1u8; 8]);
    }
}
