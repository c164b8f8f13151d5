//! Audio output configuration
//!
//! Describes what the mixer asks the output device for. The device may
//! renegotiate sample rate and format; the channel count must stay stereo.

use serde::{Deserialize, Serialize};

use crate::types::OUTPUT_CHANNELS;

/// Default sample rate requested from the device
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default buffer size requested from the device (frames)
///
/// 4096 frames @ 44.1kHz = ~93ms per callback. Sources in this player are
/// decoded video soundtracks, so latency matters far less than never
/// underrunning.
pub const DEFAULT_BUFFER_FRAMES: u32 = 4096;

/// Smallest and largest buffer sizes accepted from configuration (frames)
pub const MIN_BUFFER_FRAMES: u32 = 64;
pub const MAX_BUFFER_FRAMES: u32 = 16384;

/// Sample format to request from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedFormat {
    #[default]
    I16,
    F32,
    I32,
}

impl From<RequestedFormat> for cpal::SampleFormat {
    fn from(format: RequestedFormat) -> Self {
        match format {
            RequestedFormat::I16 => cpal::SampleFormat::I16,
            RequestedFormat::F32 => cpal::SampleFormat::F32,
            RequestedFormat::I32 => cpal::SampleFormat::I32,
        }
    }
}

/// Audio device identifier
///
/// Includes both the device name and the host backend (ALSA, JACK, ...)
/// so devices with the same name on different hosts can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the system
    pub name: String,
    /// Audio host identifier (e.g., "ALSA", "CoreAudio"); None = search all hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Display label including the host if known
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Output configuration for the mixer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device (None = system default)
    pub device: Option<DeviceId>,
    /// Requested sample rate in Hz
    pub sample_rate: u32,
    /// Requested buffer size in frames
    pub buffer_frames: u32,
    /// Requested sample format
    pub sample_format: RequestedFormat,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            sample_format: RequestedFormat::I16,
        }
    }
}

impl AudioConfig {
    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_frames = frames;
        self
    }

    pub fn with_sample_format(mut self, format: RequestedFormat) -> Self {
        self.sample_format = format;
        self
    }

    /// The stream the mixer asks the device for
    ///
    /// Always stereo; out-of-range buffer sizes are clamped.
    pub fn stream_request(&self) -> StreamRequest {
        let buffer_frames = self.buffer_frames.clamp(MIN_BUFFER_FRAMES, MAX_BUFFER_FRAMES);
        if buffer_frames != self.buffer_frames {
            log::warn!(
                "Buffer size {} frames out of range, using {}",
                self.buffer_frames,
                buffer_frames
            );
        }
        StreamRequest {
            sample_rate: if self.sample_rate == 0 {
                DEFAULT_SAMPLE_RATE
            } else {
                self.sample_rate
            },
            channels: OUTPUT_CHANNELS,
            sample_format: self.sample_format.into(),
            buffer_frames,
        }
    }
}

/// Parameters requested from an output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: cpal::SampleFormat,
    pub buffer_frames: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        AudioConfig::default().stream_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_is_cd_quality_stereo_i16() {
        let request = StreamRequest::default();
        assert_eq!(request.sample_rate, 44100);
        assert_eq!(request.channels, 2);
        assert_eq!(request.sample_format, cpal::SampleFormat::I16);
        assert_eq!(request.buffer_frames, 4096);
    }

    #[test]
    fn test_buffer_frames_clamped() {
        let request = AudioConfig::default().with_buffer_frames(8).stream_request();
        assert_eq!(request.buffer_frames, MIN_BUFFER_FRAMES);
    }

    #[test]
    fn test_yaml_partial_config_fills_defaults() {
        let config: AudioConfig =
            serde_yaml::from_str("sample_rate: 48000\nsample_format: f32\n").unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.sample_format, RequestedFormat::F32);
        assert_eq!(config.buffer_frames, DEFAULT_BUFFER_FRAMES);
        assert!(config.device.is_none());
    }

    #[test]
    fn test_device_label() {
        assert_eq!(DeviceId::with_host("hw:0,0", "ALSA").display_label(), "[ALSA] hw:0,0");
        assert_eq!(DeviceId::new("Speakers").display_label(), "Speakers");
    }
}
