//! CPAL output device
//!
//! Drives the mixer from a hardware output stream. The stream is built with
//! the raw (untyped) cpal API so the negotiated sample format is whatever the
//! device prefers; the render callback converts the mix into it.
//!
//! ```text
//! ┌──────────────────┐   play / stop /    ┌─────────────────────┐
//! │  Caller Threads  │── set_volume ─────►│  Mixer state        │
//! │                  │                    │  (one mutex)        │
//! └──────────────────┘                    └──────────┬──────────┘
//!                                                    │ lock per period
//!                                         ┌──────────▼──────────┐
//!                                         │  CPAL Audio Thread  │
//!                                         │  render(&mut [u8])  │
//!                                         └─────────────────────┘
//! ```

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    BufferSize as CpalBufferSize, SampleFormat, SampleRate, Stream, StreamConfig,
    SupportedBufferSize, SupportedStreamConfig, SupportedStreamConfigRange,
};

use super::backend::{OutputDevice, OutputSpec, RenderFn};
use super::config::{DeviceId, StreamRequest};
use super::device::{find_device_by_id, get_default_device};
use super::error::{AudioError, AudioResult};
use crate::mixer::OutputFormat;

/// Hardware output through cpal
///
/// Owns the stream once started; dropping the device stops playback.
pub struct CpalDevice {
    device: cpal::Device,
    negotiated: Option<(StreamConfig, SampleFormat)>,
    stream: Option<Stream>,
}

impl CpalDevice {
    /// Open a device by ID, or the system default
    pub fn open(id: Option<&DeviceId>) -> AudioResult<Self> {
        let device = match id {
            Some(id) => find_device_by_id(id)?,
            None => get_default_device()?,
        };
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Opened audio output device: {}", name);
        Ok(Self {
            device,
            negotiated: None,
            stream: None,
        })
    }

    /// Device name as reported by the system
    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Whether the output stream is running
    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

impl OutputDevice for CpalDevice {
    fn negotiate(&mut self, request: &StreamRequest) -> AudioResult<OutputSpec> {
        let supported = get_output_config(&self.device, request)?;
        let sample_format = supported.sample_format();
        let buffer_frames = fit_buffer_size(supported.buffer_size(), request.buffer_frames);

        let mut stream_config = supported.config();
        stream_config.buffer_size = CpalBufferSize::Fixed(buffer_frames);

        let spec = OutputSpec {
            sample_rate: stream_config.sample_rate.0,
            format: sample_format.into(),
            channels: stream_config.channels,
            buffer_frames,
        };
        log::info!(
            "Negotiated {}Hz {:?} x{} channels, {} frames ({:.1}ms)",
            spec.sample_rate,
            sample_format,
            spec.channels,
            spec.buffer_frames,
            spec.latency_ms()
        );

        self.negotiated = Some((stream_config, sample_format));
        Ok(spec)
    }

    fn start(&mut self, mut render: RenderFn) -> AudioResult<()> {
        if self.stream.is_some() {
            return Err(AudioError::NotNegotiated("already started"));
        }
        let (config, sample_format) = self
            .negotiated
            .clone()
            .ok_or(AudioError::NotNegotiated("start before negotiate"))?;

        let stream = self
            .device
            .build_output_stream_raw(
                &config,
                sample_format,
                move |data: &mut cpal::Data, _info: &cpal::OutputCallbackInfo| {
                    render(data.bytes_mut());
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

        log::info!("Audio output stream started");
        self.stream = Some(stream);
        Ok(())
    }
}

/// Pick the device configuration closest to the request
///
/// Preference order: requested format, channel count and rate; then a format
/// the mixer can write with the requested channel count; then any format
/// with that channel count (the mixer renders silence into it); then the
/// device default (which may have the wrong channel count, rejected by the
/// mixer).
fn get_output_config(
    device: &cpal::Device,
    request: &StreamRequest,
) -> AudioResult<SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    let Some(best_config) = pick_config(&supported_configs, request) else {
        log::warn!(
            "No {}-channel output configuration, using device default",
            request.channels
        );
        return device
            .default_output_config()
            .map_err(|e| AudioError::ConfigError(e.to_string()));
    };

    let sample_rate = if rate_in_range(best_config, request.sample_rate) {
        SampleRate(request.sample_rate)
    } else {
        // Device doesn't support requested rate - use max supported rate
        let fallback = best_config.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz (sources will be resampled)",
            request.sample_rate,
            fallback.0
        );
        fallback
    };

    if best_config.sample_format() != request.sample_format {
        log::info!(
            "Audio device doesn't offer {:?}, using {:?}",
            request.sample_format,
            best_config.sample_format()
        );
    }

    Ok(best_config.clone().with_sample_rate(sample_rate))
}

fn rate_in_range(config: &SupportedStreamConfigRange, sample_rate: u32) -> bool {
    sample_rate >= config.min_sample_rate().0 && sample_rate <= config.max_sample_rate().0
}

/// Best match for `request` among the device's configuration ranges
fn pick_config<'a>(
    configs: &'a [SupportedStreamConfigRange],
    request: &StreamRequest,
) -> Option<&'a SupportedStreamConfigRange> {
    let stereo = || configs.iter().filter(|c| c.channels() == request.channels);
    let writable = |c: &&SupportedStreamConfigRange| {
        OutputFormat::from(c.sample_format()).is_supported()
    };
    let at_rate = |c: &&SupportedStreamConfigRange| rate_in_range(c, request.sample_rate);

    stereo()
        .filter(|c| c.sample_format() == request.sample_format)
        .find(at_rate)
        // Let the format renegotiate, but only to one the mixer can write
        .or_else(|| stereo().filter(writable).find(at_rate))
        .or_else(|| stereo().find(writable))
        .or_else(|| stereo().next())
}

/// Clamp the requested buffer size into what the device reports
fn fit_buffer_size(supported: &SupportedBufferSize, requested: u32) -> u32 {
    match *supported {
        SupportedBufferSize::Range { min, max } => {
            let frames = requested.max(min).min(max);
            if frames != requested {
                log::debug!(
                    "Buffer size {} frames outside device range {}..={}, using {}",
                    requested,
                    min,
                    max,
                    frames
                );
            }
            frames
        }
        SupportedBufferSize::Unknown => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_buffer_size() {
        let range = SupportedBufferSize::Range { min: 128, max: 2048 };
        assert_eq!(fit_buffer_size(&range, 4096), 2048);
        assert_eq!(fit_buffer_size(&range, 64), 128);
        assert_eq!(fit_buffer_size(&range, 512), 512);
        assert_eq!(fit_buffer_size(&SupportedBufferSize::Unknown, 4096), 4096);
    }

    fn range(format: SampleFormat, channels: u16, min: u32, max: u32) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    fn request(format: SampleFormat) -> StreamRequest {
        StreamRequest {
            sample_format: format,
            ..StreamRequest::default()
        }
    }

    #[test]
    fn test_pick_config_exact_match() {
        let configs = [
            range(SampleFormat::F32, 2, 8000, 192000),
            range(SampleFormat::I16, 2, 8000, 192000),
        ];
        let picked = pick_config(&configs, &request(SampleFormat::I16)).unwrap();
        assert_eq!(picked.sample_format(), SampleFormat::I16);
    }

    #[test]
    fn test_pick_config_prefers_writable_formats() {
        // Listed first, but the mixer cannot write U16 or F64
        let configs = [
            range(SampleFormat::U16, 2, 8000, 192000),
            range(SampleFormat::F64, 2, 8000, 192000),
            range(SampleFormat::F32, 2, 8000, 192000),
        ];
        let picked = pick_config(&configs, &request(SampleFormat::I16)).unwrap();
        assert_eq!(picked.sample_format(), SampleFormat::F32);

        // Writable at another rate still beats unwritable at the requested one
        let configs = [
            range(SampleFormat::I24, 2, 8000, 192000),
            range(SampleFormat::I32, 2, 96000, 96000),
        ];
        let picked = pick_config(&configs, &request(SampleFormat::I16)).unwrap();
        assert_eq!(picked.sample_format(), SampleFormat::I32);
    }

    #[test]
    fn test_pick_config_last_resorts() {
        let configs = [
            range(SampleFormat::I16, 6, 8000, 192000),
            range(SampleFormat::U16, 2, 8000, 192000),
        ];
        let picked = pick_config(&configs, &request(SampleFormat::I16)).unwrap();
        assert_eq!((picked.sample_format(), picked.channels()), (SampleFormat::U16, 2));

        let configs = [range(SampleFormat::I16, 1, 8000, 192000)];
        assert!(pick_config(&configs, &request(SampleFormat::I16)).is_none());
    }

    #[test]
    fn test_negotiate_default_device() {
        // Skips on machines without audio hardware
        let Ok(mut device) = CpalDevice::open(None) else {
            println!("No default output device");
            return;
        };
        match device.negotiate(&StreamRequest::default()) {
            Ok(spec) => {
                assert!(spec.sample_rate > 0);
                assert!(spec.buffer_frames > 0);
                assert!(!device.is_running());
            }
            Err(e) => println!("Negotiation failed: {}", e),
        }
    }

    #[test]
    fn test_start_requires_negotiation() {
        let Ok(mut device) = CpalDevice::open(None) else {
            return;
        };
        assert!(matches!(
            device.start(Box::new(|out| out.fill(0))),
            Err(AudioError::NotNegotiated(_))
        ));
    }
}
