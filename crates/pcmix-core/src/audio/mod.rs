//! Audio output for pcmix
//!
//! Everything between the mixer and the speakers:
//! - **Configuration**: what to ask the device for ([`AudioConfig`])
//! - **Devices**: enumeration and lookup across cpal hosts
//! - **Backends**: [`CpalDevice`] for hardware, [`ManualDevice`] for offline
//!   rendering and tests
//!
//! # Example Usage
//!
//! ```ignore
//! use pcmix_core::audio::{AudioConfig, CpalDevice};
//! use pcmix_core::mixer::Mixer;
//!
//! let config = AudioConfig::default();
//! let mut device = CpalDevice::open(config.device.as_ref())?;
//! let mixer = Mixer::new();
//! mixer.init(&mut device, &config)?;
//!
//! let handle = mixer.play(source);
//! mixer.set_volume(handle, 128);
//! ```

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;
mod manual;

pub use backend::{OutputDevice, OutputSpec, RenderFn};
pub use config::{
    AudioConfig, DeviceId, RequestedFormat, StreamRequest, DEFAULT_BUFFER_FRAMES,
    DEFAULT_SAMPLE_RATE, MAX_BUFFER_FRAMES, MIN_BUFFER_FRAMES,
};
pub use cpal_backend::CpalDevice;
pub use device::{find_device_by_id, get_default_device, get_output_devices, AudioDevice};
pub use error::{AudioError, AudioResult};
pub use manual::ManualDevice;
