//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while opening or negotiating an output device
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio devices available
    #[error("No audio output devices found")]
    NoDevices,

    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Device not found
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to get device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Device came back with something other than two channels
    #[error("Device negotiated {channels} channel(s), stereo output is required")]
    NotStereo { channels: u16 },

    /// `start` called before `negotiate`, or twice
    #[error("Output device is not ready to start: {0}")]
    NotNegotiated(&'static str),

    /// `init` called on a mixer that already drives a device
    #[error("Mixer is already initialized")]
    AlreadyInitialized,
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
