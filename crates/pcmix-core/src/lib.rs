//! pcmix Core - real-time multi-channel PCM mixing
//!
//! Mixes any number of decoded PCM sources into one stereo output stream:
//!
//! - [`source`]: pull-based int16 sources (in-memory, streamed, WAV)
//! - [`convert`]: rate conversion with per-side gain into the int16 mix
//! - [`mixer`]: the channel table, control operations and render callback
//! - [`audio`]: output devices (cpal hardware, caller-clocked) and their config
//! - [`config`]: YAML config files

pub mod audio;
pub mod config;
pub mod convert;
pub mod mixer;
pub mod source;
pub mod types;

#[cfg(test)]
mod test_log;

pub use mixer::Mixer;
pub use types::*;
