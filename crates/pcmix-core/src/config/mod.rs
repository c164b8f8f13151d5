//! Configuration file I/O
//!
//! The only configuration pcmix reads is [`AudioConfig`](crate::audio::AudioConfig),
//! stored as YAML. The helpers are generic so embedding applications can keep
//! the mixer settings inside their own config types.
//!
//! ```ignore
//! use pcmix_core::audio::AudioConfig;
//! use pcmix_core::config::{load_config, save_config};
//!
//! let config: AudioConfig = load_config(&path);
//! save_config(&config.with_sample_rate(48000), &path)?;
//! ```

mod io;

pub use io::{load_config, read_config, save_config};
