//! Channel mixer
//!
//! The [`Mixer`] owns a table of playing channels and renders them into the
//! output device's buffer once per device period.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Caller Threads  │── play / stop ─────►│     MixerState      │
//! │                  │   set_volume ...    │  (one std Mutex)    │
//! └──────────────────┘                     │  channels, handles, │
//!                                          │  int16 scratch      │
//!                                          └──────────┬──────────┘
//!                                                     │ lock once per period
//!                                          ┌──────────▼──────────┐
//!                                          │   Device Callback   │
//!                                          │  render(&mut [u8])  │
//!                                          └─────────────────────┘
//! ```
//!
//! Every channel is mixed additively into one interleaved stereo `i16`
//! buffer, which is then written into the device buffer in the negotiated
//! format. Channels whose source is permanently exhausted are removed by the
//! pass that first sees them exhausted; channels that are only starved are
//! skipped and kept. Removed channels are freed on the GC thread (see
//! [`gc`]), so the callback never runs a source's destructor.

mod channel;
mod format;
pub mod gc;
mod handle;

pub use channel::{channel_gains, Channel};
pub use format::{i16_to_f32, i16_to_i32, OutputFormat};
pub use handle::HandleAllocator;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use basedrop::Owned;

use crate::audio::{AudioConfig, AudioError, AudioResult, OutputDevice, OutputSpec};
use crate::source::{validate_layout, AudioSource};
use crate::types::{ChannelHandle, ChannelState, MAX_CHANNEL_VOLUME, OUTPUT_CHANNELS};
use gc::gc_handle;

/// Everything the mixer lock protects
struct MixerState {
    channels: HashMap<ChannelHandle, Owned<Channel>>,
    handles: HandleAllocator,
    /// Interleaved stereo intermediate, reused across periods
    scratch: Vec<i16>,
    spec: Option<OutputSpec>,
    /// The unsupported-format diagnostic has been logged
    unsupported_reported: bool,
}

/// Multi-channel PCM mixer
///
/// Cheap to clone; clones share the same channel table. The device's render
/// callback holds one clone, so the state outlives the device.
#[derive(Clone)]
pub struct Mixer {
    state: Arc<Mutex<MixerState>>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Self::with_allocator(HandleAllocator::new())
    }

    /// A mixer whose handles come from `handles`
    pub fn with_allocator(handles: HandleAllocator) -> Self {
        Self {
            state: Arc::new(Mutex::new(MixerState {
                channels: HashMap::new(),
                handles,
                scratch: Vec::new(),
                spec: None,
                unsupported_reported: false,
            })),
        }
    }

    /// Lock the state, recovering from a poisoned lock
    ///
    /// A panic while holding the lock leaves the table consistent (every
    /// mutation is a single insert, remove or field store), so the audio
    /// thread keeps going rather than propagating the panic.
    fn lock(&self) -> MutexGuard<'_, MixerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Negotiate a stereo stream with `device` and start rendering into it
    ///
    /// The device may change sample rate and format but must come back with
    /// two channels. The device stays owned by the caller; dropping it stops
    /// the callbacks.
    pub fn init(
        &self,
        device: &mut impl OutputDevice,
        config: &AudioConfig,
    ) -> AudioResult<OutputSpec> {
        if self.lock().spec.is_some() {
            return Err(AudioError::AlreadyInitialized);
        }

        let request = config.stream_request();
        let spec = device.negotiate(&request)?;
        if spec.channels != OUTPUT_CHANNELS {
            log::error!(
                "Output device negotiated {} channel(s), stereo is required",
                spec.channels
            );
            return Err(AudioError::NotStereo {
                channels: spec.channels,
            });
        }
        if !spec.format.is_supported() {
            log::warn!(
                "Output format {:?} is not supported, the mixer will output silence",
                spec.format
            );
        }

        {
            let mut state = self.lock();
            if state.spec.is_some() {
                return Err(AudioError::AlreadyInitialized);
            }
            state.scratch = vec![0; spec.buffer_frames as usize * OUTPUT_CHANNELS as usize];
            state.spec = Some(spec);
        }

        let mixer = self.clone();
        if let Err(e) = device.start(Box::new(move |out: &mut [u8]| mixer.render(out))) {
            self.lock().spec = None;
            return Err(e);
        }

        log::info!(
            "Mixer initialized: {}Hz {:?}, {} frames per period",
            spec.sample_rate,
            spec.format,
            spec.buffer_frames
        );
        Ok(spec)
    }

    /// Start playing `source` at full volume, centered
    pub fn play(&self, source: impl AudioSource + 'static) -> ChannelHandle {
        self.play_with(source, MAX_CHANNEL_VOLUME, 0)
    }

    /// Start playing `source` with the given volume and balance
    ///
    /// Returns [`ChannelHandle::INVALID`] and drops the source if the mixer is
    /// not initialized or the source layout is unusable. The new channel is
    /// mixed from the next render pass on.
    pub fn play_with(
        &self,
        source: impl AudioSource + 'static,
        volume: u8,
        balance: i8,
    ) -> ChannelHandle {
        if let Err(e) = validate_layout(source.sample_rate(), source.channel_count()) {
            log::warn!("Refusing to play source: {}", e);
            return ChannelHandle::INVALID;
        }

        let Some(spec) = self.output_spec() else {
            log::warn!("play called before the mixer was initialized");
            return ChannelHandle::INVALID;
        };

        // Built outside the lock; the render pass only ever drops it
        let channel = Owned::new(
            &gc_handle(),
            Channel::new(Box::new(source), spec.sample_rate, volume, balance),
        );
        let mut state = self.lock();
        let handle = state.handles.allocate();
        if state.channels.insert(handle, channel).is_some() {
            log::warn!(
                "Channel handle {} reused while still playing, replacing the old channel",
                handle
            );
        }
        log::debug!(
            "Playing channel {} (volume {}, balance {})",
            handle,
            volume,
            balance
        );
        handle
    }

    /// Stop and drop a channel
    ///
    /// No-op for [`ChannelHandle::INVALID`] and unknown handles. Once this
    /// returns the channel is never mixed again.
    pub fn stop(&self, handle: ChannelHandle) {
        if !handle.is_valid() {
            return;
        }
        if self.lock().channels.remove(&handle).is_some() {
            log::debug!("Stopped channel {}", handle);
        }
    }

    /// Stop and drop every channel
    pub fn stop_all(&self) {
        let mut state = self.lock();
        let count = state.channels.len();
        state.channels.clear();
        if count > 0 {
            log::debug!("Stopped all {} channels", count);
        }
    }

    pub fn set_volume(&self, handle: ChannelHandle, volume: u8) {
        self.with_channel(handle, |channel| channel.set_volume(volume));
    }

    /// Volume of a channel, 0 if the handle is unknown
    pub fn volume(&self, handle: ChannelHandle) -> u8 {
        self.with_channel(handle, |channel| channel.volume())
            .unwrap_or(0)
    }

    /// Set balance, clamped to [-127, 127]
    pub fn set_balance(&self, handle: ChannelHandle, balance: i8) {
        self.with_channel(handle, |channel| channel.set_balance(balance));
    }

    /// Balance of a channel, 0 if the handle is unknown
    pub fn balance(&self, handle: ChannelHandle) -> i8 {
        self.with_channel(handle, |channel| channel.balance())
            .unwrap_or(0)
    }

    /// Whether `handle` names a channel in the table
    pub fn contains(&self, handle: ChannelHandle) -> bool {
        handle.is_valid() && self.lock().channels.contains_key(&handle)
    }

    /// Current state of a channel, `None` if the handle is unknown
    pub fn channel_state(&self, handle: ChannelHandle) -> Option<ChannelState> {
        self.with_channel(handle, |channel| channel.state())
    }

    /// Number of channels in the table
    pub fn channel_count(&self) -> usize {
        self.lock().channels.len()
    }

    /// What the device agreed to, once initialized
    pub fn output_spec(&self) -> Option<OutputSpec> {
        self.lock().spec
    }

    fn with_channel<R>(&self, handle: ChannelHandle, f: impl FnOnce(&mut Channel) -> R) -> Option<R> {
        if !handle.is_valid() {
            return None;
        }
        self.lock()
            .channels
            .get_mut(&handle)
            .map(|channel| f(&mut **channel))
    }

    /// Mix one device period into `out`
    ///
    /// `out` holds interleaved stereo frames in the negotiated format. Called
    /// from the device callback; never fails. Before `init` it only writes
    /// silence.
    pub fn render(&self, out: &mut [u8]) {
        out.fill(0);

        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(spec) = state.spec else {
            return;
        };

        let frame_size = spec.format.frame_size();
        debug_assert!(
            out.len() % frame_size == 0,
            "device buffer of {} bytes is not a whole number of {}-byte frames",
            out.len(),
            frame_size
        );
        let samples = out.len() / frame_size * OUTPUT_CHANNELS as usize;
        if state.scratch.len() < samples {
            // Only when the device hands out more than it negotiated
            state.scratch.resize(samples, 0);
        }
        let mix = &mut state.scratch[..samples];
        mix.fill(0);

        let supported = spec.format.is_supported();
        state.channels.retain(|handle, channel| match channel.state() {
            ChannelState::Exhausted => {
                log::debug!("Channel {} finished", handle);
                false
            }
            ChannelState::Starved => true,
            ChannelState::Active => {
                if supported {
                    channel.mix(mix);
                }
                true
            }
        });

        if supported {
            spec.format.write(mix, out);
        } else if !state.unsupported_reported {
            state.unsupported_reported = true;
            log::error!(
                "Unsupported output format {:?}, writing silence",
                spec.format
            );
        }
    }
}
