//! Nethercore audio: real-time sound effect mixer and music streamer
//!
//! A fixed pool of [`CHANNEL_COUNT`] channels plays short sound effects from
//! the sample store and one decoded music stream, mixed into interleaved
//! stereo `i16` at [`AUDIO_FREQUENCY`].
//!
//! Architecture:
//! - [`store`]: fixed table of loaded effects; the last slot is the stream's decode buffer
//! - [`channel`] / [`allocator`]: voice slots and the voice-stealing policy
//! - [`mixer`]: 16.16 fixed-point resampling, panning and block clamp
//! - [`stream`] / [`decoder`]: decode-ahead refill with loop seek
//! - [`backend`]: output device capability, driven through a [`Renderer`]
//! - [`AudioEngine`]: the control-thread surface tying it together
//!
//! Sound effects are mono; see `nether-wav` for how WAV files are converted.

pub mod allocator;
pub mod assets;
pub mod backend;
pub mod channel;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod store;
pub mod stream;

pub use assets::{AssetSource, DirectorySource, MemorySource};
pub use backend::{AudioBackend, BackendError, HeadlessBackend, Renderer};
pub use channel::{Channel, ChannelState, LoopPoint};
pub use config::AudioConfig;
pub use decoder::{DecodeError, OpenDecoder, StreamDecoder};
pub use engine::{AudioEngine, PlaybackState};
pub use error::AudioError;
pub use mixer::MixLevels;
pub use store::{SfxId, SfxScope};

#[cfg(feature = "cpal")]
pub use backend::CpalBackend;

// =============================================================================
// Constants
// =============================================================================

/// Channel pool capacity
pub const CHANNEL_COUNT: usize = 16;

/// Sample store capacity (including the stream slot)
pub const SFX_COUNT: usize = 256;

/// Store slot reserved for the stream decode buffer
pub const STREAM_SLOT: usize = SFX_COUNT - 1;

/// Engine output and stream decode rate (Hz)
pub const AUDIO_FREQUENCY: u32 = 44_100;

/// Mixer block size in stereo frames
pub const MIX_BLOCK_FRAMES: usize = 1024;

/// Stream decode-ahead buffer size in stereo frames
pub const STREAM_BUFFER_FRAMES: usize = 1024;

/// Fractional bits of the 16.16 fixed-point format
pub const FIXED_SHIFT: u32 = 16;

/// 1.0 in 16.16 fixed point
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;

/// Priority stamped on the stream channel
pub const STREAM_PRIORITY: u32 = 0xFF;

/// Sound effect asset directory
pub const SFX_PATH: &str = "Data/SoundFX/";

/// Music asset directory
pub const MUSIC_PATH: &str = "Data/Music/";
