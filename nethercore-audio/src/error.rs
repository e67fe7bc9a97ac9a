//! Engine error type
//!
//! Only control-thread operations return these. The mixing path never
//! fails: problems there end the affected channel instead.

use nether_wav::WavError;

use crate::backend::BackendError;
use crate::decoder::DecodeError;

/// Errors returned by [`crate::AudioEngine`] and its configuration
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Asset could not be read from the asset source
    #[error("failed to read asset {path}: {source}")]
    Asset {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// WAV data could not be ingested
    #[error("invalid sfx {name}: {source}")]
    Wav {
        name: String,
        #[source]
        source: WavError,
    },
    /// Sound effects must be `.wav` files
    #[error("unsupported sfx format: {0}")]
    UnsupportedFormat(String),
    /// Sound effects cannot be loaded with an empty scope
    #[error("sfx {0} must be loaded with a global or stage scope")]
    InvalidScope(String),
    /// Every sound effect slot is occupied
    #[error("no free sfx slot for {0}")]
    StoreFull(String),
    /// Stream decoder could not be opened
    #[error("failed to open stream: {0}")]
    Decode(#[from] DecodeError),
    /// Output backend failed to start
    #[error("audio backend failed: {0}")]
    Backend(#[from] BackendError),
    /// Engine was initialised twice
    #[error("audio engine is already initialised")]
    AlreadyInitialized,
    /// Config file is not valid TOML for [`crate::AudioConfig`]
    #[error("invalid audio config: {0}")]
    Config(#[from] toml::de::Error),
    /// Config could not be serialised
    #[error("failed to serialise audio config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
