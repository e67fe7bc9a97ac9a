//! Platform output backends
//!
//! A backend owns the output device and periodically asks the [`Renderer`]
//! for interleaved stereo `i16` at [`crate::AUDIO_FREQUENCY`]. The renderer
//! holds the device lock for the duration of each block, so control-thread
//! updates never interleave with a mix.

mod headless;

#[cfg(feature = "cpal")]
mod output;

#[cfg(feature = "cpal")]
pub use output::CpalBackend;
pub use headless::HeadlessBackend;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::PlaybackState;

/// Errors raised while starting an output backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No output device available
    #[error("no audio output device available")]
    NoDevice,
    /// Device cannot run 2 channels at the engine rate
    #[error("unsupported output configuration: {0}")]
    Config(String),
    /// Stream could not be built or started
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Block-processing entry point handed to a backend
#[derive(Clone)]
pub struct Renderer {
    state: Arc<Mutex<PlaybackState>>,
}

impl Renderer {
    pub(crate) fn new(state: Arc<Mutex<PlaybackState>>) -> Self {
        Self { state }
    }

    /// Mix into `out` (interleaved stereo) under the device lock
    pub fn render(&self, out: &mut [i16]) {
        self.state.lock().render(out);
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

/// Output capability injected into the engine
pub trait AudioBackend {
    /// Open the device and begin calling `renderer`
    fn start(&mut self, renderer: Renderer) -> Result<(), BackendError>;

    /// Stop calling the renderer and release the device
    fn stop(&mut self);

    /// Whether stream loads may run off the control thread
    fn supports_async_load(&self) -> bool;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
