//! Backend without a device: the host pulls audio itself

use tracing::debug;

use super::{AudioBackend, BackendError, Renderer};

/// Deviceless backend for tests and offline rendering
///
/// Nothing calls the renderer on its own; use
/// [`crate::AudioEngine::render`] to pull blocks.
#[derive(Debug)]
pub struct HeadlessBackend {
    async_load: bool,
    renderer: Option<Renderer>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Headless backend that allows background stream loads
    pub fn new() -> Self {
        Self {
            async_load: true,
            renderer: None,
        }
    }

    /// Headless backend that forces every stream load onto the caller
    pub fn synchronous() -> Self {
        Self {
            async_load: false,
            renderer: None,
        }
    }

    /// True between `start` and `stop`
    pub fn is_running(&self) -> bool {
        self.renderer.is_some()
    }
}

impl AudioBackend for HeadlessBackend {
    fn start(&mut self, renderer: Renderer) -> Result<(), BackendError> {
        debug!("Headless audio backend started");
        self.renderer = Some(renderer);
        Ok(())
    }

    fn stop(&mut self) {
        self.renderer = None;
    }

    fn supports_async_load(&self) -> bool {
        self.async_load
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}
