//! The audio engine aggregate
//!
//! [`AudioEngine`] owns the playback state behind the device lock and is the
//! control-thread surface: loading, playing and steering sounds. The backend
//! only ever sees a [`Renderer`] pointing at the same state.
//!
//! Every operation that touches several channel fields at once does so under
//! one lock acquisition, so the mixer never observes a half-started sound.

mod load;


use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::allocator::{allocate_sfx, allocate_stream, claim_sfx, claim_stream};
use crate::assets::{AssetSource, DirectorySource, music_path, sfx_path};
use crate::backend::{AudioBackend, Renderer};
use crate::channel::{Channel, ChannelPool, ChannelState, clamp_safe};
use crate::config::AudioConfig;
use crate::decoder::{OpenDecoder, open_default};
use crate::error::AudioError;
use crate::mixer::{MixLevels, Mixer};
use crate::store::{SampleStore, SfxId, SfxScope};
use crate::stream::StreamRefill;
use crate::{AUDIO_FREQUENCY, CHANNEL_COUNT};

use load::StreamLoad;

/// Everything the mixing callback touches, guarded by the device lock
#[derive(Debug, Default)]
pub struct PlaybackState {
    pub(crate) pool: ChannelPool,
    pub(crate) store: SampleStore,
    pub(crate) stream: StreamRefill,
    pub(crate) mixer: Mixer,
    pub(crate) levels: MixLevels,
}

impl PlaybackState {
    /// Mix one callback's worth of interleaved stereo into `out`
    pub fn render(&mut self, out: &mut [i16]) {
        self.mixer.process(
            &mut self.pool,
            &mut self.store,
            &mut self.stream,
            self.levels,
            out,
        );
    }
}

/// Real-time mixer and music streamer for one running game
pub struct AudioEngine {
    state: Arc<Mutex<PlaybackState>>,
    assets: Arc<dyn AssetSource>,
    config: AudioConfig,
    open_decoder: OpenDecoder,
    backend: Option<Box<dyn AudioBackend>>,
    loaders: Vec<JoinHandle<()>>,
}

impl AudioEngine {
    /// Create an engine reading assets from `assets`
    ///
    /// Nothing plays until [`AudioEngine::init`] hands it a backend.
    pub fn new(config: AudioConfig, assets: impl AssetSource + 'static) -> Self {
        let state = PlaybackState {
            levels: MixLevels {
                sfx: clamp_safe(config.sfx_volume, 0.0, 1.0),
                stream: clamp_safe(config.stream_volume, 0.0, 1.0),
            },
            ..Default::default()
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            assets: Arc::new(assets),
            config,
            open_decoder: open_default,
            backend: None,
            loaders: Vec::new(),
        }
    }

    /// Create an engine reading assets from `config.asset_root`
    pub fn from_config(config: AudioConfig) -> Self {
        let assets = DirectorySource::new(config.asset_root.clone());
        debug!("Reading audio assets from {}", assets.root().display());
        Self::new(config, assets)
    }

    /// Replace the stream decoder constructor
    pub fn with_decoder(mut self, open: OpenDecoder) -> Self {
        self.open_decoder = open;
        self
    }

    /// Start output through `backend`
    pub fn init(&mut self, mut backend: Box<dyn AudioBackend>) -> Result<(), AudioError> {
        if self.backend.is_some() {
            return Err(AudioError::AlreadyInitialized);
        }
        backend.start(self.renderer())?;
        info!("Audio engine started ({} backend)", backend.name());
        self.backend = Some(backend);
        Ok(())
    }

    /// Stop output, wait for stream loads and release every channel
    pub fn shutdown(&mut self) {
        self.wait_for_stream_loads();
        if let Some(mut backend) = self.backend.take() {
            backend.stop();
            info!("Audio engine stopped ({} backend)", backend.name());
        }

        let mut state = self.state.lock();
        state.pool.iter_mut().for_each(Channel::stop);
        state.stream.close();
    }

    /// True between `init` and `shutdown`
    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Block-processing entry point for a backend
    pub fn renderer(&self) -> Renderer {
        Renderer::new(Arc::clone(&self.state))
    }

    /// Pull one buffer of interleaved stereo (headless hosts)
    pub fn render(&self, out: &mut [i16]) {
        self.state.lock().render(out);
    }

    /// Active configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    // =========================================================================
    // Sound effects
    // =========================================================================

    /// Load `Data/SoundFX/<name>` into the first free slot
    ///
    /// Loading a name that is already loaded returns the existing slot. The
    /// file is fully parsed before anything is written to the store, so a
    /// failed load leaves the slot empty.
    pub fn load_sfx(
        &self,
        name: &str,
        max_concurrent_plays: u8,
        scope: SfxScope,
    ) -> Result<SfxId, AudioError> {
        if let Some(id) = self.find_sfx(name) {
            debug!("Sfx {} already loaded in slot {}", name, id.0);
            return Ok(id);
        }
        if scope == SfxScope::None {
            return Err(AudioError::InvalidScope(name.to_string()));
        }
        if !has_wav_extension(name) {
            warn!("Unable to load sfx {}: not a .wav file", name);
            return Err(AudioError::UnsupportedFormat(name.to_string()));
        }
        if self.state.lock().store.free_slot().is_none() {
            return Err(AudioError::StoreFull(name.to_string()));
        }

        let path = sfx_path(name);
        let bytes = self.assets.read(&path).map_err(|source| {
            warn!("Unable to open sfx {}: {}", path, source);
            AudioError::Asset {
                path: path.clone(),
                source,
            }
        })?;
        let sound = nether_wav::parse_wav(&bytes).map_err(|source| {
            warn!("Unable to read sfx {}: {}", name, source);
            AudioError::Wav {
                name: name.to_string(),
                source,
            }
        })?;
        if sound.truncated {
            warn!("Sfx {} is shorter than its data chunk declares", name);
        }

        let mut state = self.state.lock();
        // Another thread may have loaded it meanwhile
        if let Some(id) = state.store.find(name) {
            return Ok(id);
        }
        let id = state
            .store
            .free_slot()
            .ok_or_else(|| AudioError::StoreFull(name.to_string()))?;
        let frames = sound.frames();
        state
            .store
            .commit(id, name, max_concurrent_plays, scope, sound);

        info!(
            "Loaded sfx {} into slot {} ({} frames, {:?})",
            name, id.0, frames, scope
        );
        Ok(id)
    }

    /// Slot of a loaded sound effect
    pub fn find_sfx(&self, name: &str) -> Option<SfxId> {
        self.state.lock().store.find(name)
    }

    /// Unload stage-scoped sound effects
    pub fn clear_stage_scoped_sfx(&self) {
        self.clear_scope(|scope| scope >= SfxScope::Stage);
    }

    /// Unload global-scoped sound effects
    pub fn clear_global_scoped_sfx(&self) {
        self.clear_scope(|scope| scope == SfxScope::Global);
    }

    fn clear_scope(&self, predicate: impl Fn(SfxScope) -> bool) {
        let mut state = self.state.lock();
        let state = &mut *state;
        let cleared = state.store.clear_where(predicate);
        for channel in state.pool.iter_mut() {
            if channel.state == ChannelState::PlayingSfx
                && channel.sound.is_some_and(|sound| cleared.contains(&sound))
            {
                channel.stop();
            }
        }
        debug!("Cleared {} sfx", cleared.len());
    }

    /// Play a loaded sound effect
    ///
    /// `loop_request`: 0 plays once, 1 loops to the start, K loops to frame K.
    /// Returns the channel, or `None` when every eligible channel is busy.
    pub fn play_sfx(&self, sound: SfxId, loop_request: u32, priority: u32) -> Option<usize> {
        let mut state = self.state.lock();
        let state = &mut *state;
        if !state.store.is_loaded(sound) {
            warn!("play_sfx: slot {} holds no sfx", sound.0);
            return None;
        }

        let Some(index) = allocate_sfx(&state.pool, &state.store, sound, priority) else {
            trace!("play_sfx: no channel for slot {} at priority {}", sound.0, priority);
            return None;
        };
        claim_sfx(
            &mut state.pool,
            &mut state.store,
            index,
            sound,
            loop_request,
            priority,
        );
        Some(index)
    }

    // =========================================================================
    // Music stream
    // =========================================================================

    /// Play `Data/Music/<filename>`
    ///
    /// The channel is claimed immediately in the loading state. Decoding
    /// starts at `start_frame`; a non-zero `loop_frame` makes the stream loop
    /// back to that frame at its end. With `load_async` (and a backend and
    /// config that allow it) the file is opened on a background thread.
    pub fn play_stream(
        &mut self,
        filename: &str,
        slot: Option<usize>,
        start_frame: u32,
        loop_frame: u32,
        load_async: bool,
    ) -> Option<usize> {
        if !self.config.streams_enabled {
            debug!("play_stream: streams are disabled");
            return None;
        }

        let (index, generation) = {
            let mut state = self.state.lock();
            let Some(index) = allocate_stream(&state.pool, slot) else {
                warn!("play_stream: no channel for {}", filename);
                return None;
            };
            claim_stream(&mut state.pool, index, loop_frame);
            (index, state.stream.begin_load())
        };

        let load = StreamLoad {
            state: Arc::clone(&self.state),
            assets: Arc::clone(&self.assets),
            open: self.open_decoder,
            path: music_path(filename),
            index,
            start_frame,
            generation,
        };

        let background = load_async
            && self.config.async_stream_loading
            && self
                .backend
                .as_ref()
                .is_some_and(|backend| backend.supports_async_load());

        if background {
            self.loaders.retain(|handle| !handle.is_finished());
            let job = load.clone();
            match std::thread::Builder::new()
                .name("stream-load".into())
                .spawn(move || job.run())
            {
                Ok(handle) => self.loaders.push(handle),
                Err(e) => {
                    warn!("Failed to spawn stream loader, loading inline: {}", e);
                    load.run();
                }
            }
        } else {
            load.run();
        }

        Some(index)
    }

    /// Block until every background stream load has finished
    pub fn wait_for_stream_loads(&mut self) {
        for handle in self.loaders.drain(..) {
            if handle.join().is_err() {
                warn!("Stream loader thread panicked");
            }
        }
    }

    // =========================================================================
    // Channel control
    // =========================================================================

    /// Set volume [0, 4], pan [-1, 1] and speed (> 0) of a channel
    pub fn set_channel_attributes(&self, channel: usize, volume: f32, pan: f32, speed: f32) {
        if let Some(channel) = self.state.lock().pool.get_mut(channel) {
            channel.set_attributes(volume, pan, speed);
        }
    }

    /// Stop a channel
    pub fn stop_channel(&self, channel: usize) {
        if let Some(channel) = self.state.lock().pool.get_mut(channel) {
            channel.stop();
        }
    }

    /// Stop every channel playing `sound`
    pub fn stop_sfx(&self, sound: SfxId) {
        self.state.lock().pool.stop_bound(sound);
    }

    /// Pause a busy channel
    pub fn pause_channel(&self, channel: usize) {
        if let Some(channel) = self.state.lock().pool.get_mut(channel)
            && !channel.is_idle()
        {
            channel.paused = true;
        }
    }

    /// Resume a paused channel
    pub fn resume_channel(&self, channel: usize) {
        if let Some(channel) = self.state.lock().pool.get_mut(channel) {
            channel.paused = false;
        }
    }

    /// Pause every busy channel
    pub fn pause_all(&self) {
        for channel in self.state.lock().pool.iter_mut() {
            if !channel.is_idle() {
                channel.paused = true;
            }
        }
    }

    /// Resume every channel
    pub fn resume_all(&self) {
        for channel in self.state.lock().pool.iter_mut() {
            channel.paused = false;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Playback position of a channel in frames
    ///
    /// Sound effects report their cursor, the stream reports the decoder
    /// position. Out-of-range and idle channels report 0.
    pub fn get_channel_pos(&self, channel: usize) -> u32 {
        let state = self.state.lock();
        match state.pool.get(channel).map(|c| (c.state, c.position)) {
            Some((ChannelState::PlayingSfx, position)) => position,
            Some((ChannelState::PlayingStream, _)) => {
                state.stream.tell_frame().unwrap_or(0) as u32
            }
            _ => 0,
        }
    }

    /// Decoder position of the playing stream in seconds, or -1.0
    pub fn get_stream_position_seconds(&self) -> f64 {
        if !self.is_initialized() {
            return -1.0;
        }
        let state = self.state.lock();
        let playing = state
            .pool
            .iter()
            .any(|c| c.state == ChannelState::PlayingStream);
        match state.stream.tell_frame() {
            Some(frame) if playing => frame as f64 / f64::from(AUDIO_FREQUENCY),
            _ => -1.0,
        }
    }

    /// True while any channel is playing `sound`
    pub fn is_sfx_playing(&self, sound: SfxId) -> bool {
        self.state
            .lock()
            .pool
            .iter()
            .any(|c| c.state == ChannelState::PlayingSfx && c.sound == Some(sound))
    }

    /// True while a channel is busy (paused channels count as busy)
    pub fn is_channel_active(&self, channel: usize) -> bool {
        self.state
            .lock()
            .pool
            .get(channel)
            .is_some_and(|c| !c.is_idle())
    }

    /// Snapshot of a channel
    pub fn channel(&self, channel: usize) -> Option<Channel> {
        self.state.lock().pool.get(channel).cloned()
    }

    /// Number of channels in the pool
    pub fn channel_count(&self) -> usize {
        CHANNEL_COUNT
    }

    // =========================================================================
    // Master volumes
    // =========================================================================

    /// Set the sound effect master volume [0, 1]
    pub fn set_sfx_volume(&self, volume: f32) {
        self.state.lock().levels.sfx = clamp_safe(volume, 0.0, 1.0);
    }

    /// Set the music stream master volume [0, 1]
    pub fn set_stream_volume(&self, volume: f32) {
        self.state.lock().levels.stream = clamp_safe(volume, 0.0, 1.0);
    }

    /// Current master volumes
    pub fn levels(&self) -> MixLevels {
        self.state.lock().levels
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.shutdown();
        }
    }
}

fn has_wav_extension(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}
