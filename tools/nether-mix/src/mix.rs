//! Options shared by the commands that build a mix

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nethercore_audio::{AudioConfig, AudioEngine, SfxScope};
use tracing::info;

/// What to play and how loud
#[derive(Args, Clone)]
pub struct MixArgs {
    /// Directory containing Data/SoundFX and Data/Music (overrides the config)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// audio.toml to use instead of the platform config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sound effect to play at the start, relative to Data/SoundFX (repeatable)
    #[arg(long = "sfx")]
    pub sfx: Vec<String>,

    /// Loop the sound effects (0 = once, 1 = from start, K = from frame K)
    #[arg(long, default_value_t = 0)]
    pub sfx_loop: u32,

    /// Music stream relative to Data/Music
    #[arg(long)]
    pub music: Option<String>,

    /// Frame to start the music at
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Frame to loop the music back to at its end (0 = no loop)
    #[arg(long, default_value_t = 0)]
    pub loop_frame: u32,

    /// Sound effect master volume (0.0 - 1.0)
    #[arg(long)]
    pub sfx_volume: Option<f32>,

    /// Music master volume (0.0 - 1.0)
    #[arg(long)]
    pub stream_volume: Option<f32>,

    /// Length of the mix in seconds
    #[arg(long, default_value_t = 5.0)]
    pub seconds: f32,
}

impl MixArgs {
    /// Resolve the configuration: file, then command-line overrides
    pub fn audio_config(&self) -> Result<AudioConfig> {
        let mut config = match &self.config {
            Some(path) => AudioConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AudioConfig::load_or_default(),
        };
        if let Some(root) = &self.root {
            config.asset_root = root.clone();
        }
        if let Some(volume) = self.sfx_volume {
            config.sfx_volume = volume;
        }
        if let Some(volume) = self.stream_volume {
            config.stream_volume = volume;
        }
        Ok(config)
    }

    /// Number of stereo frames to mix
    pub fn frames(&self) -> usize {
        (self.seconds.max(0.0) * nethercore_audio::AUDIO_FREQUENCY as f32) as usize
    }
}

/// Load every requested sound and start it
///
/// The engine must already be initialised so stream loads see the backend.
pub fn start_mix(engine: &mut AudioEngine, args: &MixArgs) -> Result<()> {
    for name in &args.sfx {
        let id = engine
            .load_sfx(name, 1, SfxScope::Global)
            .with_context(|| format!("Failed to load sfx {}", name))?;
        match engine.play_sfx(id, args.sfx_loop, 1) {
            Some(channel) => info!("Playing {} on channel {}", name, channel),
            None => info!("No free channel for {}", name),
        }
    }

    if let Some(music) = &args.music {
        let channel = engine
            .play_stream(music, None, args.start, args.loop_frame, false)
            .context("Streams are disabled in the audio config")?;
        engine.wait_for_stream_loads();
        anyhow::ensure!(
            engine.is_channel_active(channel),
            "Failed to start music stream {}",
            music
        );
    }

    Ok(())
}

/// Number of channels still busy
pub fn active_voices(engine: &AudioEngine) -> usize {
    (0..engine.channel_count())
        .filter(|&channel| engine.is_channel_active(channel))
        .count()
}
