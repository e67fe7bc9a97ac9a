//! Play command - mix live on the default output device

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use nethercore_audio::{AUDIO_FREQUENCY, AudioEngine, CpalBackend};

use crate::mix::{MixArgs, start_mix};

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub mix: MixArgs,
}

/// Execute the play command
pub fn execute(args: PlayArgs) -> Result<()> {
    let config = args.mix.audio_config()?;
    let mut engine = AudioEngine::from_config(config);
    engine.init(Box::new(CpalBackend::new()))?;
    start_mix(&mut engine, &args.mix)?;

    println!("=== Playing ({:.1}s) ===", args.mix.seconds);
    let frames = args.mix.frames() as u64;
    std::thread::sleep(Duration::from_millis(
        frames * 1000 / u64::from(AUDIO_FREQUENCY),
    ));

    let seconds = engine.get_stream_position_seconds();
    if seconds >= 0.0 {
        println!("  Music position: {:.2}s", seconds);
    }
    engine.shutdown();
    Ok(())
}
