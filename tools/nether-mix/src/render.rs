//! Render command - mix offline into a WAV file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use nethercore_audio::{AUDIO_FREQUENCY, AudioEngine, HeadlessBackend, MIX_BLOCK_FRAMES};

use crate::mix::{MixArgs, active_voices, start_mix};

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub mix: MixArgs,

    /// Output WAV file (16-bit stereo, 44100 Hz)
    #[arg(short, long, default_value = "mix.wav")]
    pub output: PathBuf,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let config = args.mix.audio_config()?;
    let mut engine = AudioEngine::from_config(config);
    engine.init(Box::new(HeadlessBackend::synchronous()))?;
    start_mix(&mut engine, &args.mix)?;

    let frames = args.mix.frames();
    let peak = render_to_file(&engine, frames, &args.output)?;
    let voices = active_voices(&engine);
    engine.shutdown();

    println!("=== Rendered ===");
    println!("  Assets: {}", engine.config().asset_root.display());
    println!("  Output: {}", args.output.display());
    println!(
        "  Length: {} frames ({:.2}s)",
        frames,
        frames as f64 / f64::from(AUDIO_FREQUENCY)
    );
    println!("  Peak:   {}", peak);
    println!("  Voices still playing: {}", voices);
    Ok(())
}

/// Pull `frames` stereo frames from the engine into a WAV file
///
/// Returns the peak absolute sample value.
pub fn render_to_file(engine: &AudioEngine, frames: usize, path: &Path) -> Result<u16> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: AUDIO_FREQUENCY,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut block = vec![0i16; MIX_BLOCK_FRAMES * 2];
    let mut remaining = frames;
    let mut peak = 0u16;
    while remaining > 0 {
        let count = remaining.min(MIX_BLOCK_FRAMES);
        let block = &mut block[..count * 2];
        engine.render(block);
        for &sample in block.iter() {
            peak = peak.max(sample.unsigned_abs());
            writer.write_sample(sample)?;
        }
        remaining -= count;
    }

    writer.finalize().context("Failed to finish WAV file")?;
    Ok(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nethercore_audio::{AudioConfig, MemorySource, SfxScope};

    #[test]
    fn test_render_to_file() {
        // 8-bit mono, 10 frames at 0x90
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&46u32.to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&[1, 0, 1, 0]);
        wav.extend_from_slice(&44_100u32.to_le_bytes());
        wav.extend_from_slice(&44_100u32.to_le_bytes());
        wav.extend_from_slice(&[1, 0, 8, 0]);
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&10u32.to_le_bytes());
        wav.extend_from_slice(&[0x90; 10]);

        let source = MemorySource::new().with("Data/SoundFX/Beep.wav", wav);
        let mut engine = AudioEngine::new(AudioConfig::default(), source);
        engine.init(Box::new(HeadlessBackend::synchronous())).unwrap();
        let beep = engine.load_sfx("Beep.wav", 1, SfxScope::Global).unwrap();
        engine.play_sfx(beep, 0, 1).unwrap();
        assert_eq!(active_voices(&engine), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let peak = render_to_file(&engine, 2000, &path).unwrap();
        assert_eq!(peak, 4096);
        assert_eq!(active_voices(&engine), 0);

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4000);
        assert!(samples[..20].iter().all(|&s| s == 4096));
        assert!(samples[20..].iter().all(|&s| s == 0));
    }
}
