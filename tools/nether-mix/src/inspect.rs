//! Inspect command - show how a WAV file is ingested

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nether_wav::WavSound;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// WAV file to inspect
    pub file: PathBuf,
}

/// Summary of an ingested sound
#[derive(Debug, PartialEq)]
pub struct Summary {
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
    pub frames: usize,
    /// Largest absolute internal sample
    pub peak: u16,
    pub truncated: bool,
}

impl Summary {
    pub fn of(sound: &WavSound) -> Self {
        Self {
            channels: sound.channels,
            bits_per_sample: sound.bits_per_sample,
            sample_rate: sound.sample_rate,
            frames: sound.frames(),
            peak: sound
                .samples
                .iter()
                .map(|s| s.unsigned_abs())
                .max()
                .unwrap_or(0),
            truncated: sound.truncated,
        }
    }

    /// Duration at the engine's playback rate
    pub fn seconds(&self) -> f64 {
        self.frames as f64 / f64::from(nethercore_audio::AUDIO_FREQUENCY)
    }
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let sound = nether_wav::parse_wav(&bytes)
        .with_context(|| format!("Failed to ingest {}", args.file.display()))?;
    let summary = Summary::of(&sound);

    println!("=== {} ===", args.file.display());
    println!(
        "  Source:   {} ch, {} bit, {} Hz",
        summary.channels, summary.bits_per_sample, summary.sample_rate
    );
    println!(
        "  Frames:   {} ({:.3}s at {} Hz)",
        summary.frames,
        summary.seconds(),
        nethercore_audio::AUDIO_FREQUENCY
    );
    println!("  Peak:     {}", summary.peak);
    if summary.sample_rate != nethercore_audio::AUDIO_FREQUENCY {
        println!("  Warning:  plays unresampled at the engine rate");
    }
    if summary.truncated {
        println!("  Warning:  data chunk is shorter than declared");
    }

    Ok(())
}
