//! Nether Mix - drive the Nethercore mixer from the command line
//!
//! # Commands
//!
//! - `nether-mix inspect` - Show how a WAV file will be ingested
//! - `nether-mix render` - Mix sound effects and music offline into a WAV file
//! - `nether-mix play` - Mix live on the default output device (feature `cpal`)
//!
//! # Usage
//!
//! ```bash
//! # Check a sound effect before shipping it
//! nether-mix inspect Data/SoundFX/Global/Jump.wav
//!
//! # Five seconds of music with a jump on top
//! nether-mix render --root game --music GreenHill.ogg --sfx Global/Jump.wav -o mix.wav
//! ```
//!
//! Set `RUST_LOG=debug` for load and stream diagnostics.

mod inspect;
mod mix;
#[cfg(feature = "cpal")]
mod play;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Nether Mix - Nethercore audio tool
#[derive(Parser)]
#[command(name = "nether-mix")]
#[command(about = "Inspect sound effects and render Nethercore audio mixes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a WAV file will be ingested
    Inspect(inspect::InspectArgs),

    /// Mix offline into a WAV file
    Render(render::RenderArgs),

    /// Mix live on the default output device
    #[cfg(feature = "cpal")]
    Play(play::PlayArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Render(args) => render::execute(args),
        #[cfg(feature = "cpal")]
        Commands::Play(args) => play::execute(args),
    }
}
