//! Block mixer
//!
//! Output is produced in blocks of at most [`MIX_BLOCK_FRAMES`] stereo frames:
//! - zero the `i32` accumulator
//! - add every audible channel (effects interpolated, stream nearest-sample)
//! - clamp the sum to `i16` once, after all channels
//!
//! Clamping only at the end gives the sum headroom: channels can cancel out
//! before anything clips. The mixer does no I/O except through the stream
//! refill, never allocates after construction and never fails.

mod mixing;


pub use mixing::{Gains, stereo_gains};

use crate::MIX_BLOCK_FRAMES;
use crate::channel::{ChannelPool, ChannelState};
use crate::store::SampleStore;
use crate::stream::StreamRefill;

/// Category master volumes applied on top of each channel's gain
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixLevels {
    /// Sound effect master (0.0 to 1.0)
    pub sfx: f32,
    /// Music stream master (0.0 to 1.0)
    pub stream: f32,
}

impl Default for MixLevels {
    fn default() -> Self {
        Self {
            sfx: 1.0,
            stream: 1.0,
        }
    }
}

/// Fixed-point channel mixer
#[derive(Debug)]
pub struct Mixer {
    acc: Vec<i32>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    /// Create a mixer with its block accumulator
    pub fn new() -> Self {
        Self {
            acc: vec![0; MIX_BLOCK_FRAMES * 2],
        }
    }

    /// Mix every audible channel into `out` (interleaved stereo `i16`)
    ///
    /// A trailing odd sample is written as silence.
    pub fn process(
        &mut self,
        pool: &mut ChannelPool,
        store: &mut SampleStore,
        stream: &mut StreamRefill,
        levels: MixLevels,
        out: &mut [i16],
    ) {
        for block in out.chunks_mut(MIX_BLOCK_FRAMES * 2) {
            let frames = block.len() / 2;
            let acc = &mut self.acc[..frames * 2];
            acc.fill(0);

            for channel in pool.iter_mut().filter(|c| c.is_audible()) {
                match channel.state {
                    ChannelState::PlayingSfx => {
                        let Some(sound) = channel.sound else {
                            channel.stop();
                            continue;
                        };
                        let gains = stereo_gains(channel.volume, channel.pan, levels.sfx);
                        mixing::mix_sfx(channel, &store.get(sound).buffer, gains, acc);
                    }
                    ChannelState::PlayingStream => {
                        let gains = stereo_gains(channel.volume, channel.pan, levels.stream);
                        mixing::mix_stream(channel, stream, store.stream_buffer_mut(), gains, acc);
                    }
                    ChannelState::Idle | ChannelState::LoadingStream => {}
                }
            }

            mixing::clamp_into(acc, block);
            block[frames * 2..].fill(0);
        }
    }
}
