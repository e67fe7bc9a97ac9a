//! Stream refill: keeps the stream decode buffer full
//!
//! There is exactly one decoder and one decode-ahead buffer (the sample
//! store's reserved stream slot). The mixer calls [`StreamRefill::refill`]
//! whenever the stream channel's cursor runs off the end of the buffer.

use tracing::{debug, trace};

use crate::channel::Channel;
use crate::decoder::StreamDecoder;

/// Owner of the active stream decoder
#[derive(Default)]
pub struct StreamRefill {
    decoder: Option<Box<dyn StreamDecoder>>,
    /// Bumped by every stream request; a load only installs its decoder if
    /// the generation it started with is still current
    generation: u64,
}

impl StreamRefill {
    /// Start a new load: close the current decoder and return the new generation
    pub fn begin_load(&mut self) -> u64 {
        self.decoder = None;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Current load generation
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install an opened decoder
    pub fn install(&mut self, decoder: Box<dyn StreamDecoder>) {
        self.decoder = Some(decoder);
    }

    /// Close the decoder
    pub fn close(&mut self) {
        self.decoder = None;
    }

    /// True while a decoder is installed
    #[inline]
    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    /// Decoder read position in frames
    pub fn tell_frame(&self) -> Option<u64> {
        self.decoder.as_ref().and_then(|decoder| decoder.tell_frame())
    }

    /// Fill `buffer` (interleaved stereo) from the decoder
    ///
    /// At end of stream a looping channel seeks to its loop frame and keeps
    /// decoding into the same buffer. Otherwise the rest of the buffer is
    /// silenced and the channel goes idle. The whole buffer is halved
    /// afterwards for mixing headroom.
    pub fn refill(&mut self, channel: &mut Channel, buffer: &mut [i16]) {
        let total = buffer.len() / 2;

        let Some(decoder) = self.decoder.as_mut() else {
            buffer.fill(0);
            channel.stop();
            return;
        };

        let mut filled = 0;
        let mut just_seeked = false;
        while filled < total {
            let frames = decoder.read_interleaved_stereo(&mut buffer[filled * 2..total * 2]);
            if frames == 0 {
                // A seek that still yields nothing is treated as end of stream
                if !just_seeked
                    && let Some(loop_frame) = channel.loop_point
                    && decoder.seek_to_frame(u64::from(loop_frame))
                {
                    trace!("Stream looped to frame {}", loop_frame);
                    just_seeked = true;
                    continue;
                }

                debug!("Stream ended after {} of {} frames", filled, total);
                buffer[filled * 2..].fill(0);
                channel.stop();
                break;
            }

            just_seeked = false;
            filled += frames.min(total - filled);
        }

        for sample in buffer.iter_mut() {
            *sample /= 2;
        }
    }
}

impl std::fmt::Debug for StreamRefill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRefill")
            .field("open", &self.is_open())
            .field("generation", &self.generation)
            .finish()
    }
}
