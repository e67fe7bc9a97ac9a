//! Stream loading
//!
//! Opening a stream reads the whole music file and probes it, so it runs
//! without the device lock. Only installing the decoder and priming the
//! buffer happen under the lock, and only if nothing superseded the
//! request in the meantime.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::PlaybackState;
use crate::assets::AssetSource;
use crate::channel::ChannelState;
use crate::decoder::{OpenDecoder, StreamDecoder};
use crate::error::AudioError;

/// One pending stream request
#[derive(Clone)]
pub(super) struct StreamLoad {
    pub state: Arc<Mutex<PlaybackState>>,
    pub assets: Arc<dyn AssetSource>,
    pub open: OpenDecoder,
    pub path: String,
    pub index: usize,
    pub start_frame: u32,
    pub generation: u64,
}

impl StreamLoad {
    fn open_decoder(&self) -> Result<Box<dyn StreamDecoder>, AudioError> {
        let bytes = self.assets.read(&self.path).map_err(|source| AudioError::Asset {
            path: self.path.clone(),
            source,
        })?;
        let mut decoder = (self.open)(bytes)?;

        if self.start_frame != 0 && !decoder.seek_to_frame(u64::from(self.start_frame)) {
            debug!(
                "Stream {} cannot seek to start frame {}, playing from the top",
                self.path, self.start_frame
            );
        }
        Ok(decoder)
    }

    /// Open the stream and hand it to the channel
    pub fn run(self) {
        let opened = self.open_decoder();

        let mut state = self.state.lock();
        let state = &mut *state;

        if state.stream.generation() != self.generation {
            debug!("Stream load for {} superseded", self.path);
            return;
        }
        let Some(channel) = state.pool.get_mut(self.index) else {
            return;
        };
        if !channel.is_loading() {
            debug!("Stream channel {} released before {} loaded", self.index, self.path);
            return;
        }

        match opened {
            Ok(decoder) => {
                state.stream.install(decoder);
                channel.state = ChannelState::PlayingStream;
                channel.reset_position();
                state.stream.refill(channel, state.store.stream_buffer_mut());
                if channel.state == ChannelState::PlayingStream {
                    info!("Streaming {} on channel {}", self.path, self.index);
                }
            }
            Err(e) => {
                warn!("Unable to play stream {}: {}", self.path, e);
                channel.stop();
            }
        }
    }
}
