//! Stream decoder adapter
//!
//! The mixer and the stream refill only ever see [`StreamDecoder`]. Exactly one
//! concrete decoder is compiled in, selected by cargo feature:
//!
//! | Feature | Decoder |
//! |---------|---------|
//! | `vorbis` (default) | Ogg Vorbis via symphonia |
//! | none | every open fails with [`DecodeError::Unsupported`] |
//!
//! All decoders deliver interleaved stereo `i16` at [`crate::AUDIO_FREQUENCY`].
//! Closing a stream is dropping the boxed decoder.

#[cfg(feature = "vorbis")]
mod vorbis;

#[cfg(feature = "vorbis")]
pub use vorbis::VorbisDecoder;

#[cfg(test)]
pub(crate) mod pcm;

/// Errors raised while opening a stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No decoder compiled in for this format
    #[error("no stream decoder available for this format")]
    Unsupported,
    /// Container could not be probed
    #[error("unrecognised stream container: {0}")]
    Probe(String),
    /// Container has no decodable audio track
    #[error("stream has no audio track")]
    NoTrack,
    /// Codec could not be instantiated
    #[error("failed to create codec: {0}")]
    Codec(String),
}

/// Uniform streaming decoder contract
pub trait StreamDecoder: Send {
    /// Decode up to `out.len() / 2` stereo frames into `out`
    ///
    /// Returns the number of frames written. Zero means the stream is exhausted.
    fn read_interleaved_stereo(&mut self, out: &mut [i16]) -> usize;

    /// Reposition to an absolute frame. Returns false if the stream cannot seek there.
    fn seek_to_frame(&mut self, frame: u64) -> bool;

    /// Frame index of the next frame to be read, if known
    fn tell_frame(&self) -> Option<u64>;
}

/// Constructor for the build-selected decoder
pub type OpenDecoder = fn(Vec<u8>) -> Result<Box<dyn StreamDecoder>, DecodeError>;

/// Open a stream with the decoder selected at build time
#[cfg(feature = "vorbis")]
pub fn open_default(bytes: Vec<u8>) -> Result<Box<dyn StreamDecoder>, DecodeError> {
    VorbisDecoder::open(bytes).map(|decoder| Box::new(decoder) as Box<dyn StreamDecoder>)
}

/// Open a stream with the decoder selected at build time
#[cfg(not(feature = "vorbis"))]
pub fn open_default(_bytes: Vec<u8>) -> Result<Box<dyn StreamDecoder>, DecodeError> {
    Err(DecodeError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_default_rejects_garbage() {
        assert!(open_default(vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_open_default_rejects_empty() {
        assert!(open_default(Vec::new()).is_err());
    }
}
