//! Ogg Vorbis stream decoder (symphonia)

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::{DecodeError, StreamDecoder};
use crate::AUDIO_FREQUENCY;

/// Frames decoded ahead of a seek target so the first audible packet is
/// fully overlapped (longest Vorbis block is 8192 samples, half of it audible)
const SEEK_PREROLL: u64 = 4096;

/// In-memory Ogg Vorbis decoder producing interleaved stereo `i16`
pub struct VorbisDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    /// Stream length in frames, when the container knows it
    n_frames: Option<u64>,
    /// Reused conversion buffer (sized to the largest packet seen)
    sample_buf: Option<SampleBuffer<i16>>,
    /// Decoded stereo samples not yet handed out
    pending: Vec<i16>,
    /// Read index into `pending` (in samples)
    pending_pos: usize,
    /// Frame a seek asked for, until decoded output reaches it
    seek_target: Option<u64>,
    /// Frame index of the next frame `read_interleaved_stereo` returns
    next_frame: u64,
    /// Set once the container reports end of stream
    finished: bool,
}

impl VorbisDecoder {
    /// Open an Ogg Vorbis stream held in memory
    pub fn open(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("ogg");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Probe(e.to_string()))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let n_frames = track.codec_params.n_frames;

        if let Some(rate) = track.codec_params.sample_rate
            && rate != AUDIO_FREQUENCY
        {
            warn!(
                "Stream sample rate {} Hz differs from mixer rate {} Hz; playing unresampled",
                rate, AUDIO_FREQUENCY
            );
        }

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Codec(e.to_string()))?;

        debug!("Opened vorbis stream (track {})", track_id);

        Ok(Self {
            format,
            decoder,
            track_id,
            n_frames,
            sample_buf: None,
            pending: Vec::with_capacity(8192),
            pending_pos: 0,
            seek_target: None,
            next_frame: 0,
            finished: false,
        })
    }

    /// Decode packets until some stereo samples are pending
    ///
    /// Returns false at end of stream or on an unrecoverable error.
    fn decode_packet(&mut self) -> bool {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return false;
                }
                Err(e) => {
                    warn!("Stream read failed: {}", e);
                    self.finished = true;
                    return false;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }
            let packet_ts = packet.ts();

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => {
                    warn!("Stream decode failed: {}", e);
                    self.finished = true;
                    return false;
                }
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            if self
                .sample_buf
                .as_ref()
                .is_none_or(|buf| (buf.capacity() as u64) < capacity)
            {
                self.sample_buf = Some(SampleBuffer::new(capacity, spec));
            }
            let Some(buf) = self.sample_buf.as_mut() else {
                return false;
            };
            buf.copy_interleaved_ref(decoded);

            let channels = spec.channels.count().max(1);
            self.pending.clear();
            self.pending_pos = 0;
            for frame in buf.samples().chunks_exact(channels) {
                let left = frame[0];
                let right = if channels > 1 { frame[1] } else { left };
                self.pending.push(left);
                self.pending.push(right);
            }

            // Decoded frames cover [packet_ts, packet_ts + frames)
            if let Some(target) = self.seek_target {
                let frames = (self.pending.len() / 2) as u64;
                let skipped = target.saturating_sub(packet_ts).min(frames);
                self.pending_pos = skipped as usize * 2;
                if skipped < frames {
                    self.seek_target = None;
                    self.next_frame = packet_ts + skipped;
                }
            }

            if self.pending_pos < self.pending.len() {
                return true;
            }
        }
    }
}

impl StreamDecoder for VorbisDecoder {
    fn read_interleaved_stereo(&mut self, out: &mut [i16]) -> usize {
        let max_frames = out.len() / 2;
        let mut written = 0;

        while written < max_frames {
            if self.pending_pos >= self.pending.len() && (self.finished || !self.decode_packet()) {
                break;
            }

            let available = (self.pending.len() - self.pending_pos) / 2;
            let count = available.min(max_frames - written);
            out[written * 2..(written + count) * 2]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + count * 2]);
            self.pending_pos += count * 2;
            written += count;
        }

        self.next_frame += written as u64;
        written
    }

    fn seek_to_frame(&mut self, frame: u64) -> bool {
        if self.n_frames.is_some_and(|total| frame > total) {
            debug!("Stream seek to frame {} is past the end", frame);
            return false;
        }

        // A reset decoder yields nothing for its first packet, so land early
        // and discard up to the target by packet timestamp.
        let target = SeekTo::TimeStamp {
            ts: frame.saturating_sub(SEEK_PREROLL),
            track_id: self.track_id,
        };
        match self.format.seek(SeekMode::Accurate, target) {
            Ok(_) => {
                self.decoder.reset();
                self.pending.clear();
                self.pending_pos = 0;
                self.seek_target = Some(frame);
                self.next_frame = frame;
                self.finished = false;
                true
            }
            Err(e) => {
                debug!("Stream seek to frame {} failed: {}", frame, e);
                false
            }
        }
    }

    fn tell_frame(&self) -> Option<u64> {
        Some(self.next_frame)
    }
}
