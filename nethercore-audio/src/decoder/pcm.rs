//! Raw interleaved stereo PCM decoder used by the test suites

use super::{DecodeError, StreamDecoder};

/// Little-endian `i16` stereo frames held in memory
pub(crate) struct PcmDecoder {
    samples: Vec<i16>,
    cursor: usize,
    seekable: bool,
}

impl PcmDecoder {
    pub(crate) fn new(samples: Vec<i16>) -> Self {
        Self {
            samples,
            cursor: 0,
            seekable: true,
        }
    }

    pub(crate) fn unseekable(samples: Vec<i16>) -> Self {
        Self {
            seekable: false,
            ..Self::new(samples)
        }
    }

    fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

impl StreamDecoder for PcmDecoder {
    fn read_interleaved_stereo(&mut self, out: &mut [i16]) -> usize {
        let count = (out.len() / 2).min(self.frames() - self.cursor);
        out[..count * 2].copy_from_slice(&self.samples[self.cursor * 2..(self.cursor + count) * 2]);
        self.cursor += count;
        count
    }

    fn seek_to_frame(&mut self, frame: u64) -> bool {
        if !self.seekable || frame > self.frames() as u64 {
            return false;
        }
        self.cursor = frame as usize;
        true
    }

    fn tell_frame(&self) -> Option<u64> {
        Some(self.cursor as u64)
    }
}

/// [`super::OpenDecoder`] for raw PCM asset bytes
pub(crate) fn open_pcm(bytes: Vec<u8>) -> Result<Box<dyn StreamDecoder>, DecodeError> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(DecodeError::Probe("not raw stereo pcm".to_string()));
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(Box::new(PcmDecoder::new(samples)))
}

/// Encode stereo frames the way [`open_pcm`] expects them
pub(crate) fn pcm_bytes(frames: &[(i16, i16)]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|&(left, right)| {
            let mut bytes = [0u8; 4];
            bytes[..2].copy_from_slice(&left.to_le_bytes());
            bytes[2..].copy_from_slice(&right.to_le_bytes());
            bytes
        })
        .collect()
}
