//! Nether-WAV: RIFF/WAVE ingestion for the Nethercore mixer
//!
//! Converts a RIFF/WAVE byte buffer into the mixer's internal sample format:
//! mono, signed 16-bit PCM. This is **a pure codec** - it knows nothing about
//! sample slots, scopes or channels. The caller (nethercore-audio's sample
//! store) decides where the result lives.
//!
//! # Layout handling
//!
//! ```text
//! 0x00: "RIFF"            (validated)
//! 0x04: riff size         (ignored)
//! 0x08: form type         (ignored)
//! 0x0C: "fmt "
//! 0x10: fmt chunk size    (used to find the end of the fmt chunk)
//! 0x16: channels (u16)
//! 0x18: sample rate (u32)
//! 0x22: bits per sample (u16)
//! 0x14 + fmt size: chunk scan for "data", 4 bytes per step, 16 steps max
//! ```
//!
//! Older content sometimes places `data` behind a large padding chunk. A match
//! exactly [`LEGACY_DATA_OFFSET`] bytes past the scan start is accepted too.
//!
//! # Sample conversion
//!
//! | Source | Internal value |
//! |--------|----------------|
//! | 8-bit unsigned | `(s - 128) << 8` |
//! | 16-bit signed | `s * 3 / 4` (load-time attenuation) |
//!
//! Multi-channel files are averaged down to mono after conversion.
//!
//! # Usage
//!
//! ```
//! let mut wav = Vec::new();
//! wav.extend_from_slice(b"RIFF");
//! wav.extend_from_slice(&40u32.to_le_bytes());
//! wav.extend_from_slice(b"WAVEfmt ");
//! wav.extend_from_slice(&16u32.to_le_bytes());
//! wav.extend_from_slice(&[1, 0, 1, 0]); // PCM, mono
//! wav.extend_from_slice(&44_100u32.to_le_bytes());
//! wav.extend_from_slice(&44_100u32.to_le_bytes());
//! wav.extend_from_slice(&[1, 0, 8, 0]); // block align 1, 8 bits
//! wav.extend_from_slice(b"data");
//! wav.extend_from_slice(&4u32.to_le_bytes());
//! wav.extend_from_slice(&[0x80; 4]);
//!
//! let sound = nether_wav::parse_wav(&wav).unwrap();
//! assert_eq!(sound.samples, vec![0; 4]);
//! ```

mod parse;

pub use parse::parse_wav;

// =============================================================================
// Constants
// =============================================================================

/// "RIFF" container signature
pub const RIFF_SIGNATURE: [u8; 4] = *b"RIFF";

/// "data" sub-chunk id
pub const DATA_CHUNK_ID: [u8; 4] = *b"data";

/// Offset of the fmt chunk size field
pub const FMT_SIZE_OFFSET: usize = 16;

/// Offset of the fmt chunk payload (the size field counts from here)
pub const FMT_DATA_OFFSET: usize = 20;

/// Offset of the channel count field
pub const CHANNELS_OFFSET: usize = 22;

/// Offset of the sample rate field
pub const SAMPLE_RATE_OFFSET: usize = 24;

/// Offset of the bits-per-sample field
pub const BITS_OFFSET: usize = 34;

/// Step between candidate chunk ids during the data scan
pub const DATA_SCAN_STEP: usize = 4;

/// Maximum number of scan steps before giving up
pub const DATA_SCAN_STEPS: usize = 16;

/// Legacy position (relative to the scan start) at which `data` is still accepted
pub const LEGACY_DATA_OFFSET: usize = 0x100;

// =============================================================================
// Types
// =============================================================================

/// A decoded sound effect in the internal representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavSound {
    /// Mono 16-bit samples, attenuation already applied
    pub samples: Vec<i16>,
    /// Sample rate declared by the file
    pub sample_rate: u32,
    /// Channel count declared by the file (samples are already downmixed)
    pub channels: u16,
    /// Bit depth of the source data (8 or 16)
    pub bits_per_sample: u16,
    /// True when the declared data length ran past the end of the buffer
    pub truncated: bool,
}

impl WavSound {
    /// Number of sample frames
    pub fn frames(&self) -> usize {
        self.samples.len()
    }
}

/// Errors that can occur while ingesting a WAV buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WavError {
    /// Missing "RIFF" signature
    #[error("invalid RIFF header")]
    InvalidSignature,
    /// Buffer ends before a header field at the given offset
    #[error("buffer truncated at offset {0:#x}")]
    Truncated(usize),
    /// No "data" chunk within the scan window
    #[error("no data chunk within {DATA_SCAN_STEPS} steps of the fmt chunk")]
    MissingDataChunk,
    /// Only 8- and 16-bit PCM is supported
    #[error("unsupported bit depth {0} (must be 8 or 16)")]
    UnsupportedBitDepth(u16),
    /// Channel count of zero
    #[error("invalid channel count 0")]
    InvalidChannelCount,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a canonical WAV buffer with an optional chunk between fmt and data
    fn build_wav(
        channels: u16,
        bits: u16,
        fmt_extra: &[u8],
        between: &[u8],
        pcm: &[u8],
        declared_len: Option<u32>,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&(16 + fmt_extra.len() as u32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&44_100u32.to_le_bytes());
        let block_align = channels * bits / 8;
        out.extend_from_slice(&(44_100 * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(fmt_extra);
        out.extend_from_slice(between);
        out.extend_from_slice(b"data");
        out.extend_from_slice(&declared_len.unwrap_or(pcm.len() as u32).to_le_bytes());
        out.extend_from_slice(pcm);
        out
    }

    fn pcm16(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_8bit_midscale_is_silence() {
        let wav = build_wav(1, 8, &[], &[], &[0x80; 64], None);
        let sound = parse_wav(&wav).unwrap();
        assert_eq!(sound.frames(), 64);
        assert!(sound.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_8bit_recentering() {
        let wav = build_wav(1, 8, &[], &[], &[0x00, 0xFF, 0x81], None);
        let sound = parse_wav(&wav).unwrap();
        assert_eq!(sound.samples, vec![-32768, 32512, 256]);
    }

    #[test]
    fn test_16bit_three_quarter_attenuation() {
        let wav = build_wav(1, 16, &[], &[], &pcm16(&[32767, -32768, 4, -4, 0]), None);
        let sound = parse_wav(&wav).unwrap();
        assert_eq!(sound.bits_per_sample, 16);
        assert_eq!(sound.samples, vec![24575, -24576, 3, -3, 0]);
    }

    #[test]
    fn test_16bit_length_is_halved() {
        let wav = build_wav(1, 16, &[], &[], &pcm16(&[100; 10]), None);
        assert_eq!(parse_wav(&wav).unwrap().frames(), 10);
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut wav = build_wav(1, 8, &[], &[], &[0x80; 4], None);
        wav[0] = b'X';
        assert_eq!(parse_wav(&wav), Err(WavError::InvalidSignature));
    }

    #[test]
    fn test_form_type_is_not_checked() {
        let mut wav = build_wav(1, 8, &[], &[], &[0x80; 4], None);
        wav[8..12].copy_from_slice(b"AVI ");
        assert_eq!(parse_wav(&wav).unwrap().frames(), 4);
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert_eq!(parse_wav(b"RI"), Err(WavError::Truncated(0)));
    }

    #[test]
    fn test_extended_fmt_chunk_uses_declared_size() {
        // WAVEFORMATEX with cbSize = 0 makes the fmt chunk 18 bytes
        let wav = build_wav(1, 8, &[0, 0], &[], &[0x90; 8], None);
        let sound = parse_wav(&wav).unwrap();
        assert_eq!(sound.samples, vec![0x10 << 8; 8]);
    }

    #[test]
    fn test_skips_small_chunk_before_data() {
        let mut list = Vec::new();
        list.extend_from_slice(b"LIST");
        list.extend_from_slice(&4u32.to_le_bytes());
        list.extend_from_slice(b"INFO");
        let wav = build_wav(1, 8, &[], &list, &[0x80; 4], None);
        assert_eq!(parse_wav(&wav).unwrap().frames(), 4);
    }

    #[test]
    fn test_data_beyond_scan_window_fails() {
        let mut junk = Vec::new();
        junk.extend_from_slice(b"JUNK");
        junk.extend_from_slice(&92u32.to_le_bytes());
        junk.extend_from_slice(&[0u8; 92]);
        let wav = build_wav(1, 8, &[], &junk, &[0x80; 4], None);
        assert_eq!(parse_wav(&wav), Err(WavError::MissingDataChunk));
    }

    #[test]
    fn test_legacy_data_offset_is_accepted() {
        let pad = LEGACY_DATA_OFFSET - 8;
        let mut junk = Vec::new();
        junk.extend_from_slice(b"JUNK");
        junk.extend_from_slice(&(pad as u32).to_le_bytes());
        junk.extend_from_slice(&vec![0u8; pad]);
        let wav = build_wav(1, 8, &[], &junk, &[0x80; 6], None);
        assert_eq!(parse_wav(&wav).unwrap().frames(), 6);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let wav = build_wav(1, 24, &[], &[], &[0; 6], None);
        assert_eq!(parse_wav(&wav), Err(WavError::UnsupportedBitDepth(24)));
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let wav = build_wav(2, 16, &[], &[], &pcm16(&[1000, 3000, -400, -400]), None);
        let sound = parse_wav(&wav).unwrap();
        assert_eq!(sound.channels, 2);
        assert_eq!(sound.samples, vec![1500, -300]);
    }

    #[test]
    fn test_declared_length_past_end_is_clamped() {
        let wav = build_wav(1, 8, &[], &[], &[0x80; 4], Some(1000));
        let sound = parse_wav(&wav).unwrap();
        assert!(sound.truncated);
        assert_eq!(sound.frames(), 4);
    }

    #[test]
    fn test_reads_hound_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..256i32 {
            writer.write_sample((i * 100 - 12_800) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let sound = parse_wav(&bytes).unwrap();
        assert_eq!(sound.sample_rate, 22_050);
        assert_eq!(sound.frames(), 256);
        assert_eq!(sound.samples[0], -9600);
        assert_eq!(sound.samples[255], ((25_500i32 - 12_800) * 3 / 4) as i16);
    }
}
