//! RIFF/WAVE parser and sample converter

use crate::{
    BITS_OFFSET, CHANNELS_OFFSET, DATA_CHUNK_ID, DATA_SCAN_STEP, DATA_SCAN_STEPS,
    FMT_DATA_OFFSET, FMT_SIZE_OFFSET, LEGACY_DATA_OFFSET, RIFF_SIGNATURE, SAMPLE_RATE_OFFSET,
    WavError, WavSound,
};

#[inline]
fn read_tag(bytes: &[u8], offset: usize) -> Result<[u8; 4], WavError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| [b[0], b[1], b[2], b[3]])
        .ok_or(WavError::Truncated(offset))
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, WavError> {
    read_tag(bytes, offset).map(u32::from_le_bytes)
}

#[inline]
fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, WavError> {
    bytes
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(WavError::Truncated(offset))
}

/// Find the "data" chunk id, returning its offset
///
/// Scans forward from `start` in 4-byte steps for at most [`DATA_SCAN_STEPS`]
/// steps, then checks the single legacy position.
fn find_data_chunk(bytes: &[u8], start: usize) -> Option<usize> {
    let is_data = |offset: usize| bytes.get(offset..offset + 4) == Some(&DATA_CHUNK_ID[..]);

    (0..DATA_SCAN_STEPS)
        .map(|step| start + step * DATA_SCAN_STEP)
        .find(|&offset| is_data(offset))
        .or_else(|| Some(start + LEGACY_DATA_OFFSET).filter(|&offset| is_data(offset)))
}

/// 8-bit unsigned PCM to internal signed 16-bit
#[inline]
fn convert_u8(sample: u8) -> i32 {
    (sample as i32 - 128) << 8
}

/// 16-bit PCM to internal signed 16-bit with the load-time 3/4 attenuation
///
/// The raw value is read unsigned and values above the signed maximum are
/// folded into the negative range.
#[inline]
fn convert_u16(raw: u16) -> i32 {
    let mut sample = raw as i32;
    if sample > 0x7FFF {
        sample = (sample & 0x7FFF) - 0x8000;
    }
    sample * 3 / 4
}

/// Parse a RIFF/WAVE buffer into mono internal samples
///
/// # Errors
/// Returns `WavError` for a bad signature, a truncated header, a missing
/// data chunk, a zero channel count or a bit depth other than 8/16.
pub fn parse_wav(bytes: &[u8]) -> Result<WavSound, WavError> {
    if read_tag(bytes, 0)? != RIFF_SIGNATURE {
        return Err(WavError::InvalidSignature);
    }

    let fmt_size = read_u32(bytes, FMT_SIZE_OFFSET)? as usize;
    let channels = read_u16(bytes, CHANNELS_OFFSET)?;
    let sample_rate = read_u32(bytes, SAMPLE_RATE_OFFSET)?;
    let bits_per_sample = read_u16(bytes, BITS_OFFSET)?;

    if channels == 0 {
        return Err(WavError::InvalidChannelCount);
    }
    if bits_per_sample != 8 && bits_per_sample != 16 {
        return Err(WavError::UnsupportedBitDepth(bits_per_sample));
    }

    let scan_start = FMT_DATA_OFFSET.saturating_add(fmt_size);
    let data_offset = find_data_chunk(bytes, scan_start).ok_or(WavError::MissingDataChunk)?;

    let declared_len = read_u32(bytes, data_offset + 4)? as usize;
    let payload = bytes.get(data_offset + 8..).unwrap_or(&[]);
    let truncated = declared_len > payload.len();
    let payload = &payload[..declared_len.min(payload.len())];

    let raw: Vec<i32> = if bits_per_sample == 8 {
        payload.iter().map(|&b| convert_u8(b)).collect()
    } else {
        payload
            .chunks_exact(2)
            .map(|b| convert_u16(u16::from_le_bytes([b[0], b[1]])))
            .collect()
    };

    let samples = if channels == 1 {
        raw.into_iter().map(|s| s as i16).collect()
    } else {
        raw.chunks_exact(channels as usize)
            .map(|frame| (frame.iter().sum::<i32>() / channels as i32) as i16)
            .collect()
    };

    Ok(WavSound {
        samples,
        sample_rate,
        channels,
        bits_per_sample,
        truncated,
    })
}
