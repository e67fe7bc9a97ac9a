//! Per-channel mixing: gains, resampling, loop wrap and output clamp

use crate::FIXED_SHIFT;
use crate::channel::{Channel, to_fixed};
use crate::stream::StreamRefill;

/// Left/right gains in 16.16 fixed point
pub type Gains = (i32, i32);

/// Linear stereo gains for a channel
///
/// The side the sound is panned away from is attenuated, the other side
/// keeps the full volume. Both are scaled by the category master volume.
#[inline]
pub fn stereo_gains(volume: f32, pan: f32, master: f32) -> Gains {
    let (left, right) = if pan < 0.0 {
        (volume, (1.0 + pan) * volume)
    } else {
        ((1.0 - pan) * volume, volume)
    };
    (to_fixed(left * master), to_fixed(right * master))
}

#[inline]
fn accumulate(acc: &mut [i32], frame: usize, left: i32, right: i32, (gain_l, gain_r): Gains) {
    acc[frame * 2] += ((i64::from(left) * i64::from(gain_l)) >> FIXED_SHIFT) as i32;
    acc[frame * 2 + 1] += ((i64::from(right) * i64::from(gain_r)) >> FIXED_SHIFT) as i32;
}

/// Mix a sound effect channel into `acc` (interleaved stereo)
///
/// Reads mono `samples` with linear interpolation. When the cursor reaches
/// the end the channel either wraps to its loop point or stops, in which
/// case the rest of the block is left silent.
pub fn mix_sfx(channel: &mut Channel, samples: &[i16], gains: Gains, acc: &mut [i32]) {
    let length = channel.length.min(samples.len() as u32);
    if length == 0 {
        channel.stop();
        return;
    }

    for frame in 0..acc.len() / 2 {
        let pos = channel.position as usize;
        let s0 = i32::from(samples[pos]);
        let s1 = if pos + 1 < length as usize {
            i32::from(samples[pos + 1])
        } else {
            s0
        };
        let sample =
            s0 + ((i64::from(s1 - s0) * i64::from(channel.frac())) >> FIXED_SHIFT) as i32;
        accumulate(acc, frame, sample, sample, gains);

        channel.position += channel.step();
        if channel.position >= length {
            let Some(loop_point) = channel.loop_point else {
                channel.stop();
                return;
            };
            let offset = if loop_point < length { loop_point } else { 0 };
            while channel.position >= length {
                channel.position = channel.position - length + offset;
            }
        }
    }
}

/// Mix the stream channel into `acc` from the interleaved stereo `buffer`
///
/// Nearest-sample playback. Running off the end of the buffer refills it
/// and wraps the cursor; a refill that ends the stream silences the rest
/// of the block.
pub fn mix_stream(
    channel: &mut Channel,
    stream: &mut StreamRefill,
    buffer: &mut [i16],
    gains: Gains,
    acc: &mut [i32],
) {
    let length = channel.length.min((buffer.len() / 2) as u32);
    if length == 0 {
        channel.stop();
        return;
    }

    for frame in 0..acc.len() / 2 {
        let pos = channel.position as usize * 2;
        accumulate(
            acc,
            frame,
            i32::from(buffer[pos]),
            i32::from(buffer[pos + 1]),
            gains,
        );

        channel.position += channel.step();
        if channel.position >= length {
            stream.refill(channel, buffer);
            if channel.is_idle() {
                return;
            }
            channel.position %= length;
        }
    }
}

/// Clamp accumulated samples to the signed 16-bit range
pub fn clamp_into(acc: &[i32], out: &mut [i16]) {
    for (dst, &src) in out.iter_mut().zip(acc) {
        *dst = src.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
    }
}
