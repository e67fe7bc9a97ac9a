//! Channel pool: fixed array of voice slots
//!
//! A channel never owns sample memory. It holds the id of the store slot it
//! reads from (`sound`), and the mixer resolves that id against the sample
//! store every block.

use crate::store::SfxId;
use crate::{CHANNEL_COUNT, FIXED_ONE, FIXED_SHIFT};

/// Playback state of a channel
///
/// Pausing is tracked separately in [`Channel::paused`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Not playing anything
    #[default]
    Idle,
    /// Playing a sound effect from the sample store
    PlayingSfx,
    /// Playing the decoded music stream
    PlayingStream,
    /// Claimed for a stream whose decoder is still being opened
    LoadingStream,
}

/// Loop behavior when playback reaches the end of the buffer
///
/// `None` is the "no loop" sentinel: the channel goes idle at the end.
pub type LoopPoint = Option<u32>;

/// Decode a play request's loop argument
///
/// `0` plays once, `1` loops to frame 0, anything larger loops to that frame.
#[inline]
pub fn loop_point_from_request(request: u32) -> LoopPoint {
    match request {
        0 => None,
        1 => Some(0),
        frame => Some(frame),
    }
}

/// Clamp a float value, treating NaN as the minimum value
#[inline]
pub(crate) fn clamp_safe(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Convert a real value to 16.16 fixed point (saturating)
#[inline]
pub(crate) fn to_fixed(value: f32) -> i32 {
    (value * FIXED_ONE as f32) as i32
}

/// One voice slot
#[derive(Clone, Debug)]
pub struct Channel {
    /// Current playback state
    pub state: ChannelState,
    /// Paused on top of `state` (paused channels neither mix nor advance)
    pub paused: bool,
    /// Store slot this channel reads from
    pub sound: Option<SfxId>,
    /// Read cursor in sample frames
    pub position: u32,
    /// Sub-frame phase accumulator (low 16 bits used)
    pub phase: u32,
    /// Playable length of the bound buffer in frames
    pub length: u32,
    /// Loop target (None = stop at the end)
    pub loop_point: LoopPoint,
    /// Volume (0.0 to 4.0)
    pub volume: f32,
    /// Pan (-1.0 = left, 0.0 = center, 1.0 = right)
    pub pan: f32,
    /// Playback speed, 16.16 fixed point (`FIXED_ONE` = unity)
    pub speed: i32,
    /// Request priority, used when stealing busy channels
    pub priority: u32,
    /// Value of the asset's play counter when this instance started
    pub play_index: u32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            state: ChannelState::Idle,
            paused: false,
            sound: None,
            position: 0,
            phase: 0,
            length: 0,
            loop_point: None,
            volume: 1.0,
            pan: 0.0,
            speed: FIXED_ONE,
            priority: 0,
            play_index: 0,
        }
    }
}

impl Channel {
    /// True when the channel is idle
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == ChannelState::Idle
    }

    /// True while a stream load owns this channel
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.state == ChannelState::LoadingStream
    }

    /// True when the channel should be mixed this block
    #[inline]
    pub fn is_audible(&self) -> bool {
        !self.paused
            && matches!(
                self.state,
                ChannelState::PlayingSfx | ChannelState::PlayingStream
            )
    }

    /// Frames left before the end of the bound buffer (0 when idle)
    #[inline]
    pub fn remaining(&self) -> u32 {
        if self.is_idle() {
            0
        } else {
            self.length.saturating_sub(self.position)
        }
    }

    /// Rewind the playhead to the start of the buffer
    #[inline]
    pub fn reset_position(&mut self) {
        self.position = 0;
        self.phase = 0;
    }

    /// Release the channel back to idle
    pub fn stop(&mut self) {
        self.state = ChannelState::Idle;
        self.paused = false;
        self.sound = None;
        self.reset_position();
    }

    /// Reset volume, pan and speed to their play-start defaults
    pub fn reset_attributes(&mut self) {
        self.volume = 1.0;
        self.pan = 0.0;
        self.speed = FIXED_ONE;
    }

    /// Apply volume/pan/speed with clamping
    ///
    /// Volume is clamped to [0, 4], pan to [-1, 1]. A positive speed sets
    /// the fixed-point ratio; zero, negative and NaN speeds are ignored.
    pub fn set_attributes(&mut self, volume: f32, pan: f32, speed: f32) {
        self.volume = clamp_safe(volume, 0.0, 4.0);
        self.pan = clamp_safe(pan, -1.0, 1.0);

        if speed == 1.0 {
            self.speed = FIXED_ONE;
        } else if speed > 0.0 {
            self.speed = to_fixed(speed).max(1);
        }
    }

    /// Advance the phase accumulator by one output frame
    ///
    /// Returns the number of whole source frames to move the cursor.
    #[inline]
    pub(crate) fn step(&mut self) -> u32 {
        self.phase += self.speed as u32;
        let advance = self.phase >> FIXED_SHIFT;
        self.phase &= (FIXED_ONE - 1) as u32;
        advance
    }

    /// Fractional part of the phase accumulator (0..FIXED_ONE)
    #[inline]
    pub(crate) fn frac(&self) -> i32 {
        self.phase as i32
    }
}

/// The fixed set of channels shared by sound effects and the music stream
#[derive(Clone, Debug, Default)]
pub struct ChannelPool {
    channels: [Channel; CHANNEL_COUNT],
}

impl ChannelPool {
    /// Channel by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Mutable channel by index
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    /// Iterate channels in index order
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Iterate channels mutably in index order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.iter_mut()
    }

    /// Number of channels bound to `sound`
    pub fn count_bound(&self, sound: SfxId) -> usize {
        self.channels
            .iter()
            .filter(|c| c.sound == Some(sound))
            .count()
    }

    /// Stop every channel bound to `sound`
    pub fn stop_bound(&mut self, sound: SfxId) {
        for channel in self.channels.iter_mut().filter(|c| c.sound == Some(sound)) {
            channel.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_point_encoding() {
        assert_eq!(loop_point_from_request(0), None);
        assert_eq!(loop_point_from_request(1), Some(0));
        assert_eq!(loop_point_from_request(2), Some(2));
        assert_eq!(loop_point_from_request(4410), Some(4410));
    }

    #[test]
    fn test_attribute_clamping() {
        let mut channel = Channel::default();

        channel.set_attributes(10.0, -3.0, 1.0);
        assert_eq!(channel.volume, 4.0);
        assert_eq!(channel.pan, -1.0);

        channel.set_attributes(-1.0, 2.0, 1.0);
        assert_eq!(channel.volume, 0.0);
        assert_eq!(channel.pan, 1.0);

        channel.set_attributes(f32::NAN, f32::NAN, 1.0);
        assert_eq!(channel.volume, 0.0);
        assert_eq!(channel.pan, -1.0);

        channel.set_attributes(f32::INFINITY, f32::NEG_INFINITY, 1.0);
        assert_eq!(channel.volume, 4.0);
        assert_eq!(channel.pan, -1.0);
    }

    #[test]
    fn test_speed_conversion() {
        let mut channel = Channel::default();

        channel.set_attributes(1.0, 0.0, 0.5);
        assert_eq!(channel.speed, FIXED_ONE / 2);

        // Non-positive and NaN speeds keep the previous ratio
        channel.set_attributes(1.0, 0.0, 0.0);
        assert_eq!(channel.speed, FIXED_ONE / 2);
        channel.set_attributes(1.0, 0.0, f32::NAN);
        assert_eq!(channel.speed, FIXED_ONE / 2);

        channel.set_attributes(1.0, 0.0, 1.0);
        assert_eq!(channel.speed, FIXED_ONE);
    }

    #[test]
    fn test_step_accumulates_fraction() {
        let mut channel = Channel {
            speed: FIXED_ONE / 2,
            ..Default::default()
        };
        assert_eq!(channel.step(), 0);
        assert_eq!(channel.frac(), FIXED_ONE / 2);
        assert_eq!(channel.step(), 1);
        assert_eq!(channel.frac(), 0);

        channel.speed = FIXED_ONE * 2 + FIXED_ONE / 4;
        assert_eq!(channel.step(), 2);
        assert_eq!(channel.frac(), FIXED_ONE / 4);
    }

    #[test]
    fn test_remaining_is_zero_when_idle() {
        let mut channel = Channel {
            state: ChannelState::PlayingSfx,
            length: 100,
            position: 40,
            ..Default::default()
        };
        assert_eq!(channel.remaining(), 60);
        channel.stop();
        assert_eq!(channel.remaining(), 0);
    }
}
