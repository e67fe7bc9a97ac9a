//! Voice allocation and stealing
//!
//! Selection order for a sound effect (first match wins):
//! 1. The asset is at its concurrent-play limit: take over its oldest instance.
//! 2. Any idle channel.
//! 3. The busy channel closest to finishing among those with lower priority.
//!
//! Streams use the explicit slot when it is free, then any idle channel, then
//! the channel closest to finishing regardless of priority.

use crate::channel::{ChannelPool, ChannelState, loop_point_from_request};
use crate::store::{SampleStore, SfxId};
use crate::{STREAM_BUFFER_FRAMES, STREAM_PRIORITY};

/// Choose a channel for a sound effect request
pub fn allocate_sfx(
    pool: &ChannelPool,
    store: &SampleStore,
    sound: SfxId,
    priority: u32,
) -> Option<usize> {
    let asset = store.get(sound);

    if pool.count_bound(sound) >= asset.max_concurrent_plays as usize {
        let oldest = pool
            .iter()
            .enumerate()
            .filter(|(_, c)| c.sound == Some(sound))
            .map(|(index, c)| (index, asset.play_count.wrapping_sub(c.play_index)))
            .filter(|&(_, age)| age > 0)
            .fold(None, |best: Option<(usize, u32)>, (index, age)| match best {
                Some((_, best_age)) if best_age >= age => best,
                _ => Some((index, age)),
            });
        if let Some((index, _)) = oldest {
            return Some(index);
        }
    }

    if let Some(index) = first_idle(pool) {
        return Some(index);
    }

    closest_to_finish(pool, |c| priority > c.priority)
}

/// Choose a channel for a stream request
pub fn allocate_stream(pool: &ChannelPool, hint: Option<usize>) -> Option<usize> {
    if let Some(index) = hint
        && let Some(channel) = pool.get(index)
        && (channel.is_idle() || channel.sound == Some(SfxId::STREAM))
    {
        return Some(index);
    }

    first_idle(pool).or_else(|| closest_to_finish(pool, |_| true))
}

/// Bind a channel to a sound effect and start it from the beginning
pub fn claim_sfx(
    pool: &mut ChannelPool,
    store: &mut SampleStore,
    index: usize,
    sound: SfxId,
    loop_request: u32,
    priority: u32,
) {
    let asset = store.get_mut(sound);
    let Some(channel) = pool.get_mut(index) else {
        return;
    };

    channel.state = ChannelState::PlayingSfx;
    channel.paused = false;
    channel.sound = Some(sound);
    channel.reset_position();
    channel.length = asset.length;
    channel.loop_point = loop_point_from_request(loop_request);
    channel.reset_attributes();
    channel.priority = priority;
    channel.play_index = asset.play_count;
    asset.play_count = asset.play_count.wrapping_add(1);
}

/// Bind a channel to the stream buffer in the loading state
///
/// Any other channel still bound to the stream is stopped: there is one
/// decoder and one decode buffer.
pub fn claim_stream(pool: &mut ChannelPool, index: usize, loop_frame: u32) {
    for (other, channel) in pool.iter_mut().enumerate() {
        if other != index && channel.sound == Some(SfxId::STREAM) {
            channel.stop();
        }
    }

    let Some(channel) = pool.get_mut(index) else {
        return;
    };
    channel.state = ChannelState::LoadingStream;
    channel.paused = false;
    channel.sound = Some(SfxId::STREAM);
    channel.reset_position();
    channel.length = STREAM_BUFFER_FRAMES as u32;
    channel.loop_point = (loop_frame != 0).then_some(loop_frame);
    channel.reset_attributes();
    channel.priority = STREAM_PRIORITY;
}

fn first_idle(pool: &ChannelPool) -> Option<usize> {
    pool.iter()
        .position(|c| c.is_idle() && c.sound.is_none())
}

fn closest_to_finish(
    pool: &ChannelPool,
    eligible: impl Fn(&crate::channel::Channel) -> bool,
) -> Option<usize> {
    pool.iter()
        .enumerate()
        .filter(|(_, c)| !c.is_loading() && eligible(c))
        .min_by_key(|(_, c)| c.remaining())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CHANNEL_COUNT;
    use crate::store::SfxScope;
    use nether_wav::WavSound;

    fn store_with(sounds: &[(u8, usize)]) -> SampleStore {
        let mut store = SampleStore::new();
        for (index, &(plays, len)) in sounds.iter().enumerate() {
            store.commit(
                SfxId(index as u8),
                &format!("sfx{index}.wav"),
                plays,
                SfxScope::Stage,
                WavSound {
                    samples: vec![0; len],
                    sample_rate: 44_100,
                    channels: 1,
                    bits_per_sample: 16,
                    truncated: false,
                },
            );
        }
        store
    }

    fn play(pool: &mut ChannelPool, store: &mut SampleStore, sound: SfxId, priority: u32) -> usize {
        let index = allocate_sfx(pool, store, sound, priority).expect("channel");
        claim_sfx(pool, store, index, sound, 0, priority);
        index
    }

    #[test]
    fn test_idle_channels_fill_in_order() {
        let mut pool = ChannelPool::default();
        let mut store = store_with(&[(255, 100)]);
        for expected in 0..CHANNEL_COUNT {
            assert_eq!(play(&mut pool, &mut store, SfxId(0), 1), expected);
        }
    }

    #[test]
    fn test_concurrency_limit_steals_oldest_instance() {
        let mut pool = ChannelPool::default();
        let mut store = store_with(&[(2, 100)]);

        let first = play(&mut pool, &mut store, SfxId(0), 1);
        let second = play(&mut pool, &mut store, SfxId(0), 1);
        assert_ne!(first, second);

        // Third play replaces the oldest (first) instance
        let third = play(&mut pool, &mut store, SfxId(0), 1);
        assert_eq!(third, first);
        assert_eq!(pool.get(third).unwrap().play_index, 2);

        // Now the oldest is the second instance
        assert_eq!(play(&mut pool, &mut store, SfxId(0), 1), second);
    }

    #[test]
    fn test_priority_steal_prefers_shortest_remaining() {
        let mut pool = ChannelPool::default();
        let mut store = store_with(&[(255, 1000), (255, 1000)]);
        for _ in 0..CHANNEL_COUNT {
            play(&mut pool, &mut store, SfxId(0), 1);
        }
        pool.get_mut(5).unwrap().position = 900;
        pool.get_mut(9).unwrap().position = 950;

        // Equal priority cannot steal
        assert_eq!(allocate_sfx(&pool, &store, SfxId(1), 1), None);
        // Higher priority takes the channel closest to finishing
        assert_eq!(allocate_sfx(&pool, &store, SfxId(1), 2), Some(9));
    }

    #[test]
    fn test_loading_stream_is_never_stolen() {
        let mut pool = ChannelPool::default();
        let mut store = store_with(&[(255, 1000)]);
        for _ in 0..CHANNEL_COUNT {
            play(&mut pool, &mut store, SfxId(0), 1);
        }
        claim_stream(&mut pool, 3, 0);
        pool.get_mut(3).unwrap().position = STREAM_BUFFER_FRAMES as u32;

        let stolen = allocate_stream(&pool, None).unwrap();
        assert_ne!(stolen, 3);
        assert!(allocate_sfx(&pool, &store, SfxId(0), 1000).is_some_and(|i| i != 3));
    }

    #[test]
    fn test_stream_hint_and_fallbacks() {
        let mut pool = ChannelPool::default();
        let mut store = store_with(&[(255, 1000)]);

        assert_eq!(allocate_stream(&pool, Some(4)), Some(4));
        assert_eq!(allocate_stream(&pool, Some(CHANNEL_COUNT)), Some(0));

        play(&mut pool, &mut store, SfxId(0), 1);
        // Busy hint falls back to the first idle channel
        assert_eq!(allocate_stream(&pool, Some(0)), Some(1));

        // A channel already carrying the stream can be reused in place
        claim_stream(&mut pool, 2, 0);
        assert_eq!(allocate_stream(&pool, Some(2)), Some(2));
    }

    #[test]
    fn test_claim_stream_stops_previous_stream_channel() {
        let mut pool = ChannelPool::default();
        claim_stream(&mut pool, 0, 0);
        claim_stream(&mut pool, 5, 100);

        assert!(pool.get(0).unwrap().is_idle());
        let channel = pool.get(5).unwrap();
        assert_eq!(channel.state, ChannelState::LoadingStream);
        assert_eq!(channel.loop_point, Some(100));
        assert_eq!(channel.priority, STREAM_PRIORITY);
    }
}
