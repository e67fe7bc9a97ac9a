//! Sample store: fixed-capacity table of loaded sound effects
//!
//! Slot [`STREAM_SLOT`] is reserved for the music stream's decode buffer. It is
//! created with the store, is always global-scoped, and no clear operation
//! ever touches it.

use nether_wav::WavSound;
use xxhash_rust::xxh3::xxh3_128;

use crate::{SFX_COUNT, STREAM_BUFFER_FRAMES, STREAM_SLOT};

/// Handle to a sample store slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SfxId(pub u8);

impl SfxId {
    /// The reserved stream buffer slot
    pub const STREAM: SfxId = SfxId(STREAM_SLOT as u8);

    /// Slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lifetime category of a loaded sound effect
///
/// Ordered: `None < Global < Stage`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SfxScope {
    /// Slot is empty
    #[default]
    None,
    /// Lives until a global clear
    Global,
    /// Lives until the current stage is unloaded
    Stage,
}

/// One loaded sound effect
#[derive(Clone, Debug, Default)]
pub struct SampleAsset {
    /// Asset name as requested by the game
    pub name: String,
    /// Identity hash of the name
    pub hash: u128,
    /// Lifetime scope (None = empty slot)
    pub scope: SfxScope,
    /// Maximum simultaneous channels for this asset
    pub max_concurrent_plays: u8,
    /// Incremented on every play; stamped into the channel as its play index
    pub play_count: u32,
    /// Internal PCM (mono for effects, interleaved stereo for the stream slot)
    pub buffer: Vec<i16>,
    /// Playable length in frames
    pub length: u32,
}

impl SampleAsset {
    /// True when the slot holds nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scope == SfxScope::None
    }
}

/// Identity hash used for store lookups
#[inline]
pub fn asset_hash(name: &str) -> u128 {
    xxh3_128(name.as_bytes())
}

/// Fixed table of sound effect slots plus the reserved stream buffer
#[derive(Debug)]
pub struct SampleStore {
    slots: Vec<SampleAsset>,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore {
    /// Create an empty store with the stream slot initialised
    pub fn new() -> Self {
        let mut slots = vec![SampleAsset::default(); SFX_COUNT];
        slots[STREAM_SLOT] = SampleAsset {
            name: "<stream>".to_string(),
            hash: 0,
            scope: SfxScope::Global,
            max_concurrent_plays: 1,
            play_count: 0,
            buffer: vec![0; STREAM_BUFFER_FRAMES * 2],
            length: STREAM_BUFFER_FRAMES as u32,
        };
        Self { slots }
    }

    /// Asset in a slot
    #[inline]
    pub fn get(&self, id: SfxId) -> &SampleAsset {
        &self.slots[id.index()]
    }

    /// Mutable asset in a slot
    #[inline]
    pub fn get_mut(&mut self, id: SfxId) -> &mut SampleAsset {
        &mut self.slots[id.index()]
    }

    /// True when the slot holds a playable sound effect
    pub fn is_loaded(&self, id: SfxId) -> bool {
        id != SfxId::STREAM && !self.get(id).is_empty()
    }

    /// Find a loaded sound effect by name
    pub fn find(&self, name: &str) -> Option<SfxId> {
        let hash = asset_hash(name);
        self.slots
            .iter()
            .enumerate()
            .take(STREAM_SLOT)
            .find(|(_, asset)| !asset.is_empty() && asset.hash == hash)
            .map(|(index, _)| SfxId(index as u8))
    }

    /// First empty slot, never the stream slot
    pub fn free_slot(&self) -> Option<SfxId> {
        self.slots
            .iter()
            .take(STREAM_SLOT)
            .position(SampleAsset::is_empty)
            .map(|index| SfxId(index as u8))
    }

    /// Commit a decoded sound into a slot
    ///
    /// Called only after ingestion succeeded, so a failed load never leaves a
    /// half-initialised slot marked as valid.
    pub fn commit(
        &mut self,
        id: SfxId,
        name: &str,
        max_concurrent_plays: u8,
        scope: SfxScope,
        sound: WavSound,
    ) {
        debug_assert!(id != SfxId::STREAM, "stream slot cannot hold an effect");
        let length = sound.samples.len() as u32;
        self.slots[id.index()] = SampleAsset {
            name: name.to_string(),
            hash: asset_hash(name),
            scope,
            max_concurrent_plays,
            play_count: 0,
            buffer: sound.samples,
            length,
        };
    }

    /// Reset every slot matching `predicate`, skipping the stream slot
    ///
    /// Returns the ids that were cleared.
    pub fn clear_where(&mut self, predicate: impl Fn(SfxScope) -> bool) -> Vec<SfxId> {
        let mut cleared = Vec::new();
        for (index, asset) in self.slots.iter_mut().enumerate().take(STREAM_SLOT) {
            if !asset.is_empty() && predicate(asset.scope) {
                *asset = SampleAsset::default();
                cleared.push(SfxId(index as u8));
            }
        }
        cleared
    }

    /// The stream decode buffer (interleaved stereo)
    #[inline]
    pub fn stream_buffer(&self) -> &[i16] {
        &self.slots[STREAM_SLOT].buffer
    }

    /// Mutable stream decode buffer
    #[inline]
    pub fn stream_buffer_mut(&mut self) -> &mut [i16] {
        &mut self.slots[STREAM_SLOT].buffer
    }

    /// Number of occupied effect slots
    pub fn loaded_count(&self) -> usize {
        self.slots
            .iter()
            .take(STREAM_SLOT)
            .filter(|asset| !asset.is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound(samples: Vec<i16>) -> WavSound {
        WavSound {
            samples,
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            truncated: false,
        }
    }

    #[test]
    fn test_stream_slot_is_reserved() {
        let store = SampleStore::new();
        let stream = store.get(SfxId::STREAM);
        assert_eq!(stream.scope, SfxScope::Global);
        assert_eq!(stream.max_concurrent_plays, 1);
        assert_eq!(stream.length as usize, STREAM_BUFFER_FRAMES);
        assert_eq!(store.stream_buffer().len(), STREAM_BUFFER_FRAMES * 2);
        assert!(!store.is_loaded(SfxId::STREAM));
        assert_eq!(store.loaded_count(), 0);
    }

    #[test]
    fn test_commit_and_find() {
        let mut store = SampleStore::new();
        let id = store.free_slot().unwrap();
        assert_eq!(id, SfxId(0));

        store.commit(id, "Jump.wav", 2, SfxScope::Stage, sound(vec![1, 2, 3]));
        assert!(store.is_loaded(id));
        assert_eq!(store.get(id).length, 3);
        assert_eq!(store.find("Jump.wav"), Some(id));
        assert_eq!(store.find("Ring.wav"), None);
        assert_eq!(store.free_slot(), Some(SfxId(1)));
    }

    #[test]
    fn test_scope_ordering() {
        assert!(SfxScope::None < SfxScope::Global);
        assert!(SfxScope::Global < SfxScope::Stage);
    }

    #[test]
    fn test_clear_never_touches_stream_slot() {
        let mut store = SampleStore::new();
        store.commit(SfxId(0), "a.wav", 1, SfxScope::Global, sound(vec![1]));
        store.commit(SfxId(1), "b.wav", 1, SfxScope::Stage, sound(vec![1]));

        let cleared = store.clear_where(|scope| scope >= SfxScope::Global);
        assert_eq!(cleared, vec![SfxId(0), SfxId(1)]);
        assert_eq!(store.get(SfxId::STREAM).scope, SfxScope::Global);
        assert_eq!(store.stream_buffer().len(), STREAM_BUFFER_FRAMES * 2);
    }

    #[test]
    fn test_full_store_has_no_free_slot() {
        let mut store = SampleStore::new();
        for index in 0..STREAM_SLOT {
            store.commit(
                SfxId(index as u8),
                &format!("sfx{index}.wav"),
                1,
                SfxScope::Global,
                sound(vec![0]),
            );
        }
        assert_eq!(store.free_slot(), None);
    }
}
