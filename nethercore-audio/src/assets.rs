//! Asset sources
//!
//! The engine reads sound effects from `Data/SoundFX/<name>` and music from
//! `Data/Music/<name>`, relative to whatever root the source represents.

use std::io;
use std::path::PathBuf;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::{MUSIC_PATH, SFX_PATH};

/// Path of a sound effect asset
pub fn sfx_path(name: &str) -> String {
    format!("{SFX_PATH}{name}")
}

/// Path of a music asset
pub fn music_path(name: &str) -> String {
    format!("{MUSIC_PATH}{name}")
}

/// Read-only access to named assets
pub trait AssetSource: Send + Sync {
    /// Read a whole asset into memory
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Assets in a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl AssetSource for DirectorySource {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }
}

/// Assets held in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.write().insert(path.into(), bytes);
    }

    /// Builder form of [`MemorySource::insert`]
    pub fn with(self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.read().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset at {path}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_paths() {
        assert_eq!(sfx_path("Global/Jump.wav"), "Data/SoundFX/Global/Jump.wav");
        assert_eq!(music_path("GreenHill.ogg"), "Data/Music/GreenHill.ogg");
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with("Data/Music/a.ogg", vec![1, 2, 3]);
        assert_eq!(source.read("Data/Music/a.ogg").unwrap(), vec![1, 2, 3]);

        let err = source.read("Data/Music/b.ogg").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Data/SoundFX")).unwrap();
        std::fs::write(dir.path().join("Data/SoundFX/Ring.wav"), b"RIFF").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.read(&sfx_path("Ring.wav")).unwrap(), b"RIFF".to_vec());
        assert!(source.read(&sfx_path("Missing.wav")).is_err());
    }
}
