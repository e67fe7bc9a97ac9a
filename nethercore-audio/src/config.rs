//! Audio configuration (`audio.toml`)
//!
//! Missing fields fall back to their defaults, so an empty file is a valid
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Config file name inside the platform config directory
pub const CONFIG_FILE: &str = "audio.toml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sound effect master volume (default: 1.0, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub sfx_volume: f32,
    /// Music stream master volume (default: 1.0, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub stream_volume: f32,
    /// Whether music streams may play at all (default: true)
    #[serde(default = "default_true")]
    pub streams_enabled: bool,
    /// Whether stream loads may run on a background thread (default: true)
    #[serde(default = "default_true")]
    pub async_stream_loading: bool,
    /// Directory holding `Data/SoundFX` and `Data/Music` (default: ".")
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
}

fn default_volume() -> f32 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_asset_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sfx_volume: default_volume(),
            stream_volume: default_volume(),
            streams_enabled: default_true(),
            async_stream_loading: default_true(),
            asset_root: default_asset_root(),
        }
    }
}

impl AudioConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, AudioError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, AudioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `audio.toml` from the platform config directory
    ///
    /// Returns defaults if the directory is unknown or the file is missing
    /// or malformed.
    pub fn load_or_default() -> Self {
        config_path()
            .and_then(|path| Self::load(&path).ok())
            .unwrap_or_default()
    }

    /// Write the config as pretty TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), AudioError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Returns the platform-specific path of `audio.toml`
///
/// On Linux: `~/.config/Nethercore/audio.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "Nethercore")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = AudioConfig::default();
        assert_eq!(config.sfx_volume, 1.0);
        assert_eq!(config.stream_volume, 1.0);
        assert!(config.streams_enabled);
        assert!(config.async_stream_loading);
        assert_eq!(config.asset_root, PathBuf::from("."));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(
            AudioConfig::from_toml_str("").unwrap(),
            AudioConfig::default()
        );
    }

    #[test]
    fn test_partial_document() {
        let config = AudioConfig::from_toml_str(
            r#"
            stream_volume = 0.25
            streams_enabled = false
            asset_root = "/games/sonic"
            "#,
        )
        .unwrap();
        assert_eq!(config.sfx_volume, 1.0);
        assert_eq!(config.stream_volume, 0.25);
        assert!(!config.streams_enabled);
        assert!(config.async_stream_loading);
        assert_eq!(config.asset_root, PathBuf::from("/games/sonic"));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let err = AudioConfig::from_toml_str("sfx_volume = \"loud\"").unwrap_err();
        assert!(matches!(err, AudioError::Config(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = AudioConfig {
            sfx_volume: 0.5,
            async_stream_loading: false,
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AudioConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AudioConfig::load(&dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, AudioError::Io(_)));
    }

    #[test]
    fn test_config_path_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with(CONFIG_FILE));
        }
    }
}
