use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables shared by every command, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JPEG quality used when re-encoding images (1-100).
    pub image_quality: u8,
    /// Target video bitrate passed to ffmpeg as `-b:v`.
    pub video_bitrate: String,
    /// ffmpeg executable name or path.
    pub ffmpeg: String,
    /// Appended to the file stem of page-removal outputs.
    pub modified_suffix: String,
    /// Appended to the file stem of compression outputs.
    pub compressed_suffix: String,
    /// Prepended to the file name of decrypted copies.
    pub unlocked_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_quality: 50,
            video_bitrate: "800k".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            modified_suffix: "_modified".to_string(),
            compressed_suffix: "_compressed".to_string(),
            unlocked_prefix: "unlocked_".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_toolkit_conventions() {
        let cfg = Config::default();
        assert_eq!(cfg.image_quality, 50);
        assert_eq!(cfg.video_bitrate, "800k");
        assert_eq!(cfg.modified_suffix, "_modified");
        assert_eq!(cfg.compressed_suffix, "_compressed");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("officium.json");
        std::fs::write(&path, r#"{ "image_quality": 80, "ffmpeg": "/opt/ffmpeg" }"#).unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.image_quality, 80);
        assert_eq!(cfg.ffmpeg, "/opt/ffmpeg");
        assert_eq!(cfg.video_bitrate, "800k");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.json"))).is_err());
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}
