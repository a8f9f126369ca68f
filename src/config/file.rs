//! Configuration file management for chatrec.
//!
//! Loads application configuration from `~/.config/chatrec/chatrec.toml`.
//! A missing file is not an error: defaults are used so the application runs
//! without any configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio input device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `chatrec list-devices`
    /// - device name from `chatrec list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested recording sample rate in Hz. The device's native rate is
    /// used when it differs.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    44_100
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatrecConfig {
    #[serde(default)]
    pub audio: AudioConfig,
}

impl ChatrecConfig {
    /// Loads configuration from the default location.
    ///
    /// Returns defaults when the config file does not exist.
    ///
    /// # Errors
    /// - If the home directory cannot be determined
    /// - If the file exists but cannot be read or parsed
    pub fn load() -> Result<Self, anyhow::Error> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path, falling back to defaults
    /// when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, anyhow::Error> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;

        Ok(config)
    }

    /// Returns the default config file path: `~/.config/chatrec/chatrec.toml`.
    pub fn config_path() -> Result<PathBuf, anyhow::Error> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("chatrec").join("chatrec.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChatrecConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.sample_rate, 44_100);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatrec.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[audio]\ndevice = \"2\"").unwrap();

        let config = ChatrecConfig::load_from(&path).unwrap();
        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.sample_rate, 44_100);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatrec.toml");
        fs::write(&path, "audio = not toml").unwrap();

        assert!(ChatrecConfig::load_from(&path).is_err());
    }
}
