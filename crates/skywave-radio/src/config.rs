//! Radio stack configuration.
//!
//! A small TOML-backed config covering the knobs the enclosing client
//! exposes: radio count, channel split, stream cache timeout, maintenance
//! cadence, microphone volume and the sample-bed directory. Every field has
//! a default, so an empty file (or no file at all) is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the radio mixer and its maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Number of radio slots.
    pub radio_count: usize,
    /// Render radio 0 left and radio 1 right instead of a mono mix.
    pub split_channels: bool,
    /// Idle time after which a remote voice stream is evicted, in ms.
    pub cache_timeout_ms: u64,
    /// Cadence of the maintenance sweep, in ms.
    pub maintenance_interval_ms: u64,
    /// Microphone volume multiplier.
    pub microphone_volume: f32,
    /// Directory holding the effect sample beds (WAV files).
    pub resource_dir: Option<PathBuf>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            radio_count: 2,
            split_channels: false,
            cache_timeout_ms: 300,
            maintenance_interval_ms: 30_000,
            microphone_volume: 1.0,
            resource_dir: None,
        }
    }
}

impl RadioConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radio_count == 0 {
            return Err(ConfigError::Invalid("radio_count must be at least 1".into()));
        }
        if self.cache_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache_timeout_ms must be at least 1".into(),
            ));
        }
        if self.maintenance_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "maintenance_interval_ms must be at least 1".into(),
            ));
        }
        if !(0.0..=4.0).contains(&self.microphone_volume) {
            return Err(ConfigError::Invalid(
                "microphone_volume must be in [0.0, 4.0]".into(),
            ));
        }
        Ok(())
    }

    /// The stream cache timeout as a [`Duration`].
    #[must_use]
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// The maintenance interval as a [`Duration`].
    #[must_use]
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_millis(self.maintenance_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RadioConfig::default();
        config.validate().unwrap();
        assert_eq!(config.radio_count, 2);
        assert_eq!(config.cache_timeout(), Duration::from_millis(300));
        assert_eq!(config.maintenance_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "radio_count = 4\nsplit_channels = true").unwrap();

        let config = RadioConfig::load(file.path()).unwrap();
        assert_eq!(config.radio_count, 4);
        assert!(config.split_channels);
        assert_eq!(config.cache_timeout_ms, 300);
    }

    #[test]
    fn test_zero_radios_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "radio_count = 0").unwrap();
        assert!(matches!(
            RadioConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RadioConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let config = RadioConfig {
            radio_count: 3,
            resource_dir: Some(PathBuf::from("/tmp/beds")),
            ..RadioConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: RadioConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.radio_count, 3);
        assert_eq!(parsed.resource_dir, config.resource_dir);
    }
}
