//! # Startup Configuration
//!
//! Loaded once at startup from a TOML file; every field has a default so a
//! missing file or empty table still yields a runnable setup.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Application configuration.
///
/// ```toml
/// tick_hz = 60
/// refresh_hz = 144
/// run_frames = 600
/// timing_logs = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhosphorConfig {
    /// Simulation ticks per second.
    pub tick_hz: u32,
    /// The headless display's pretend refresh rate.
    pub refresh_hz: u32,
    /// How many simulation ticks the demo runs before shutting down.
    pub run_frames: u64,
    /// Log per-frame timing at debug level.
    pub timing_logs: bool,
}

impl Default for PhosphorConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            refresh_hz: 60,
            run_frames: 300,
            timing_logs: false,
        }
    }
}

impl PhosphorConfig {
    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on unreadable file, bad TOML, or a zero rate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that the type system cannot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when a rate is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 {
            return Err(ConfigError::Invalid("tick_hz must be non-zero".to_string()));
        }
        if self.refresh_hz == 0 {
            return Err(ConfigError::Invalid(
                "refresh_hz must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The simulation's tick interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_hz))
    }

    /// The pretend display's refresh interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.refresh_hz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: PhosphorConfig = toml::from_str("").expect("empty toml should parse");
        assert_eq!(config.tick_hz, 60);
        assert_eq!(config.run_frames, 300);
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config: PhosphorConfig =
            toml::from_str("refresh_hz = 144\ntiming_logs = true").expect("toml should parse");
        assert_eq!(config.refresh_hz, 144);
        assert!(config.timing_logs);
        assert_eq!(config.tick_hz, 60);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(toml::from_str::<PhosphorConfig>("tick_rate = 60").is_err());
    }

    #[test]
    fn test_zero_rate_fails_validation() {
        let config: PhosphorConfig = toml::from_str("tick_hz = 0").expect("toml should parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_intervals_match_rates() {
        let config = PhosphorConfig {
            tick_hz: 100,
            refresh_hz: 50,
            ..PhosphorConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.refresh_interval(), Duration::from_millis(20));
    }
}
