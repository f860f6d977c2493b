//! Serializable settings for loading and matching storms.
//!
//! The configuration is small enough to be embedded in a JSON or TOML file
//! alongside the data it applies to.

use crate::error::{Result, StormError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use stormtrack_types::crs::Crs;

/// Storm processing configuration
///
/// # Example
///
/// ```rust
/// use stormtrack::{Config, Crs};
///
/// let config = Config::default();
/// assert_eq!(config.working_crs, Crs::Lv03);
///
/// let json = r#"{
///     "working_crs": "lv95",
///     "window_minutes": 30
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.window_minutes, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Planar reference system used for distance computations (metres)
    #[serde(default = "Config::default_working_crs")]
    pub working_crs: Crs,

    /// Reference system of coordinates read from storm files
    #[serde(default)]
    pub storm_crs: Crs,

    /// Length of the trailing window the matcher looks back over
    #[serde(default = "Config::default_window_minutes")]
    pub window_minutes: u32,

    /// Field delimiter for CSV storm files
    #[serde(default = "Config::default_csv_delimiter")]
    pub csv_delimiter: char,

    /// Planar reference system used to measure track lengths
    #[serde(default = "Config::default_track_length_crs")]
    pub track_length_crs: Crs,
}

impl Config {
    const fn default_working_crs() -> Crs {
        Crs::Lv03
    }

    const fn default_window_minutes() -> u32 {
        60
    }

    const fn default_csv_delimiter() -> char {
        ','
    }

    const fn default_track_length_crs() -> Crs {
        Crs::Lv95
    }

    pub fn with_working_crs(mut self, crs: Crs) -> Self {
        self.working_crs = crs;
        self
    }

    pub fn with_storm_crs(mut self, crs: Crs) -> Self {
        self.storm_crs = crs;
        self
    }

    pub fn with_window_minutes(mut self, minutes: u32) -> Self {
        self.window_minutes = minutes;
        self
    }

    pub fn with_csv_delimiter(mut self, delimiter: char) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn with_track_length_crs(mut self, crs: Crs) -> Self {
        self.track_length_crs = crs;
        self
    }

    /// Trailing window as a `chrono::Duration`.
    pub fn window(&self) -> Duration {
        Duration::minutes(i64::from(self.window_minutes))
    }

    /// Delimiter as the byte the CSV reader expects.
    pub fn csv_delimiter_byte(&self) -> Result<u8> {
        if !self.csv_delimiter.is_ascii() {
            return Err(StormError::InvalidInput(format!(
                "CSV delimiter must be an ASCII character, got: {:?}",
                self.csv_delimiter
            )));
        }
        Ok(self.csv_delimiter as u8)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.working_crs.is_geographic() {
            return Err(StormError::InvalidInput(format!(
                "Working CRS must be planar, got: {}",
                self.working_crs
            )));
        }

        if self.track_length_crs.is_geographic() {
            return Err(StormError::InvalidInput(format!(
                "Track length CRS must be planar, got: {}",
                self.track_length_crs
            )));
        }

        if self.window_minutes == 0 {
            return Err(StormError::InvalidInput(
                "Matching window must be at least one minute".to_string(),
            ));
        }

        self.csv_delimiter_byte()?;

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| StormError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StormError::Serialization(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_crs: Self::default_working_crs(),
            storm_crs: Crs::default(),
            window_minutes: Self::default_window_minutes(),
            csv_delimiter: Self::default_csv_delimiter(),
            track_length_crs: Self::default_track_length_crs(),
        }
    }
}
