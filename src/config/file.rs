//! Configuration file management for trackdown.
//!
//! Loads application configuration from a TOML file in the user's config
//! directory. A missing file simply means defaults; every field has one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use: "default", a numeric index from
    /// `trackdown list-devices`, or a device name
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested recording sample rate in Hz
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

/// Recognition service endpoint configuration.
///
/// The API key itself is not stored here; it comes from the environment
/// (see `config::credentials`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Recognition endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Value for the X-RapidAPI-Host header
    #[serde(default = "default_api_host")]
    pub api_host: String,
}

fn default_endpoint() -> String {
    "https://shazam-api-free.p.rapidapi.com/shazam/recognize/".to_string()
}

fn default_api_host() -> String {
    "shazam-api-free.p.rapidapi.com".to_string()
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_host: default_api_host(),
        }
    }
}

/// Download step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Initial state of the download toggle in the surface
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory downloaded songs are saved into
    #[serde(default = "default_download_dir")]
    pub directory: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloaded_songs")
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_download_dir(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackdownConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl TrackdownConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// Returns defaults when the file does not exist.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the file exists but cannot be read or is malformed TOML
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: TrackdownConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Retrieves the path to the config file, creating the directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
    })?;
    let config_path = home
        .join(".config")
        .join("trackdown")
        .join("trackdown.toml");

    std::fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: TrackdownConfig = toml::from_str("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.sample_rate, 44_100);
        assert!(config.download.enabled);
        assert_eq!(config.download.directory, PathBuf::from("downloaded_songs"));
        assert_eq!(
            config.recognition.api_host,
            "shazam-api-free.p.rapidapi.com"
        );
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let config: TrackdownConfig = toml::from_str(
            r#"
            [audio]
            device = "2"

            [download]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.sample_rate, 44_100);
        assert!(!config.download.enabled);
        assert_eq!(config.download.directory, PathBuf::from("downloaded_songs"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = TrackdownConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let reparsed: TrackdownConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(reparsed.recognition.endpoint, config.recognition.endpoint);
    }
}
