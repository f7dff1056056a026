//! Configuration file handling for barcode-studio.
//!
//! Loads configuration from `<config dir>/barcode-studio/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyzer::CropPolicy;
use crate::camera::{CameraSettings, Resolution};
use crate::codec::Decoder;
use crate::format::BarcodeFormat;

/// Configuration file structure for barcode-studio.
/// Loaded from the user config dir (or custom path via --config).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct GenerateConfig {
    #[serde(default)]
    pub format: BarcodeFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Formats the decoder looks for; empty means all
    #[serde(default = "default_formats")]
    pub formats: Vec<BarcodeFormat>,
    #[serde(default = "default_true")]
    pub try_harder: bool,
    #[serde(default = "default_true")]
    pub center_crop: bool,
    #[serde(default = "default_crop_fraction")]
    pub crop_fraction: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            try_harder: true,
            center_crop: true,
            crop_fraction: default_crop_fraction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub device: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_formats() -> Vec<BarcodeFormat> {
    BarcodeFormat::ALL.to_vec()
}

fn default_crop_fraction() -> f32 {
    0.5
}

fn default_width() -> u32 {
    Resolution::ANALYSIS.width
}

fn default_height() -> u32 {
    Resolution::ANALYSIS.height
}

fn default_fps() -> u32 {
    30
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            config.validate(&path)?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let fraction = self.scan.crop_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: format!("scan.crop_fraction must be in (0, 1], got {}", fraction),
            });
        }
        if self.camera.width == 0 || self.camera.height == 0 || self.camera.fps == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "camera width, height and fps must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Write the default config to `path`. Refuses to overwrite.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, Config::default().to_toml()?).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Decoder restricted to the configured formats.
    pub fn decoder(&self) -> Decoder {
        Decoder::new(&self.scan.formats, self.scan.try_harder)
    }

    pub fn crop_policy(&self) -> CropPolicy {
        if self.scan.center_crop {
            CropPolicy::with_center_crop(self.scan.crop_fraction)
        } else {
            CropPolicy::full_frame_only()
        }
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_index: self.camera.device,
            resolution: Resolution {
                width: self.camera.width,
                height: self.camera.height,
            },
            fps: self.camera.fps,
            ..CameraSettings::default()
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config file '{}': {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("Config file '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("barcode-studio").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".config/barcode-studio/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.generate.format, BarcodeFormat::Qr);
        assert_eq!(config.scan.formats.len(), BarcodeFormat::ALL.len());
        assert!(config.scan.try_harder);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.height, 480);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[scan]\ntry_harder = false\n").unwrap();
        assert!(!config.scan.try_harder);
        assert!(config.scan.center_crop);
        assert_eq!(config.scan.crop_fraction, 0.5);
        assert_eq!(config.camera.fps, 30);
    }

    #[test]
    fn test_crop_policy_follows_config() {
        let mut config = Config::default();
        assert_eq!(config.crop_policy(), CropPolicy::standard());
        config.scan.center_crop = false;
        assert_eq!(config.crop_policy(), CropPolicy::full_frame_only());
    }

    #[test]
    fn test_camera_settings_follow_config() {
        let mut config = Config::default();
        config.camera.device = 2;
        config.camera.width = 1280;
        config.camera.height = 720;
        let settings = config.camera_settings();
        assert_eq!(settings.device_index, 2);
        assert_eq!(settings.resolution, Resolution::HIGH);
        assert!(settings.stop_on_result);
    }

    #[test]
    fn test_default_toml_parses_back() {
        let text = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        assert!(default_path().ends_with("barcode-studio/config.toml"));
    }
}
