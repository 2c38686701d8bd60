//! Host configuration for Vision Assistant
//!
//! Describes where the analysis service lives, which locale and timing
//! the speech channel uses, and the hints passed to the camera. Stored in
//! `~/.vision-assistant/config.json`; every field has a default so a
//! partial file is valid. User preferences live in [`crate::settings`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Remote analysis service
    pub service: ServiceConfig,
    /// Speech channel parameters
    pub speech: SpeechConfig,
    /// Camera acquisition hints and snapshot encoding
    pub camera: CameraConfig,
}

/// Remote analysis service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Service origin (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Path segment under which the analysis endpoints are mounted
    pub api_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_path: "api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Speech channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechConfig {
    /// BCP 47 locale for every utterance
    pub locale: String,
    /// Delay between showing a result and speaking it (milliseconds)
    pub result_delay_ms: u64,
    /// Delay between cancelling speech and replaying a result (milliseconds)
    pub restart_delay_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "tr-TR".to_string(),
            result_delay_ms: 500,
            restart_delay_ms: 100,
        }
    }
}

impl SpeechConfig {
    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

/// Preferred camera direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// Rear camera, pointing away from the user
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub facing: CameraFacing,
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// JPEG quality for stream snapshots (1-100)
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
            jpeg_quality: 90,
        }
    }
}

/// Get the path to the config file (~/.vision-assistant/config.json)
pub fn get_config_path() -> PathBuf {
    crate::storage::data_dir().join("config.json")
}

/// Load configuration from `path`
///
/// A missing file yields defaults. A file that cannot be parsed is
/// logged and replaced by defaults; only I/O errors other than
/// "not found" are returned.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::info!("Config file not found at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    match serde_json::from_str::<AppConfig>(&contents) {
        Ok(config) => {
            tracing::info!("Config loaded from {:?}", path);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to parse config, using defaults: {}", e);
            Ok(AppConfig::default())
        }
    }
}

/// Save configuration to `path`, creating the parent directory if needed
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(config).context("Failed to serialise config")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_defaults() {
        let service = ServiceConfig::default();
        assert_eq!(service.base_url, "http://localhost:8000");
        assert_eq!(service.api_path, "api");
        assert_eq!(service.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_speech_config_defaults() {
        let speech = SpeechConfig::default();
        assert_eq!(speech.locale, "tr-TR");
        assert_eq!(speech.result_delay(), Duration::from_millis(500));
        assert_eq!(speech.restart_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_camera_config_defaults() {
        let camera = CameraConfig::default();
        assert_eq!(camera.facing, CameraFacing::Environment);
        assert_eq!((camera.ideal_width, camera.ideal_height), (1920, 1080));
        assert_eq!(camera.jpeg_quality, 90);
    }

    #[test]
    fn test_partial_config_deserialisation() {
        let json = r#"{"service": {"baseUrl": "http://10.0.0.2:9000"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.service.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.service.api_path, "api");
        assert_eq!(config.speech.locale, "tr-TR");
    }

    #[test]
    fn test_camera_facing_serialisation() {
        assert_eq!(
            serde_json::to_string(&CameraFacing::Environment).unwrap(),
            "\"environment\""
        );
        assert_eq!(
            serde_json::from_str::<CameraFacing>("\"user\"").unwrap(),
            CameraFacing::User
        );
    }

    #[test]
    fn test_config_path_format() {
        let path = get_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains(".vision-assistant"));
        assert!(path_str.ends_with("config.json"));
    }
}
