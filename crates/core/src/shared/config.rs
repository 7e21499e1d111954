use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DETECTION_QUEUE_CAPACITY,
    DEFAULT_DETECTION_WORKERS, DEFAULT_JPEG_QUALITY, DEFAULT_MIN_ENCODED_BYTES,
    DEFAULT_MIN_RESOLUTION, DEFAULT_STATUS_DURATION_MS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Tunables for one capture flow.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub min_resolution: u32,
    pub min_encoded_bytes: usize,
    pub jpeg_quality: u8,
    pub status_duration_ms: u64,
    pub detection_workers: usize,
    pub detection_queue_capacity: usize,
    pub disable_capture_on_detection_failure: bool,
    pub mirror_front_camera: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_resolution: DEFAULT_MIN_RESOLUTION,
            min_encoded_bytes: DEFAULT_MIN_ENCODED_BYTES,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            status_duration_ms: DEFAULT_STATUS_DURATION_MS,
            detection_workers: DEFAULT_DETECTION_WORKERS,
            detection_queue_capacity: DEFAULT_DETECTION_QUEUE_CAPACITY,
            disable_capture_on_detection_failure: true,
            mirror_front_camera: true,
        }
    }
}

impl CaptureConfig {
    pub fn status_duration(&self) -> Duration {
        Duration::from_millis(self.status_duration_ms)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the user config, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
