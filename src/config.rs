//! Configuration management for ndcam
//!
//! Loads and saves the runtime options of a [`crate::CameraContext`] as TOML.

use crate::errors::CameraError;
use crate::registry::MAX_CAMERA_COUNT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdcamConfig {
    pub registry: RegistryConfig,
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

/// Device discovery options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Most devices the registry accepts before initialization fails (1-16)
    pub max_devices: usize,
}

/// Callback dispatch options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Forward per-frame capture events (started/progressed/completed) to subscribers
    pub forward_capture_events: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for NdcamConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig {
                max_devices: MAX_CAMERA_COUNT,
            },
            dispatch: DispatchConfig {
                forward_capture_events: true,
            },
            logging: LoggingConfig {
                filter: "ndcam=info".to_string(),
            },
        }
    }
}

impl NdcamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::config(format!("Failed to read config file: {}", e)))?;

        let config: NdcamConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(CameraError::config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("ndcam.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.registry.max_devices == 0 || self.registry.max_devices > MAX_CAMERA_COUNT {
            return Err(format!(
                "max_devices must be between 1 and {}",
                MAX_CAMERA_COUNT
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err("Logging filter must not be empty".to_string());
        }
        Ok(())
    }
}
