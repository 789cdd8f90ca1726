use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE_NAME: &str = "settings.json";
const SETTINGS_VERSION: u32 = 1;

/// Persisted user settings read by the connector.
///
/// Only the bits the connector consumes live here: the cached access token
/// and an optional client id override. Presentation settings belong to the
/// renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            access_token: None,
            client_id: None,
        }
    }
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Settings {
    /// Load settings from {config_dir}/settings.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let settings_path = config_dir.join(SETTINGS_FILE_NAME);

        if !settings_path.exists() {
            info!(
                "Settings file not found at {}, using defaults",
                settings_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
            warn!("Failed to read settings file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                source: e,
            }
        })?;

        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse settings JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                reason: e.to_string(),
            }
        })?;

        settings.validate()?;

        info!("Settings loaded from {}", settings_path.display());
        Ok(settings)
    }

    /// Save settings to {config_dir}/settings.json using atomic write.
    ///
    /// Uses temp file + rename so a crash never leaves a half-written token.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let settings_path = config_dir.join(SETTINGS_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", SETTINGS_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &settings_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: settings_path.clone(),
            source: e,
        })?;

        info!("Settings saved to {}", settings_path.display());
        Ok(())
    }

    /// Validate settings values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > SETTINGS_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, SETTINGS_VERSION
                ),
            });
        }

        if let Some(ref client_id) = self.client_id {
            if client_id.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: "client_id cannot be empty string".to_string(),
                });
            }
        }

        Ok(())
    }
}
