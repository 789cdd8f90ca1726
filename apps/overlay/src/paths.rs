//! Where the overlay keeps its settings and logs.

use crate::error::OverlayError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::PathBuf;

use log::{debug, info};

const APP_DIR_NAME: &str = "overlay";
const LOG_DIR_NAME: &str = "logs";

/// Override for both directories, mainly for portable installs and tests.
pub const OVERLAY_HOME_ENV: &str = "OVERLAY_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    EnvVar,
    PlatformDefault,
}

#[derive(Debug, Clone)]
pub struct OverlayPaths {
    /// Holds `settings.json`.
    pub config_dir: PathBuf,
    /// Holds `overlay.log`.
    pub log_dir: PathBuf,
    pub source: PathSource,
}

impl OverlayPaths {
    /// Both directories under one root.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            log_dir: root.join(LOG_DIR_NAME),
            config_dir: root,
            source: PathSource::EnvVar,
        }
    }

    pub fn create_all(&self) -> Result<(), OverlayError> {
        for dir in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|e| OverlayError::Overlay {
                message: format!("Failed to create {}: {e}", dir.display()),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }
        Ok(())
    }
}

/// Resolve the settings and log directories.
///
/// # Platform Behavior
/// - `OVERLAY_HOME` set: `$OVERLAY_HOME` and `$OVERLAY_HOME/logs`
/// - otherwise: `{config_dir}/overlay` and `{data_local_dir}/overlay/logs`
pub fn detect_overlay_paths() -> Result<OverlayPaths, OverlayError> {
    if let Ok(custom_dir) = env::var(OVERLAY_HOME_ENV) {
        info!("Using {OVERLAY_HOME_ENV} override: {custom_dir}");
        return Ok(OverlayPaths::under(custom_dir));
    }

    let (Some(config_dir), Some(data_dir)) = (dirs::config_dir(), dirs::data_local_dir()) else {
        return Err(OverlayError::Overlay {
            message: String::from("Could not determine platform config/data directories"),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    let paths = OverlayPaths {
        config_dir: config_dir.join(APP_DIR_NAME),
        log_dir: data_dir.join(APP_DIR_NAME).join(LOG_DIR_NAME),
        source: PathSource::PlatformDefault,
    };
    debug!("Platform overlay paths: {paths:?}");
    Ok(paths)
}
