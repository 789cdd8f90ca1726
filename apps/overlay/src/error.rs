use common::ErrorLocation;

use overlay_core::CoreError;
use overlay_core::error::ConfigError;

use std::panic::Location;

use thiserror::Error;

/// Errors that stop the overlay from starting.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Error from this app (logging, directories, runtime)
    #[error("Overlay Error: {message} {location}")]
    Overlay {
        message: String,
        location: ErrorLocation,
    },

    /// Settings file could not be read or validated
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Error from overlay-core (connector construction)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for OverlayError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        OverlayError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for OverlayError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        OverlayError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
