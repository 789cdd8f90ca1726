use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TokenStoreError {
    #[error("Token Persist Error: {message} {location}")]
    Persist {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for TokenStoreError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        TokenStoreError::Persist {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
