use common::ErrorLocation;

use models::{ErrorCode, ModelError};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RpcError {
    /// No live socket at send time; nothing was written.
    #[error("Not Connected Error: {message} {location}")]
    NotConnected {
        message: String,
        location: ErrorLocation,
    },

    /// No response within the request window. Reported exactly once per request.
    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    /// The voice application answered with `evt = ERROR`.
    #[error("Protocol Error: {code} {message} {location}")]
    Protocol {
        code: i64,
        message: String,
        location: ErrorLocation,
    },

    #[error("Serialization Error: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },

    #[error("Payload Error: {message} {location}")]
    Payload {
        message: String,
        location: ErrorLocation,
    },

    /// The pending entry was dropped without an answer.
    #[error("Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },
}

impl RpcError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, RpcError::NotConnected { .. })
    }

    /// Server-reported error code, if the failure came from an `ERROR` response.
    pub fn protocol_code(&self) -> Option<ErrorCode> {
        match self {
            RpcError::Protocol { code, .. } => Some(ErrorCode(*code)),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RpcError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        RpcError::Serialization {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ModelError> for RpcError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        RpcError::Payload {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
