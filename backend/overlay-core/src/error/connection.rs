use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("URL Error: {message} {location}")]
    Url {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handshake Error: port {port}: {message} {location}")]
    Handshake {
        port: u16,
        message: String,
        location: ErrorLocation,
    },

    #[error("Header Error: {message} {location}")]
    Header {
        message: String,
        location: ErrorLocation,
    },
}

impl From<url::ParseError> for ConnectionError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        ConnectionError::Url {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<InvalidHeaderValue> for ConnectionError {
    #[track_caller]
    fn from(error: InvalidHeaderValue) -> Self {
        ConnectionError::Header {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl ConnectionError {
    #[track_caller]
    pub fn handshake(port: u16, error: WsError) -> Self {
        ConnectionError::Handshake {
            port,
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
