use crate::error::rpc::RpcError;
use crate::error::token_store::TokenStoreError;

use common::{ErrorLocation, RedactError};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AuthError {
    /// The voice application is logged into another account (or still logging in).
    #[error("Wrong User Error: {message} {location}")]
    WrongUser {
        message: String,
        location: ErrorLocation,
    },

    #[error("Authorize Error: {message} {location}")]
    Authorize {
        message: String,
        location: ErrorLocation,
    },

    #[error("Token Exchange Error: {message} {location}")]
    Exchange {
        message: String,
        location: ErrorLocation,
    },

    #[error("Authenticate Error: {message} {location}")]
    Authenticate {
        message: String,
        location: ErrorLocation,
    },

    #[error("Token Store Error: {message} {location}")]
    TokenStore {
        message: String,
        location: ErrorLocation,
    },
}

impl AuthError {
    /// Wrong-user failures are expected while the voice application finishes
    /// logging in; everything else is a genuine failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::WrongUser { .. })
    }

    /// Classify a failed AUTHENTICATE round trip.
    #[track_caller]
    pub fn from_authenticate(error: RpcError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match error.protocol_code() {
            Some(models::ErrorCode::WRONG_USER) => AuthError::WrongUser {
                message: error.to_string(),
                location,
            },
            _ => AuthError::Authenticate {
                message: error.to_string(),
                location,
            },
        }
    }
}

impl From<reqwest::Error> for AuthError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        AuthError::Exchange {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for AuthError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        AuthError::Exchange {
            message: format!("Invalid token exchange URL: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<RedactError> for AuthError {
    #[track_caller]
    fn from(error: RedactError) -> Self {
        AuthError::Exchange {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<TokenStoreError> for AuthError {
    #[track_caller]
    fn from(error: TokenStoreError) -> Self {
        AuthError::TokenStore {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
