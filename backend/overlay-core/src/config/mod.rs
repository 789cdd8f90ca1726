//! Connector configuration and the persisted settings file.

pub mod settings;

pub use settings::Settings;

use crate::error::config::ConfigError;
use crate::{
    AVATAR_BASE_URL, DEFAULT_CLIENT_ID, MAX_PORT, MIN_PORT, STREAMKIT_ORIGIN, TOKEN_EXCHANGE_URL,
};

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1000);
const DEFAULT_AUTH_RETRY_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_AUTH_FAILURES: u32 = 3;

/// Runtime configuration of a [`Connector`](crate::connection::Connector).
///
/// Defaults reproduce the voice application's published constants; tests
/// override the port range, delays and endpoints.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub client_id: String,
    /// Sent as the `Origin` header and used as the token exchange host.
    pub origin: String,
    pub token_exchange_url: String,
    pub min_port: u16,
    pub max_port: u16,
    pub reconnect_delay: Duration,
    pub request_timeout: Duration,
    pub auth_retry_delay: Duration,
    /// Consecutive AUTHENTICATE failures tolerated before the token is discarded.
    pub max_auth_failures: u32,
    pub avatar_base_url: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            origin: STREAMKIT_ORIGIN.to_string(),
            token_exchange_url: TOKEN_EXCHANGE_URL.to_string(),
            min_port: MIN_PORT,
            max_port: MAX_PORT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_retry_delay: DEFAULT_AUTH_RETRY_DELAY,
            max_auth_failures: DEFAULT_MAX_AUTH_FAILURES,
            avatar_base_url: AVATAR_BASE_URL.to_string(),
        }
    }
}

impl ConnectorConfig {
    /// Apply overrides from the persisted settings file.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        if let Some(ref client_id) = settings.client_id {
            self.client_id = client_id.clone();
        }
        self
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "client_id cannot be empty".to_string(),
            });
        }

        if self.min_port == 0 || self.min_port > self.max_port {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid port range: {}-{} (min must be non-zero and <= max)",
                    self.min_port, self.max_port
                ),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "request_timeout must be non-zero".to_string(),
            });
        }

        if self.max_auth_failures == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "max_auth_failures must be at least 1".to_string(),
            });
        }

        for (name, url) in [
            ("origin", &self.origin),
            ("token_exchange_url", &self.token_exchange_url),
            ("avatar_base_url", &self.avatar_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Invalid {name} format: {url}"),
                });
            }
        }

        Ok(())
    }
}
