//! Access token handling with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// An RPC access token that never exposes its value in logs or debug output.
///
/// The value is wiped from memory when the token is dropped.
#[derive(Clone)]
pub struct RedactedAccessToken {
    inner: String,
}

impl RedactedAccessToken {
    /// Wrap a token value.
    pub fn new(token: String) -> Self {
        Self { inner: token }
    }

    /// Wrap a token value, rejecting empty strings.
    ///
    /// The token exchange endpoint answers with an empty token when the
    /// one-time code was already consumed, and an empty token can never
    /// authenticate.
    #[track_caller]
    pub fn try_new(token: String) -> Result<Self, RedactError> {
        if token.trim().is_empty() {
            return Err(RedactError::EmptyToken {
                message: String::from("access token must not be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(Self::new(token))
    }

    /// Get the actual token value for transmission.
    ///
    /// # Security Note
    /// Only call this when sending the token to the voice application or
    /// handing it to the settings store.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get the token length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedAccessToken([REDACTED])")
    }
}

impl fmt::Display for RedactedAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED ACCESS TOKEN]")
    }
}

impl Drop for RedactedAccessToken {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Prevent accidental serialization into wire frames or settings dumps
impl serde::Serialize for RedactedAccessToken {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from(
                "RedactedAccessToken cannot be serialized - use as_str() explicitly",
            ),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
