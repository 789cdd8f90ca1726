//! Shared building blocks for the overlay workspace.
//!
//! Everything here is free of connector logic so that `models`,
//! `overlay-core` and the binary can all depend on it:
//!
//! - [`ErrorLocation`]: call-site capture embedded in every error variant
//! - [`RedactedAccessToken`]: access token wrapper that never leaks into logs

pub mod error;
pub mod redacted_token;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_token::RedactedAccessToken;

#[cfg(test)]
mod tests;
