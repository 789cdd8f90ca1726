use overlay_core::error::{AuthError, ConfigError, CoreError, TokenStoreError};

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies token store failures convert into auth errors with context.
///
/// **WHY THIS MATTERS**: A settings write failure during authorization must be reported as
/// such, not as a generic auth failure.
///
/// **BUG THIS CATCHES**: Would catch the From chain losing the original message.
#[test]
fn given_config_write_failure_when_converted_to_auth_error_then_message_preserved() {
    // GIVEN: A validation failure from the settings layer
    let config_error = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("client_id cannot be empty string"),
    };

    // WHEN: Converting through the token store into an auth error
    let store_error = TokenStoreError::from(config_error);
    let auth_error = AuthError::from(store_error);

    // THEN: Token store kind, original reason kept, not retryable
    assert!(matches!(auth_error, AuthError::TokenStore { .. }));
    assert!(auth_error.to_string().contains("client_id cannot be empty string"));
    assert!(!auth_error.is_retryable());
}

/// **VALUE**: Verifies the umbrella error is transparent.
///
/// **WHY THIS MATTERS**: The binary logs `CoreError` directly; wrapping must not hide the
/// inner kind.
///
/// **BUG THIS CATCHES**: Would catch a non-transparent wrapper prefixing its own text.
#[test]
fn given_auth_error_when_wrapped_in_core_error_then_display_unchanged() {
    let auth_error = AuthError::WrongUser {
        message: String::from("still logging in"),
        location: ErrorLocation::from(Location::caller()),
    };
    let expected = auth_error.to_string();

    let core_error = CoreError::from(auth_error);

    assert_eq!(core_error.to_string(), expected);
    assert!(expected.starts_with("Wrong User Error"));
}
