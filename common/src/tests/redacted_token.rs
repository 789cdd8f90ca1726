use crate::{RedactError, RedactedAccessToken};

/// **VALUE**: Verifies the token value never shows up in Debug or Display output.
///
/// **WHY THIS MATTERS**: The connector logs auth progress; a token in the log file is a
/// credential leak.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug sneaking back in.
#[test]
fn given_token_when_formatted_then_value_is_redacted() {
    // GIVEN: A token with a recognizable value
    let token = RedactedAccessToken::new(String::from("super-secret-value"));

    // WHEN: Formatting it both ways
    let debug = format!("{token:?}");
    let display = format!("{token}");

    // THEN: Neither contains the value
    assert!(!debug.contains("super-secret-value"));
    assert!(!display.contains("super-secret-value"));
    assert_eq!(token.as_str(), "super-secret-value");
    assert_eq!(token.len(), 18);
}

/// **VALUE**: Verifies implicit serialization is refused.
///
/// **WHY THIS MATTERS**: Settings and wire frames must pass the token explicitly via
/// `as_str()`, never by serializing the wrapper.
///
/// **BUG THIS CATCHES**: Would catch a derived Serialize replacing the refusing impl.
#[test]
fn given_token_when_serialized_then_returns_error() {
    // GIVEN: A token
    let token = RedactedAccessToken::new(String::from("abc"));

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&token);

    // THEN: Serialization fails
    assert!(result.is_err(), "Token must not serialize implicitly");
}

/// **VALUE**: Verifies blank tokens are rejected by `try_new`.
///
/// **WHY THIS MATTERS**: An empty token cached after a bad exchange would loop through
/// failing AUTHENTICATE attempts until discarded.
///
/// **BUG THIS CATCHES**: Would catch if whitespace-only values slip through.
#[test]
fn given_blank_value_when_try_new_then_returns_empty_token_error() {
    // GIVEN / WHEN: Blank values
    let empty = RedactedAccessToken::try_new(String::new());
    let spaces = RedactedAccessToken::try_new(String::from("   "));

    // THEN: Both are EmptyToken errors
    assert!(matches!(empty, Err(RedactError::EmptyToken { .. })));
    assert!(matches!(spaces, Err(RedactError::EmptyToken { .. })));
    assert!(RedactedAccessToken::try_new(String::from("tok")).is_ok());
}
