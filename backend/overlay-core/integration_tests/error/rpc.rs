use overlay_core::error::RpcError;

use common::ErrorLocation;

use models::ErrorCode;

use std::panic::Location;

/// **VALUE**: Verifies `RpcError::Timeout` display includes kind, message and location.
///
/// **WHY THIS MATTERS**: Timeouts are logged from several call sites (subscriptions,
/// toggles, auth); the location tells which one stalled.
///
/// **BUG THIS CATCHES**: Would catch the location being dropped from the Display format.
#[test]
fn given_timeout_error_when_formatted_then_includes_location() {
    // GIVEN: A timeout error
    let err = RpcError::Timeout {
        message: String::from("No response to Subscribe within 1s"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Formatting
    let error_string = err.to_string();

    // THEN: Kind, message and file are present
    assert!(error_string.contains("Timeout Error"));
    assert!(error_string.contains("No response to Subscribe"));
    assert!(error_string.contains("rpc.rs"));
    assert!(err.is_timeout());
}

/// **VALUE**: Verifies protocol errors expose the server's code.
///
/// **WHY THIS MATTERS**: Callers branch on the code, not on message text.
///
/// **BUG THIS CATCHES**: Would catch non-protocol errors reporting a code.
#[test]
fn given_protocol_and_transport_errors_when_code_requested_then_only_protocol_has_one() {
    let protocol = RpcError::Protocol {
        code: 4009,
        message: String::from("Invalid user"),
        location: ErrorLocation::from(Location::caller()),
    };
    let transport = RpcError::Transport {
        message: String::from("broken pipe"),
        location: ErrorLocation::from(Location::caller()),
    };

    assert_eq!(protocol.protocol_code(), Some(ErrorCode::WRONG_USER));
    assert!(protocol.to_string().contains("4009"));
    assert_eq!(transport.protocol_code(), None);
}
