use crate::{ModelError, RosterEntryBuilder, UserId};

/// **VALUE**: Verifies that the builder rejects a missing user id.
///
/// **WHY THIS MATTERS**: The roster is keyed by user id. An entry without one could never be
/// removed or replaced and would break id-uniqueness.
///
/// **BUG THIS CATCHES**: Would catch if required-field validation is dropped from `build()`.
#[test]
fn given_missing_id_when_building_then_returns_validation_error() {
    // GIVEN: Builder without an id
    let builder = RosterEntryBuilder::default().with_display_name("alice");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "User id is required");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that the builder rejects an empty user id.
///
/// **WHY THIS MATTERS**: Empty ids collide with each other; two anonymous members would
/// share a key.
///
/// **BUG THIS CATCHES**: Would catch if only presence, not content, is validated.
#[test]
fn given_empty_id_when_building_then_returns_validation_error() {
    // GIVEN: Builder with empty id
    let builder = RosterEntryBuilder::default()
        .with_id("")
        .with_display_name("alice");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

/// **VALUE**: Verifies that non-http avatar references are rejected.
///
/// **WHY THIS MATTERS**: The image-fetch collaborator downloads avatars over HTTP(S). Any other
/// scheme would fail in the renderer, far from the cause.
///
/// **BUG THIS CATCHES**: Would catch if URL scheme validation is removed.
#[test]
fn given_non_http_avatar_when_building_then_returns_validation_error() {
    // GIVEN: Builder with a file:// avatar
    let builder = RosterEntryBuilder::default()
        .with_id("u1")
        .with_display_name("alice")
        .with_avatar_url("file:///etc/passwd");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

/// **VALUE**: Verifies that a complete builder produces the expected entry.
///
/// **WHY THIS MATTERS**: Dispatcher tests build fixtures through this path.
///
/// **BUG THIS CATCHES**: Would catch flags being dropped or swapped in `build()`.
#[test]
fn given_all_fields_when_building_then_entry_carries_them() {
    // GIVEN: A fully populated builder
    let builder = RosterEntryBuilder::default()
        .with_id("u1")
        .with_display_name("alice")
        .with_avatar_url("https://cdn.example.com/avatars/u1/abc.jpg")
        .with_speaking(true)
        .with_muted(true)
        .with_deafened(false);

    // WHEN: Building
    let entry = builder.build().expect("valid entry");

    // THEN: All fields survive
    assert_eq!(entry.id, UserId::new("u1"));
    assert_eq!(entry.display_name, "alice");
    assert_eq!(
        entry.avatar_url.as_deref(),
        Some("https://cdn.example.com/avatars/u1/abc.jpg")
    );
    assert!(entry.speaking);
    assert!(entry.muted);
    assert!(!entry.deafened);
}
