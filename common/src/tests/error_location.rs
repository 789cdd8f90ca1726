use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error variant in the workspace embeds an ErrorLocation.
/// If capture is wrong, a reconnect or auth failure in the logs points nowhere.
///
/// **BUG THIS CATCHES**: Would catch if file path extraction or line/column capture breaks.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: A call site inside this file
    // WHEN: Creating ErrorLocation from it
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture file, line, and column
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert!(location.line > 0, "Should capture line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` display format.
///
/// **WHY THIS MATTERS**: Error messages end with the location; log readers grep for it.
///
/// **BUG THIS CATCHES**: Would catch if the Display implementation drops brackets or fields.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Formatting as string
    let formatted = format!("{}", location);

    // THEN: Should produce "[file:line:column]"
    assert_eq!(
        formatted,
        format!("[{}:{}:{}]", location.file, location.line, location.column)
    );
}

/// **VALUE**: Verifies that `#[track_caller]` propagation yields distinct call sites.
///
/// **WHY THIS MATTERS**: `From` conversions into core errors are `#[track_caller]`; they must
/// report the conversion site, not the conversion function.
///
/// **BUG THIS CATCHES**: Would catch if location propagation stops at the helper.
#[test]
fn given_multiple_call_sites_when_capturing_location_then_each_has_unique_line() {
    // GIVEN: A helper function that captures location
    #[track_caller]
    fn capture_location() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Capturing location from different call sites
    let loc1 = capture_location();
    let loc2 = capture_location();

    // THEN: Same file, consecutive lines
    assert_eq!(loc1.file, loc2.file, "Should have same file");
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
}
