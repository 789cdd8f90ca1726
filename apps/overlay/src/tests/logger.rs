// Unit tests for logger module initialization logic
// Tests focus on idempotence and error handling

use crate::logger::{initialize, initialize_internal, level_from};

use std::path::PathBuf;

use log::LevelFilter;
use serial_test::serial;
use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: The binary and tests can both reach logger setup. If the
/// second call errors, startup fails for a reason unrelated to the connector.
///
/// **BUG THIS CATCHES**: Would catch if the AtomicBool guard is removed,
/// causing fern to fail when trying to set a global logger twice.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = TempDir::new().unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(temp_dir.path());
    let result2 = initialize(temp_dir.path());

    // THEN: Both should return Ok (second one logs warning but doesn't error)
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
    assert!(temp_dir.path().join("overlay.log").exists());
}

/// **VALUE**: Verifies that an unusable log directory yields an error, not a panic.
///
/// **WHY THIS MATTERS**: If the data directory can't be written, the overlay should
/// exit with a readable message instead of crashing.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` unwraps instead of returning
/// a Result.
#[test]
#[serial]
fn given_invalid_log_dir_when_initialized_then_returns_overlay_error() {
    // GIVEN: A path under a file, which can never be a directory
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Building the dispatch for that directory
    let result = initialize_internal(&invalid_dir, LevelFilter::Info);

    // THEN: Should return the Overlay variant naming the log file
    let err = result.unwrap_err();
    let err_string = format!("{err:?}");
    assert!(err_string.contains("Overlay"), "got {err_string}");
    assert!(err.to_string().contains("overlay.log"));
}

/// **VALUE**: `OVERLAY_LOG` picks the level; junk falls back to the build default.
///
/// **WHY THIS MATTERS**: Headless users raise verbosity through the environment
/// when diagnosing a connection problem.
///
/// **BUG THIS CATCHES**: Would catch a typo in `OVERLAY_LOG` silencing all output
/// or the value being matched case-sensitively.
#[test]
fn given_log_level_values_when_parsed_then_known_levels_win_and_junk_falls_back() {
    // GIVEN / WHEN / THEN: Known levels, any case, surrounding spaces
    assert_eq!(level_from(Some("trace")), LevelFilter::Trace);
    assert_eq!(level_from(Some(" WARN ")), LevelFilter::Warn);

    // THEN: Missing or unknown values use the build default
    let default = level_from(None);
    assert!(default == LevelFilter::Debug || default == LevelFilter::Info);
    assert_eq!(level_from(Some("loud")), default);
}
