//! Logging for the overlay: colored stdout plus `overlay.log`.

use crate::error::OverlayError;

use common::ErrorLocation;

use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "overlay.log";

/// Overrides the build's default level (`trace`, `debug`, `info`, ...).
pub const LOG_LEVEL_ENV: &str = "OVERLAY_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger. Later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns [`OverlayError::Overlay`] if `overlay.log` cannot be opened in
/// `log_dir` or another global logger is already installed.
pub fn initialize(log_dir: &Path) -> Result<(), OverlayError> {
    if LOGGER_INSTALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let result = initialize_internal(log_dir, level);
    match &result {
        Ok(()) => info!("Logger initialized with level: {level:?}"),
        Err(_) => LOGGER_INSTALLED.store(false, Ordering::SeqCst),
    }
    result
}

/// Level from an `OVERLAY_LOG` value, falling back to the build default.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(DEFAULT_LEVEL)
}

#[track_caller]
pub(crate) fn initialize_internal(log_dir: &Path, level: LevelFilter) -> Result<(), OverlayError> {
    let location = ErrorLocation::from(Location::caller());
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let log_file = fern::log_file(&log_file_path).map_err(|e| OverlayError::Overlay {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location,
    })?;

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red);

    Dispatch::new()
        .level(level)
        // Frame-level chatter from the socket and HTTP stacks drowns out the connector.
        .level_for("tungstenite", LevelFilter::Info)
        .level_for("tokio_tungstenite", LevelFilter::Info)
        .level_for("reqwest", LevelFilter::Info)
        .level_for("hyper_util", LevelFilter::Info)
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    out.finish(format_args!(
                        "[{} - {}] {message} [{}:{}]",
                        format_rfc3339(SystemTime::now()),
                        colors.color(record.level()),
                        record.file().unwrap_or("unknown"),
                        record.line().unwrap_or(0),
                    ))
                })
                .chain(stdout()),
        )
        .chain(
            Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} - {}] {message} [{}:{}]",
                        format_rfc3339(SystemTime::now()),
                        record.level(),
                        record.file().unwrap_or("unknown"),
                        record.line().unwrap_or(0),
                    ))
                })
                .chain(log_file),
        )
        .apply()
        .map_err(|e| OverlayError::Overlay {
            message: format!("Failed to initialize logger: {e}"),
            location,
        })
}
