//! `.env` loading and environment overrides for the connector config.

use overlay_core::config::ConnectorConfig;
use overlay_core::TOKEN_EXCHANGE_PATH;

use std::path::PathBuf;

use log::info;

pub const CLIENT_ID_ENV: &str = "OVERLAY_CLIENT_ID";
pub const ORIGIN_ENV: &str = "OVERLAY_ORIGIN";

/// Load `.env` from the working directory or next to the executable.
///
/// Runs before the logger exists, so the caller reports the result.
pub fn try_load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    let exe_path = std::env::current_exe().ok()?;
    let env_path = exe_path.parent()?.join(".env");
    if env_path.exists() && dotenvy::from_path(&env_path).is_ok() {
        return Some(env_path);
    }
    None
}

/// Apply `OVERLAY_CLIENT_ID` / `OVERLAY_ORIGIN` from `lookup`.
///
/// An origin override also moves the token exchange endpoint to that origin.
pub fn apply_overrides<F>(mut config: ConnectorConfig, lookup: F) -> ConnectorConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(client_id) = lookup(CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
        info!("Using {CLIENT_ID_ENV} override");
        config.client_id = client_id;
    }

    if let Some(origin) = lookup(ORIGIN_ENV).filter(|v| !v.trim().is_empty()) {
        let origin = origin.trim_end_matches('/').to_string();
        info!("Using {ORIGIN_ENV} override: {origin}");
        config.token_exchange_url = format!("{origin}{TOKEN_EXCHANGE_PATH}");
        config.origin = origin;
    }

    config
}
