use overlay::env::{apply_overrides, try_load_dotenv};
use overlay::error::OverlayError;
use overlay::logger;
use overlay::paths::detect_overlay_paths;
use overlay::shutdown::{DISCONNECT_GRACE, wait_until_disconnected};

use overlay_core::{ConnectorConfig, Connector, FileTokenStore, Settings};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), OverlayError> {
    let dotenv_path = try_load_dotenv();
    let paths = detect_overlay_paths()?;
    paths.create_all()?;
    logger::initialize(&paths.log_dir)?;

    match dotenv_path {
        Some(path) => info!("Loaded .env from: {}", path.display()),
        None => info!("No .env file found, using process environment"),
    }

    let settings = Settings::load(&paths.config_dir)?;
    let config = apply_overrides(ConnectorConfig::default().with_settings(&settings), |key| {
        std::env::var(key).ok()
    });
    info!(
        "Starting overlay connector (client_id: {}, ports {}-{})",
        config.client_id, config.min_port, config.max_port
    );

    let store = Arc::new(FileTokenStore::new(paths.config_dir.clone()));
    let connector = Connector::new(config, store)?;

    let _changes = connector.roster().subscribe(|change| {
        info!(
            "Roster changed at {} (-{} +{})",
            change.position, change.removed, change.added
        );
    });
    let _speaking = connector.roster().subscribe_entries(|position, entry| {
        info!(
            "[{position}] {} {}",
            entry.display_name,
            if entry.speaking { "is speaking" } else { "stopped speaking" }
        );
    });

    connector.connect();

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| OverlayError::Overlay {
            message: format!("Failed to listen for Ctrl+C: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Shutting down");
    connector.disconnect();
    wait_until_disconnected(|| connector.state(), DISCONNECT_GRACE).await;
    Ok(())
}
