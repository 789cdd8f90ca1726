use crate::config::Settings;
use crate::error::token_store::TokenStoreError;

use common::RedactedAccessToken;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, warn};

/// Where the access token survives between sessions.
pub trait TokenStore: Send + Sync {
    fn get_token(&self) -> Option<RedactedAccessToken>;

    fn set_token(&self, token: &RedactedAccessToken) -> Result<(), TokenStoreError>;
}

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<RedactedAccessToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: RedactedAccessToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Option<RedactedAccessToken> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: &RedactedAccessToken) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }
}

/// Reads and writes the `access_token` field of the settings file.
///
/// Writes go through a load-modify-save cycle so other settings survive.
pub struct FileTokenStore {
    config_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> Option<RedactedAccessToken> {
        match Settings::load(&self.config_dir) {
            Ok(settings) => settings
                .access_token
                .and_then(|token| RedactedAccessToken::try_new(token).ok()),
            Err(e) => {
                warn!("Cannot read stored access token: {e}");
                None
            }
        }
    }

    fn set_token(&self, token: &RedactedAccessToken) -> Result<(), TokenStoreError> {
        let mut settings = Settings::load(&self.config_dir)?;
        settings.access_token = Some(token.as_str().to_string());
        settings.save(&self.config_dir)?;
        debug!("Stored access token ({} bytes)", token.len());
        Ok(())
    }
}
