use crate::error::model_error::ModelError;
use crate::roster_entry::RosterEntry;
use crate::voice::UserId;
use crate::ErrorLocation;

use std::panic::Location;

/// Builder for creating validated RosterEntry instances.
#[derive(Debug, Default)]
pub struct RosterEntryBuilder {
    id: Option<UserId>,
    display_name: Option<String>,
    avatar_url: Option<String>,
    speaking: bool,
    muted: bool,
    deafened: bool,
}

impl RosterEntryBuilder {
    pub fn with_id(mut self, id: impl Into<UserId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_speaking(mut self, speaking: bool) -> Self {
        self.speaking = speaking;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn with_deafened(mut self, deafened: bool) -> Self {
        self.deafened = deafened;
        self
    }

    /// Build the RosterEntry with validation.
    #[track_caller]
    pub fn build(self) -> Result<RosterEntry, ModelError> {
        let id = self.id.ok_or_else(|| ModelError::Validation {
            message: String::from("User id is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if id.0.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("User id cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let display_name = self.display_name.ok_or_else(|| ModelError::Validation {
            message: String::from("Display name is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(ref url) = self.avatar_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ModelError::Validation {
                    message: format!("Invalid avatar URL format: {url}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        Ok(RosterEntry {
            id,
            display_name,
            avatar_url: self.avatar_url,
            speaking: self.speaking,
            muted: self.muted,
            deafened: self.deafened,
        })
    }
}
