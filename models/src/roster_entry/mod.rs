//! Roster entry: one member of the current voice channel, as shown by the overlay.

pub mod builder;

use crate::error::model_error::ModelError;
use crate::voice::{UserId, VoiceStatePayload};

use builder::RosterEntryBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: UserId,
    pub display_name: String,
    /// Image reference handed to the image-fetch collaborator.
    pub avatar_url: Option<String>,
    pub speaking: bool,
    pub muted: bool,
    pub deafened: bool,
}

impl RosterEntry {
    /// Build an entry from a voice state payload.
    ///
    /// The display name is the member's nickname, falling back to the account
    /// name. Avatars resolve to `{avatar_base_url}/{user_id}/{avatar}.jpg`.
    /// New entries are never speaking; the dispatcher carries the flag across
    /// replacements.
    #[track_caller]
    pub fn from_voice_state(
        payload: &VoiceStatePayload,
        avatar_base_url: &str,
    ) -> Result<Self, ModelError> {
        let display_name = payload
            .nick
            .clone()
            .filter(|nick| !nick.is_empty())
            .or_else(|| payload.user.username.clone())
            .unwrap_or_default();

        let mut builder = RosterEntryBuilder::default()
            .with_id(payload.user.id.clone())
            .with_display_name(display_name)
            .with_muted(payload.voice_state.is_muted())
            .with_deafened(payload.voice_state.is_deafened());

        if let Some(avatar) = payload.user.avatar.as_deref().filter(|a| !a.is_empty()) {
            builder = builder.with_avatar_url(format!(
                "{}/{}/{}.jpg",
                avatar_base_url.trim_end_matches('/'),
                payload.user.id,
                avatar
            ));
        }

        builder.build()
    }
}
