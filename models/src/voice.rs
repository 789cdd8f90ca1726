//! Payloads carried in `data` for voice-related commands and events.

use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// Stable user identifier (snowflake string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}

/// Voice channel identifier (snowflake string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for ChannelId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}

/// `data` of an AUTHORIZE response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeData {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceUser {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Server and self mute/deafen flags of a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceFlags {
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub suppress: bool,
}

impl VoiceFlags {
    pub fn is_muted(&self) -> bool {
        self.mute || self.self_mute
    }

    pub fn is_deafened(&self) -> bool {
        self.deaf || self.self_deaf
    }
}

/// One member's voice state, as found in a channel snapshot and in
/// VOICE_STATE_CREATE / DELETE / CHANGE dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStatePayload {
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub voice_state: VoiceFlags,
    pub user: VoiceUser,
}

/// Channel snapshot returned by GET_CHANNEL and GET_SELECTED_VOICE_CHANNEL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceChannel {
    pub id: ChannelId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub voice_states: Vec<VoiceStatePayload>,
}

/// `data` of VOICE_CHANNEL_SELECT. A `None` channel means the user left voice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelSelect {
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub guild_id: Option<String>,
}

/// `data` of SPEAKING_START / SPEAKING_STOP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeakingPayload {
    pub user_id: UserId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

/// Local mute/deafen state of the logged-in user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub deaf: bool,
}
