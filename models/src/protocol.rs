//! JSON envelope of the local RPC protocol.
//!
//! Every frame in either direction is a text frame carrying
//! `{cmd, args?, evt?, nonce, data?}`. Responses echo the request's nonce;
//! pushes arrive as `cmd = DISPATCH` with the event kind in `evt`.

use crate::error::model_error::ModelError;
use crate::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command names understood by the voice application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Dispatch,
    Authorize,
    Authenticate,
    GetChannel,
    GetSelectedVoiceChannel,
    GetVoiceSettings,
    SetVoiceSettings,
    Subscribe,
    Unsubscribe,
    #[serde(other)]
    Unknown,
}

/// Event kinds carried in `evt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Ready,
    Error,
    VoiceChannelSelect,
    VoiceStateCreate,
    VoiceStateDelete,
    VoiceStateChange,
    VoiceSettingsUpdate,
    SpeakingStart,
    SpeakingStop,
    #[serde(other)]
    Unknown,
}

impl Event {
    /// The five event streams that only exist relative to one voice channel.
    pub const CHANNEL_SCOPED: [Event; 5] = [
        Event::VoiceStateCreate,
        Event::VoiceStateDelete,
        Event::VoiceStateChange,
        Event::SpeakingStart,
        Event::SpeakingStop,
    ];

    /// Streams subscribed once per session, independent of the channel.
    pub const SESSION_SCOPED: [Event; 2] = [Event::VoiceChannelSelect, Event::VoiceSettingsUpdate];

    pub fn is_channel_scoped(&self) -> bool {
        Self::CHANNEL_SCOPED.contains(self)
    }

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Ready => "READY",
            Event::Error => "ERROR",
            Event::VoiceChannelSelect => "VOICE_CHANNEL_SELECT",
            Event::VoiceStateCreate => "VOICE_STATE_CREATE",
            Event::VoiceStateDelete => "VOICE_STATE_DELETE",
            Event::VoiceStateChange => "VOICE_STATE_CHANGE",
            Event::VoiceSettingsUpdate => "VOICE_SETTINGS_UPDATE",
            Event::SpeakingStart => "SPEAKING_START",
            Event::SpeakingStop => "SPEAKING_STOP",
            Event::Unknown => "UNKNOWN",
        }
    }
}

impl Display for Event {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// Error codes reported inside `ERROR` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    /// The voice application is logged into a different account than the token
    /// belongs to, or has not finished logging in yet.
    pub const WRONG_USER: ErrorCode = ErrorCode(4009);
}

impl Display for ErrorCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

/// `data` of an `evt = ERROR` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorData {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl ErrorData {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode(self.code)
    }
}

/// Inbound frame: a response to one of our requests or an unsolicited push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub cmd: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evt: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Parse a text frame.
    #[track_caller]
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::Payload {
            message: format!("Malformed frame: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Whether the server flagged this response as a failure.
    pub fn is_error(&self) -> bool {
        self.evt == Some(Event::Error)
    }

    /// Error details of an `ERROR` response, if any.
    pub fn error_data(&self) -> Option<ErrorData> {
        if !self.is_error() {
            return None;
        }
        self.data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
    }

    /// Decode `data` into a typed payload. A missing `data` decodes as JSON `null`,
    /// so `Option<T>` targets see `None`.
    #[track_caller]
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ModelError> {
        let location = ErrorLocation::from(Location::caller());
        let data = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| ModelError::Payload {
            message: format!("Unexpected {:?} payload: {e}", self.cmd),
            location,
        })
    }
}

/// Outbound request frame. The nonce is assigned by the correlator at send time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    pub cmd: Command,
    pub args: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evt: Option<Event>,
    pub nonce: String,
}
