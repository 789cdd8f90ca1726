//! Request/response correlation over the RPC socket.
//!
//! Every outbound command gets a fresh nonce. The read loop offers each
//! inbound frame to [`PendingRequests`] first; only frames whose nonce is not
//! pending are forwarded to the dispatcher.

mod client;
mod pending;

pub use client::RpcClient;
pub use pending::PendingRequests;

use crate::error::rpc::RpcError;

use common::RedactedAccessToken;

use models::{ChannelId, Command, Envelope, Event, VoiceSettings};

use std::fmt;
use std::future::Future;

use serde_json::{Map, Value, json};

/// Something that can carry a command to the voice application and hand back
/// its response.
///
/// Implementations must write the request before the returned future first
/// yields, so fanned-out batches are fully issued before any result is awaited.
pub trait CommandSender: Send + Sync {
    fn send(&self, request: RpcRequest)
    -> impl Future<Output = Result<Envelope, RpcError>> + Send;
}

/// A command waiting for a nonce.
#[derive(Clone, PartialEq)]
pub struct RpcRequest {
    pub cmd: Command,
    pub args: Value,
    pub evt: Option<Event>,
}

impl RpcRequest {
    pub fn new(cmd: Command) -> Self {
        Self {
            cmd,
            args: Value::Object(Map::new()),
            evt: None,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_event(mut self, evt: Event) -> Self {
        self.evt = Some(evt);
        self
    }

    pub fn authorize(client_id: &str) -> Self {
        Self::new(Command::Authorize).with_args(json!({
            "client_id": client_id,
            "scopes": ["rpc"],
            "prompt": "none",
        }))
    }

    pub fn authenticate(token: &RedactedAccessToken) -> Self {
        Self::new(Command::Authenticate).with_args(json!({ "access_token": token.as_str() }))
    }

    pub fn get_channel(channel_id: &ChannelId) -> Self {
        Self::new(Command::GetChannel).with_args(json!({ "channel_id": channel_id }))
    }

    pub fn get_selected_voice_channel() -> Self {
        Self::new(Command::GetSelectedVoiceChannel)
    }

    pub fn get_voice_settings() -> Self {
        Self::new(Command::GetVoiceSettings)
    }

    pub fn set_mute(mute: bool) -> Self {
        Self::new(Command::SetVoiceSettings).with_args(json!({ "mute": mute }))
    }

    pub fn set_deaf(deaf: bool) -> Self {
        Self::new(Command::SetVoiceSettings).with_args(json!({ "deaf": deaf }))
    }

    /// Subscribe to `evt`, scoped to `channel` for channel-scoped events.
    pub fn subscribe(evt: Event, channel: Option<&ChannelId>) -> Self {
        Self::new(Command::Subscribe)
            .with_event(evt)
            .with_args(channel_args(channel))
    }

    pub fn unsubscribe(evt: Event, channel: Option<&ChannelId>) -> Self {
        Self::new(Command::Unsubscribe)
            .with_event(evt)
            .with_args(channel_args(channel))
    }

    /// Channel argument of a (un)subscribe request, if any.
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.args
            .get("channel_id")
            .and_then(Value::as_str)
            .map(ChannelId::from)
    }
}

fn channel_args(channel: Option<&ChannelId>) -> Value {
    match channel {
        Some(id) => json!({ "channel_id": id }),
        None => Value::Object(Map::new()),
    }
}

// Args may carry the access token, so they never reach Debug output.
impl fmt::Debug for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRequest")
            .field("cmd", &self.cmd)
            .field("evt", &self.evt)
            .finish_non_exhaustive()
    }
}

/// Decode the authoritative settings echoed by SET_VOICE_SETTINGS / GET_VOICE_SETTINGS.
#[track_caller]
pub(crate) fn voice_settings_from(envelope: &Envelope) -> Result<VoiceSettings, RpcError> {
    Ok(envelope.data_as::<VoiceSettings>()?)
}
