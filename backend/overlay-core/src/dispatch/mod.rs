//! Routing of unsolicited frames to their handlers.
//!
//! Frames arrive here in socket order and are handled one at a time; a
//! failing handler is logged and the next frame proceeds.

pub mod channel;

use crate::auth::Authenticator;
use crate::error::CoreError;
use crate::rpc::{CommandSender, RpcRequest, voice_settings_from};
use crate::state::SharedState;
use crate::subscriptions::SubscriptionManager;

use models::{
    ChannelSelect, Command, Envelope, ErrorData, Event, RosterEntry, SpeakingPayload,
    VoiceChannel, VoiceSettings, VoiceStatePayload,
};

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

/// Classification of an unsolicited frame.
#[derive(Debug)]
pub enum Routed {
    /// A DISPATCH push carrying an event kind.
    Dispatch { event: Event, envelope: Envelope },
    /// Anything else: stray responses, late replies, DISPATCH without `evt`.
    Unhandled(Envelope),
}

pub fn route(envelope: Envelope) -> Routed {
    match (envelope.cmd, envelope.evt) {
        (Command::Dispatch, Some(event)) => Routed::Dispatch { event, envelope },
        _ => Routed::Unhandled(envelope),
    }
}

/// Applies pushes to the shared state. Owned by the session's event task.
pub struct EventDispatcher<S> {
    sender: S,
    state: SharedState,
    subscriptions: SubscriptionManager,
    authenticator: Authenticator,
    avatar_base_url: String,
}

impl<S: CommandSender> EventDispatcher<S> {
    pub fn new(
        sender: S,
        state: SharedState,
        subscriptions: SubscriptionManager,
        authenticator: Authenticator,
        avatar_base_url: String,
    ) -> Self {
        Self {
            sender,
            state,
            subscriptions,
            authenticator,
            avatar_base_url,
        }
    }

    /// Handle frames until the channel closes.
    pub async fn run(self, mut frames: UnboundedReceiver<Envelope>) {
        while let Some(envelope) = frames.recv().await {
            self.handle(envelope).await;
        }
        debug!("Event stream ended");
    }

    pub async fn handle(&self, envelope: Envelope) {
        match route(envelope) {
            Routed::Dispatch { event, envelope } => {
                if let Err(e) = self.handle_event(event, &envelope).await {
                    warn!("Handling {event} failed: {e}");
                }
            }
            Routed::Unhandled(envelope) => {
                debug!(
                    "Unhandled {:?} frame (nonce {:?})",
                    envelope.cmd, envelope.nonce
                );
            }
        }
    }

    async fn handle_event(&self, event: Event, envelope: &Envelope) -> Result<(), CoreError> {
        match event {
            Event::Ready => self.on_ready().await,
            Event::VoiceChannelSelect => {
                let select: ChannelSelect = envelope.data_as()?;
                channel::change_channel(
                    &self.sender,
                    &self.state,
                    &self.subscriptions,
                    select.channel_id,
                    &self.avatar_base_url,
                )
                .await
            }
            Event::VoiceStateCreate => self.on_voice_state_create(envelope.data_as()?),
            Event::VoiceStateDelete => {
                self.on_voice_state_delete(envelope.data_as()?);
                Ok(())
            }
            Event::VoiceStateChange => self.on_voice_state_change(envelope.data_as()?),
            Event::VoiceSettingsUpdate => {
                let settings: VoiceSettings = envelope.data_as()?;
                self.state.set_voice_settings(settings);
                Ok(())
            }
            Event::SpeakingStart => {
                self.on_speaking(envelope.data_as()?, true);
                Ok(())
            }
            Event::SpeakingStop => {
                self.on_speaking(envelope.data_as()?, false);
                Ok(())
            }
            Event::Error => {
                let error: Option<ErrorData> = envelope.data_as().ok().flatten();
                warn!("Voice application reported an error: {error:?}");
                Ok(())
            }
            Event::Unknown => {
                debug!("Ignoring unknown dispatch event");
                Ok(())
            }
        }
    }

    async fn on_ready(&self) -> Result<(), CoreError> {
        self.authenticator.run(&self.sender).await?;

        let (_, selected, settings) = tokio::join!(
            self.subscriptions.subscribe_session_events(&self.sender),
            self.sender.send(RpcRequest::get_selected_voice_channel()),
            self.sender.send(RpcRequest::get_voice_settings()),
        );

        match settings.and_then(|response| voice_settings_from(&response)) {
            Ok(settings) => self.state.set_voice_settings(settings),
            Err(e) => warn!("Could not read voice settings: {e}"),
        }

        let selected: Option<VoiceChannel> = selected?.data_as()?;
        match selected {
            Some(channel) => {
                channel::join_channel(
                    &self.sender,
                    &self.state,
                    &self.subscriptions,
                    channel,
                    &self.avatar_base_url,
                )
                .await;
            }
            None => info!("Not in a voice channel"),
        }
        Ok(())
    }

    fn on_voice_state_create(&self, payload: VoiceStatePayload) -> Result<(), CoreError> {
        if self.state.current_channel().is_none() {
            debug!("Dropping VOICE_STATE_CREATE outside of a channel");
            return Ok(());
        }
        let entry = RosterEntry::from_voice_state(&payload, &self.avatar_base_url)?;
        self.state.roster.insert(entry);
        Ok(())
    }

    fn on_voice_state_delete(&self, payload: VoiceStatePayload) {
        if self.state.roster.remove_by_id(&payload.user.id).is_none() {
            debug!("VOICE_STATE_DELETE for unknown user {}", payload.user.id);
        }
    }

    fn on_voice_state_change(&self, payload: VoiceStatePayload) -> Result<(), CoreError> {
        let Some(existing) = self.state.roster.get_by_id(&payload.user.id) else {
            debug!("VOICE_STATE_CHANGE for unknown user {}", payload.user.id);
            return Ok(());
        };

        let mut entry = RosterEntry::from_voice_state(&payload, &self.avatar_base_url)?;
        entry.speaking = existing.speaking;
        self.state.roster.replace_by_id(&existing.id, entry);
        Ok(())
    }

    fn on_speaking(&self, payload: SpeakingPayload, speaking: bool) {
        let current = self.state.current_channel();
        if current.is_none() || payload.channel_id != current {
            debug!(
                "Dropping stale speaking event for channel {:?} (current {:?})",
                payload.channel_id, current
            );
            return;
        }

        if !self.state.roster.set_speaking(&payload.user_id, speaking) {
            debug!("Speaking event for unknown user {}", payload.user_id);
        }
    }
}
