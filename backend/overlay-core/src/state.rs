use crate::roster::RosterModel;

use models::{ChannelId, VoiceSettings};

use std::sync::{Arc, PoisonError, RwLock};

/// Session-derived state shared between the connector handle and its tasks.
///
/// The event task is the only writer; consumers read through the connector.
#[derive(Clone, Default)]
pub struct SharedState {
    pub roster: RosterModel,
    current_channel: Arc<RwLock<Option<ChannelId>>>,
    voice_settings: Arc<RwLock<VoiceSettings>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_channel(&self) -> Option<ChannelId> {
        self.current_channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_current_channel(&self, channel: Option<ChannelId>) -> Option<ChannelId> {
        let mut current = self
            .current_channel
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, channel)
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        *self
            .voice_settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_voice_settings(&self, settings: VoiceSettings) {
        *self
            .voice_settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Forget everything tied to the live session.
    pub(crate) fn reset_session(&self) {
        self.roster.clear();
        self.set_current_channel(None);
    }
}
