//! Local mute/deafen toggles.
//!
//! The mirror in [`SharedState`] is only ever written from the server's
//! answer; a failed round trip leaves it untouched.

use crate::error::rpc::RpcError;
use crate::rpc::{CommandSender, RpcRequest, voice_settings_from};
use crate::state::SharedState;

use models::VoiceSettings;

use log::{debug, warn};

pub async fn toggle_mute<S: CommandSender>(
    sender: &S,
    state: &SharedState,
) -> Result<VoiceSettings, RpcError> {
    let mute = !state.voice_settings().mute;
    apply(sender, state, RpcRequest::set_mute(mute)).await
}

pub async fn toggle_deafen<S: CommandSender>(
    sender: &S,
    state: &SharedState,
) -> Result<VoiceSettings, RpcError> {
    let deaf = !state.voice_settings().deaf;
    apply(sender, state, RpcRequest::set_deaf(deaf)).await
}

async fn apply<S: CommandSender>(
    sender: &S,
    state: &SharedState,
    request: RpcRequest,
) -> Result<VoiceSettings, RpcError> {
    let result = match sender.send(request).await {
        Ok(response) => voice_settings_from(&response),
        Err(e) => Err(e),
    };

    match result {
        Ok(settings) => {
            debug!("Voice settings now {settings:?}");
            state.set_voice_settings(settings);
            Ok(settings)
        }
        Err(e) => {
            warn!("SET_VOICE_SETTINGS failed: {e}");
            Err(e)
        }
    }
}
