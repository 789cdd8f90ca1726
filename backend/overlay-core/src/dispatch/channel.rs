//! Channel transitions: leave the old channel, join the new one.

use crate::error::CoreError;
use crate::rpc::{CommandSender, RpcRequest};
use crate::state::SharedState;
use crate::subscriptions::SubscriptionManager;

use models::{ChannelId, RosterEntry, VoiceChannel};

use log::{debug, info, warn};

/// Forget the current channel: empty the roster, then unsubscribe its five
/// channel-scoped streams and wait for every unsubscribe to settle.
///
/// No-op when not in a channel.
pub async fn leave_channel<S: CommandSender>(
    sender: &S,
    state: &SharedState,
    subscriptions: &SubscriptionManager,
) {
    let Some(previous) = state.set_current_channel(None) else {
        return;
    };

    state.roster.clear();
    subscriptions.unsubscribe_channel(sender, &previous).await;
    info!("Left voice channel {previous}");
}

/// Snapshot `channel`'s members into the roster, then subscribe its streams.
pub async fn join_channel<S: CommandSender>(
    sender: &S,
    state: &SharedState,
    subscriptions: &SubscriptionManager,
    channel: VoiceChannel,
    avatar_base_url: &str,
) {
    state.set_current_channel(Some(channel.id.clone()));
    state.roster.clear();

    for voice_state in &channel.voice_states {
        match RosterEntry::from_voice_state(voice_state, avatar_base_url) {
            Ok(entry) => {
                state.roster.insert(entry);
            }
            Err(e) => warn!("Skipping member of channel {}: {e}", channel.id),
        }
    }
    info!(
        "Joined voice channel {} with {} member(s)",
        channel.id,
        state.roster.len()
    );

    subscriptions.subscribe_channel(sender, &channel.id).await;
}

/// Move to `target`, leaving the current channel first.
///
/// Selecting the channel already joined is a no-op. The target's snapshot is
/// fetched with GET_CHANNEL; if that fails the connector stays channel-less.
pub async fn change_channel<S: CommandSender>(
    sender: &S,
    state: &SharedState,
    subscriptions: &SubscriptionManager,
    target: Option<ChannelId>,
    avatar_base_url: &str,
) -> Result<(), CoreError> {
    if state.current_channel() == target {
        debug!("Channel selection unchanged ({target:?})");
        return Ok(());
    }

    leave_channel(sender, state, subscriptions).await;

    let Some(target) = target else {
        return Ok(());
    };

    let response = sender.send(RpcRequest::get_channel(&target)).await?;
    let channel: VoiceChannel = response.data_as()?;
    join_channel(sender, state, subscriptions, channel, avatar_base_url).await;
    Ok(())
}
