//! Bookkeeping of server-side event subscriptions.
//!
//! While a channel is joined the active set is the five channel-scoped events
//! for that channel; otherwise it is empty. Batches are fanned out: every
//! request is issued before any response is awaited.

use crate::error::rpc::RpcError;
use crate::rpc::{CommandSender, RpcRequest};

use models::{ChannelId, Event};

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use log::{debug, warn};

/// Outcome of one member of a fanned-out batch.
#[derive(Debug)]
pub struct BatchResult {
    pub event: Event,
    pub result: Result<(), RpcError>,
}

/// Active `(event, channel)` subscriptions.
#[derive(Clone, Default)]
pub struct SubscriptionManager {
    active: Arc<Mutex<BTreeSet<(Event, ChannelId)>>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Vec<(Event, ChannelId)> {
        self.lock().iter().cloned().collect()
    }

    pub fn is_subscribed(&self, event: Event, channel: &ChannelId) -> bool {
        self.lock().contains(&(event, channel.clone()))
    }

    /// Subscribe the five channel-scoped events for `channel`.
    ///
    /// Only successful subscriptions are recorded.
    pub async fn subscribe_channel<S: CommandSender>(
        &self,
        sender: &S,
        channel: &ChannelId,
    ) -> Vec<BatchResult> {
        let results = fan_out(sender, &Event::CHANNEL_SCOPED, |event| {
            RpcRequest::subscribe(event, Some(channel))
        })
        .await;

        let mut active = self.lock();
        for outcome in &results {
            match &outcome.result {
                Ok(()) => {
                    active.insert((outcome.event, channel.clone()));
                }
                Err(e) => warn!("SUBSCRIBE {} for channel {channel} failed: {e}", outcome.event),
            }
        }
        results
    }

    /// Unsubscribe the five channel-scoped events for `channel`.
    ///
    /// Every pair is forgotten whatever the server answered; there is no
    /// rollback and no retry.
    pub async fn unsubscribe_channel<S: CommandSender>(
        &self,
        sender: &S,
        channel: &ChannelId,
    ) -> Vec<BatchResult> {
        let results = fan_out(sender, &Event::CHANNEL_SCOPED, |event| {
            RpcRequest::unsubscribe(event, Some(channel))
        })
        .await;

        let mut active = self.lock();
        for outcome in &results {
            active.remove(&(outcome.event, channel.clone()));
            if let Err(e) = &outcome.result {
                warn!("UNSUBSCRIBE {} for channel {channel} failed: {e}", outcome.event);
            }
        }
        results
    }

    /// Subscribe the channel-independent session events.
    pub async fn subscribe_session_events<S: CommandSender>(&self, sender: &S) -> Vec<BatchResult> {
        let results = fan_out(sender, &Event::SESSION_SCOPED, |event| {
            RpcRequest::subscribe(event, None)
        })
        .await;

        for outcome in &results {
            if let Err(e) = &outcome.result {
                warn!("SUBSCRIBE {} failed: {e}", outcome.event);
            }
        }
        results
    }

    /// Drop all bookkeeping without talking to the server. Used when the
    /// session is gone and the server forgot them anyway.
    pub(crate) fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<(Event, ChannelId)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn fan_out<S, F>(sender: &S, events: &[Event], request: F) -> Vec<BatchResult>
where
    S: CommandSender,
    F: Fn(Event) -> RpcRequest,
{
    let batch = events.iter().map(|&event| {
        let future = sender.send(request(event));
        async move {
            BatchResult {
                event,
                result: future.await.map(|_| ()),
            }
        }
    });

    let results = join_all(batch).await;
    debug!(
        "Batch of {} finished with {} failure(s)",
        results.len(),
        results.iter().filter(|r| r.result.is_err()).count()
    );
    results
}
