use crate::error::rpc::RpcError;
use crate::rpc::{CommandSender, PendingRequests, RpcRequest};

use common::ErrorLocation;

use models::{Envelope, OutboundRequest};

use std::panic::Location;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use log::{debug, trace};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// Sends commands over the live socket and awaits their correlated responses.
///
/// The outbound slot is filled while a session is up and emptied when it
/// closes; sending with an empty slot fails with [`RpcError::NotConnected`]
/// without touching the network. Cloning shares the slot and pending table.
#[derive(Clone)]
pub struct RpcClient {
    outbound: Arc<RwLock<Option<UnboundedSender<Message>>>>,
    pending: PendingRequests,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            outbound: Arc::new(RwLock::new(None)),
            pending: PendingRequests::new(),
            request_timeout,
        }
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn is_attached(&self) -> bool {
        self.outbound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Route outbound frames into a live session's writer.
    pub(crate) fn attach(&self, writer: UnboundedSender<Message>) {
        *self.outbound.write().unwrap_or_else(PoisonError::into_inner) = Some(writer);
    }

    pub(crate) fn detach(&self) {
        *self.outbound.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Queue a raw frame (close frames) on the live session.
    pub(crate) fn send_raw(&self, message: Message) -> Result<(), RpcError> {
        let writer = self.writer()?;
        writer.send(message).map_err(|e| RpcError::Transport {
            message: format!("Session writer closed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn writer(&self) -> Result<UnboundedSender<Message>, RpcError> {
        self.outbound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| RpcError::NotConnected {
                message: String::from("No live connection to the voice application"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Assign a nonce, transmit, and wait for the matching response.
    ///
    /// # Errors
    ///
    /// - [`RpcError::NotConnected`] if no session is live (nothing is written)
    /// - [`RpcError::Timeout`] if no response arrives within the request window
    /// - [`RpcError::Protocol`] if the response is an `ERROR`
    pub async fn request(&self, request: RpcRequest) -> Result<Envelope, RpcError> {
        let writer = self.writer()?;

        let nonce = Uuid::new_v4().to_string();
        let cmd = request.cmd;
        let frame = serde_json::to_string(&OutboundRequest {
            cmd: request.cmd,
            args: request.args,
            evt: request.evt,
            nonce: nonce.clone(),
        })?;

        let deadline = Instant::now() + self.request_timeout;
        let receiver = self.pending.register(nonce.clone(), deadline);
        let _entry = self.pending.guard(nonce.clone());

        if let Err(e) = writer.send(Message::Text(frame.into())) {
            return Err(RpcError::NotConnected {
                message: format!("Session closed while sending {cmd:?}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        trace!("Sent {cmd:?} with nonce {nonce}");

        let envelope = match timeout_at(deadline, receiver).await {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(_)) => {
                return Err(RpcError::Closed {
                    message: format!("{cmd:?} {nonce} dropped without a response"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(_) => {
                debug!("{cmd:?} {nonce} timed out after {:?}", self.request_timeout);
                return Err(RpcError::Timeout {
                    message: format!(
                        "No response to {cmd:?} within {:?}",
                        self.request_timeout
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        if let Some(error) = envelope.error_data() {
            return Err(RpcError::Protocol {
                code: error.code,
                message: error.message,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if envelope.is_error() {
            return Err(RpcError::Protocol {
                code: 0,
                message: format!("{cmd:?} failed without error details"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(envelope)
    }
}

impl CommandSender for RpcClient {
    async fn send(&self, request: RpcRequest) -> Result<Envelope, RpcError> {
        self.request(request).await
    }
}
