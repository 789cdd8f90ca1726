use models::Envelope;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, trace};
use tokio::sync::oneshot;
use tokio::time::Instant;

struct PendingRequest {
    responder: oneshot::Sender<Envelope>,
    deadline: Instant,
}

/// Table of in-flight requests keyed by nonce.
///
/// An entry lives until its response arrives or its deadline passes,
/// whichever is first. Cloning shares the table.
#[derive(Clone, Default)]
pub struct PendingRequests {
    entries: Arc<Mutex<HashMap<String, PendingRequest>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a nonce and get the receiver its response will be delivered to.
    ///
    /// Entries already past their deadline are swept out first.
    pub fn register(&self, nonce: String, deadline: Instant) -> oneshot::Receiver<Envelope> {
        let (responder, receiver) = oneshot::channel();
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, pending| pending.deadline >= now);
        if entries.len() < before {
            debug!("Swept {} expired pending request(s)", before - entries.len());
        }
        entries.insert(
            nonce,
            PendingRequest {
                responder,
                deadline,
            },
        );
        receiver
    }

    /// Offer an inbound frame to the table.
    ///
    /// Returns `None` when the frame answered a pending request (it was
    /// consumed), or hands the frame back for dispatch otherwise. Entries
    /// whose deadline has passed are discarded, never resolved.
    pub fn resolve(&self, envelope: Envelope) -> Option<Envelope> {
        let Some(nonce) = envelope.nonce.clone() else {
            return Some(envelope);
        };

        let entry = self.lock().remove(&nonce);
        match entry {
            Some(pending) if Instant::now() <= pending.deadline => {
                if pending.responder.send(envelope).is_err() {
                    debug!("Requester for nonce {nonce} went away before its response");
                }
                None
            }
            Some(_) => {
                debug!("Discarding late response for nonce {nonce}");
                Some(envelope)
            }
            None => Some(envelope),
        }
    }

    /// Drop an entry. Returns whether it was still pending.
    pub fn discard(&self, nonce: &str) -> bool {
        self.lock().remove(nonce).is_some()
    }

    pub fn contains(&self, nonce: &str) -> bool {
        self.lock().contains_key(nonce)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Tie an entry's lifetime to the returned guard.
    pub(crate) fn guard(&self, nonce: String) -> PendingGuard {
        PendingGuard {
            pending: self.clone(),
            nonce,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Discards its entry when dropped, whether the request finished, timed out
/// or its future was cancelled.
pub(crate) struct PendingGuard {
    pending: PendingRequests,
    nonce: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.pending.discard(&self.nonce) {
            trace!("Pending request {} dropped before its response", self.nonce);
        }
    }
}
