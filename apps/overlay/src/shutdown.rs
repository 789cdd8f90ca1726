//! Graceful stop on Ctrl-C.

use overlay_core::ConnectionState;

use std::time::Duration;

use log::{debug, warn};
use tokio::time::{sleep, timeout};

pub const DISCONNECT_GRACE: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Poll `state` until it reports [`ConnectionState::Disconnected`] or `grace` runs out.
///
/// `Connector::disconnect` only queues the close frame; the session's writer
/// still has to send it and the supervisor has to observe the close before
/// the runtime may shut down. Returns whether the connector got there in time.
pub async fn wait_until_disconnected<F>(state: F, grace: Duration) -> bool
where
    F: Fn() -> ConnectionState,
{
    let settled = timeout(grace, async {
        while state() != ConnectionState::Disconnected {
            sleep(POLL_INTERVAL).await;
        }
    })
    .await;

    match settled {
        Ok(()) => {
            debug!("Connector disconnected");
            true
        }
        Err(_) => {
            warn!("Connector still {:?} after {grace:?}, exiting anyway", state());
            false
        }
    }
}
