//! Socket lifecycle: port scan, session, reconnect.

pub mod manager;
pub mod port;

pub use manager::Connector;
pub use port::PortCycle;

use crate::error::connection::ConnectionError;
use crate::{RPC_PROTOCOL_VERSION, VOICE_APP_WS_BASE_URL};

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// `ws://127.0.0.1:{port}/?v=1&client_id={client_id}`
pub fn build_connection_url(port: u16, client_id: &str) -> Result<Url, ConnectionError> {
    let version = RPC_PROTOCOL_VERSION.to_string();
    let url = Url::parse_with_params(
        &format!("{VOICE_APP_WS_BASE_URL}:{port}/"),
        [("v", version.as_str()), ("client_id", client_id)],
    )?;
    Ok(url)
}
