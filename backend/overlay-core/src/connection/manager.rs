//! The connector: one supervisor task owning the socket lifecycle.
//!
//! The supervisor scans the port range until a handshake succeeds, runs the
//! session until the socket closes, then starts over after the reconnect
//! delay for as long as the connector is meant to stay connected. Each
//! session has three parts:
//!
//! - the read loop (inside the supervisor), which resolves pending requests
//!   and forwards everything else in arrival order
//! - the event task, which applies pushes one at a time
//! - the writer task, which owns the socket sink

use crate::auth::{Authenticator, TokenStore};
use crate::config::ConnectorConfig;
use crate::connection::{ConnectionState, PortCycle, build_connection_url};
use crate::dispatch::EventDispatcher;
use crate::error::CoreError;
use crate::error::connection::ConnectionError;
use crate::error::rpc::RpcError;
use crate::roster::RosterModel;
use crate::rpc::{CommandSender, RpcClient, RpcRequest};
use crate::state::SharedState;
use crate::subscriptions::SubscriptionManager;
use crate::voice_settings;

use models::{ChannelId, Envelope, VoiceChannel, VoiceSettings};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use backoff::backoff::{Backoff, Constant};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Message, Utf8Bytes};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type VoiceSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Lifecycle {
    state: ConnectionState,
    should_connect: bool,
    supervisor_active: bool,
}

struct Inner {
    config: ConnectorConfig,
    rpc: RpcClient,
    shared: SharedState,
    subscriptions: SubscriptionManager,
    authenticator: Authenticator,
    lifecycle: Mutex<Lifecycle>,
}

/// Persistent, self-healing client of the voice application's local RPC socket.
///
/// Cloning yields another handle to the same connector.
#[derive(Clone)]
pub struct Connector {
    inner: Arc<Inner>,
}

impl Connector {
    /// Build a connector. Nothing touches the network until [`Connector::connect`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for an invalid configuration and
    /// [`CoreError::Auth`] for an unusable token exchange URL.
    pub fn new(config: ConnectorConfig, store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        config.validate()?;
        let authenticator = Authenticator::new(&config, store)?;

        Ok(Self {
            inner: Arc::new(Inner {
                rpc: RpcClient::new(config.request_timeout),
                shared: SharedState::new(),
                subscriptions: SubscriptionManager::new(),
                authenticator,
                lifecycle: Mutex::new(Lifecycle {
                    state: ConnectionState::Disconnected,
                    should_connect: false,
                    supervisor_active: false,
                }),
                config,
            }),
        })
    }

    /// Start (or keep) connecting. Idempotent while a supervisor is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        {
            let mut lifecycle = self.lifecycle();
            lifecycle.should_connect = true;
            if lifecycle.supervisor_active {
                debug!("connect(): already {:?}", lifecycle.state);
                return;
            }
            lifecycle.supervisor_active = true;
        }

        let connector = self.clone();
        TokioSpawn(async move { connector.supervise().await });
    }

    /// Stop reconnecting and close the live socket, if any, with a normal closure.
    pub fn disconnect(&self) {
        let connected = {
            let mut lifecycle = self.lifecycle();
            lifecycle.should_connect = false;
            lifecycle.state == ConnectionState::Connected
        };

        if connected {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: Utf8Bytes::from_static("disconnect"),
            };
            if let Err(e) = self.inner.rpc.send_raw(Message::Close(Some(frame))) {
                debug!("Close frame not sent: {e}");
            }
        }
        info!("Disconnect requested");
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle().state
    }

    /// Read-only roster of the current channel.
    pub fn roster(&self) -> &RosterModel {
        &self.inner.shared.roster
    }

    pub fn current_channel(&self) -> Option<ChannelId> {
        self.inner.shared.current_channel()
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        self.inner.shared.voice_settings()
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.inner.subscriptions
    }

    pub async fn toggle_mute(&self) -> Result<VoiceSettings, RpcError> {
        voice_settings::toggle_mute(&self.inner.rpc, &self.inner.shared).await
    }

    pub async fn toggle_deafen(&self) -> Result<VoiceSettings, RpcError> {
        voice_settings::toggle_deafen(&self.inner.rpc, &self.inner.shared).await
    }

    /// Look up a channel without touching the roster.
    pub async fn get_channel(&self, channel_id: &ChannelId) -> Result<VoiceChannel, RpcError> {
        let response = self
            .inner
            .rpc
            .send(RpcRequest::get_channel(channel_id))
            .await?;
        Ok(response.data_as()?)
    }

    async fn supervise(self) {
        let config = &self.inner.config;
        let mut ports = PortCycle::new(config.min_port, config.max_port);
        let mut reconnect = Constant::new(config.reconnect_delay);

        while self.keep_running() {
            self.set_state(ConnectionState::Connecting);
            let port = ports.current();

            match self.handshake(port).await {
                Ok(mut socket) => {
                    if !self.keep_running() {
                        let _ = socket.close(None).await;
                        return;
                    }
                    info!("Connected to the voice application on port {port}");
                    self.set_state(ConnectionState::Connected);
                    self.run_session(socket).await;
                    info!("Connection on port {port} closed");
                }
                Err(e) => {
                    debug!("{e}");
                    ports.advance();
                }
            }

            self.set_state(ConnectionState::Disconnected);
            if !self.keep_running() {
                return;
            }
            let delay = reconnect.next_backoff().unwrap_or(config.reconnect_delay);
            tokio::time::sleep(delay).await;
        }
    }

    async fn handshake(&self, port: u16) -> Result<VoiceSocket, ConnectionError> {
        let url = build_connection_url(port, &self.inner.config.client_id)?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectionError::handshake(port, e))?;
        request
            .headers_mut()
            .insert(ORIGIN, HeaderValue::from_str(&self.inner.config.origin)?);

        let (socket, _response) = connect_async(request)
            .await
            .map_err(|e| ConnectionError::handshake(port, e))?;
        Ok(socket)
    }

    async fn run_session(&self, socket: VoiceSocket) {
        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<Envelope>();

        self.inner.rpc.attach(outbound_tx);

        let writer = TokioSpawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    warn!("Transport error while writing: {e}");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let dispatcher = EventDispatcher::new(
            self.inner.rpc.clone(),
            self.inner.shared.clone(),
            self.inner.subscriptions.clone(),
            self.inner.authenticator.clone(),
            self.inner.config.avatar_base_url.clone(),
        );
        let events = TokioSpawn(dispatcher.run(events_rx));

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => self.on_text(text.as_str(), &events_tx),
                Ok(Message::Close(frame)) => debug!("Close frame received: {frame:?}"),
                Ok(Message::Binary(_)) => debug!("Ignoring binary frame"),
                Ok(_) => {}
                Err(e) => {
                    warn!("Transport error: {e}");
                    break;
                }
            }
        }

        self.inner.rpc.detach();
        drop(events_tx);
        events.abort();
        writer.abort();
        let _ = events.await;
        let _ = writer.await;

        self.inner.subscriptions.reset();
        self.inner.shared.reset_session();
    }

    fn on_text(&self, text: &str, events: &UnboundedSender<Envelope>) {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping frame: {e}");
                return;
            }
        };

        if let Some(unmatched) = self.inner.rpc.pending().resolve(envelope) {
            if events.send(unmatched).is_err() {
                debug!("Event task gone, dropping frame");
            }
        }
    }

    /// Whether the supervisor should carry on. Clears the running flag under
    /// the same lock when it should not, so a concurrent `connect()` either
    /// sees the flag or is seen by the supervisor.
    fn keep_running(&self) -> bool {
        let mut lifecycle = self.lifecycle();
        if lifecycle.should_connect {
            return true;
        }
        lifecycle.supervisor_active = false;
        lifecycle.state = ConnectionState::Disconnected;
        false
    }

    fn set_state(&self, state: ConnectionState) {
        self.lifecycle().state = state;
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
