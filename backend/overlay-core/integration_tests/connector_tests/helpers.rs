//! In-process stand-in for the voice application's RPC socket.
//!
//! - Binds a loopback port and answers every command with scripted data
//! - Sends READY as soon as a client connects
//! - Lets tests push dispatch frames, raw text, or close the live connection

use overlay_core::config::ConnectorConfig;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ONE_TIME_CODE: &str = "one-time-code";
pub const ACCESS_TOKEN: &str = "test-access-token";
pub const TEST_ORIGIN: &str = "https://streamkit.discord.com";
pub const CHANNEL_ID: &str = "7";

enum ServerCommand {
    Push(Value),
    Raw(String),
    Close,
}

#[derive(Debug, Clone)]
pub struct Handshake {
    pub uri: String,
    pub origin: Option<String>,
}

#[derive(Default)]
struct AppState {
    received: Mutex<Vec<Value>>,
    handshakes: Mutex<Vec<Handshake>>,
    connections: AtomicUsize,
    control: Mutex<Option<UnboundedSender<ServerCommand>>>,
    settings: Mutex<Value>,
}

pub struct FakeVoiceApp {
    pub port: u16,
    state: Arc<AppState>,
}

impl FakeVoiceApp {
    pub fn start(listener: TcpListener) -> Self {
        let port = listener.local_addr().expect("local addr").port();
        let state = Arc::new(AppState {
            settings: Mutex::new(json!({"mute": false, "deaf": false})),
            ..AppState::default()
        });

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_state)));
            }
        });

        Self { port, state }
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn handshakes(&self) -> Vec<Handshake> {
        self.state.handshakes.lock().expect("handshakes lock").clone()
    }

    /// Commands received so far, by name.
    pub fn commands(&self) -> Vec<String> {
        self.state
            .received
            .lock()
            .expect("received lock")
            .iter()
            .filter_map(|frame| frame["cmd"].as_str().map(String::from))
            .collect()
    }

    pub fn settings(&self) -> Value {
        self.state.settings.lock().expect("settings lock").clone()
    }

    pub fn push(&self, evt: &str, data: Value) {
        self.control(ServerCommand::Push(
            json!({"cmd": "DISPATCH", "evt": evt, "data": data}),
        ));
    }

    pub fn push_raw(&self, text: &str) {
        self.control(ServerCommand::Raw(text.to_string()));
    }

    /// Close the live connection from the server side.
    pub fn close_connection(&self) {
        self.control(ServerCommand::Close);
    }

    fn control(&self, command: ServerCommand) {
        let control = self.state.control.lock().expect("control lock");
        control
            .as_ref()
            .expect("no live connection")
            .send(command)
            .ok()
            .expect("connection task gone");
    }
}

async fn serve(stream: TcpStream, state: Arc<AppState>) {
    let handshake_state = Arc::clone(&state);
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let origin = request
            .headers()
            .get("origin")
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        handshake_state
            .handshakes
            .lock()
            .expect("handshakes lock")
            .push(Handshake {
                uri: request.uri().to_string(),
                origin,
            });
        Ok(response)
    };

    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    *state.control.lock().expect("control lock") = Some(tx);
    state.connections.fetch_add(1, Ordering::SeqCst);

    let ready = json!({"cmd": "DISPATCH", "evt": "READY", "data": {"v": 1}});
    if ws.send(Message::Text(ready.to_string().into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let request: Value = serde_json::from_str(text.as_str()).expect("client sent JSON");
                    state.received.lock().expect("received lock").push(request.clone());
                    let reply = reply_to(&state, &request);
                    if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                _ => break,
            },
            command = rx.recv() => match command {
                Some(ServerCommand::Push(frame)) => {
                    if ws.send(Message::Text(frame.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(ServerCommand::Raw(text)) => {
                    if ws.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(ServerCommand::Close) | None => {
                    let _ = ws.close(None).await;
                    break;
                }
            },
        }
    }
}

fn reply_to(state: &AppState, request: &Value) -> Value {
    let cmd = request["cmd"].as_str().unwrap_or_default();
    let data = match cmd {
        "AUTHORIZE" => json!({"code": ONE_TIME_CODE}),
        "AUTHENTICATE" if request["args"]["access_token"] == ACCESS_TOKEN => {
            json!({"user": {"id": "self", "username": "me"}})
        }
        "AUTHENTICATE" => {
            return json!({
                "cmd": cmd,
                "evt": "ERROR",
                "nonce": request["nonce"],
                "data": {"code": 4009, "message": "Invalid user"}
            });
        }
        "GET_SELECTED_VOICE_CHANNEL" | "GET_CHANNEL" => channel_seven(),
        "GET_VOICE_SETTINGS" => state.settings.lock().expect("settings lock").clone(),
        "SET_VOICE_SETTINGS" => {
            let mut settings = state.settings.lock().expect("settings lock");
            if let (Some(current), Some(args)) = (settings.as_object_mut(), request["args"].as_object()) {
                for (key, value) in args {
                    current.insert(key.clone(), value.clone());
                }
            }
            settings.clone()
        }
        _ => Value::Null,
    };

    json!({"cmd": cmd, "evt": request["evt"], "nonce": request["nonce"], "data": data})
}

pub fn voice_state(id: &str, username: &str) -> Value {
    json!({
        "nick": null,
        "voice_state": {"mute": false, "deaf": false, "self_mute": false, "self_deaf": false},
        "user": {"id": id, "username": username, "avatar": null}
    })
}

fn channel_seven() -> Value {
    json!({
        "id": CHANNEL_ID,
        "name": "General",
        "voice_states": [voice_state("u1", "one"), voice_state("u2", "two")]
    })
}

/// Bind a listener on a port whose predecessor is free, so a scan starting one
/// port below has to skip a dead port first.
pub async fn bind_after_free_port() -> (TcpListener, u16) {
    for base in (41_000u16..43_000).step_by(7) {
        let Ok(probe) = TcpListener::bind(("127.0.0.1", base)).await else {
            continue;
        };
        drop(probe);
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", base + 1)).await {
            return (listener, base);
        }
    }
    panic!("No free pair of consecutive ports found");
}

/// Token exchange endpoint trading [`ONE_TIME_CODE`] for [`ACCESS_TOKEN`].
pub async fn start_token_exchange() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/overlay/token"))
        .and(body_json(json!({"code": ONE_TIME_CODE})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": ACCESS_TOKEN})))
        .mount(&server)
        .await;
    server
}

pub fn test_config(min_port: u16, max_port: u16, exchange: &MockServer) -> ConnectorConfig {
    ConnectorConfig {
        origin: TEST_ORIGIN.to_string(),
        token_exchange_url: format!("{}/overlay/token", exchange.uri()),
        min_port,
        max_port,
        reconnect_delay: Duration::from_millis(20),
        request_timeout: Duration::from_millis(1000),
        auth_retry_delay: Duration::from_millis(20),
        ..ConnectorConfig::default()
    }
}

/// Poll `condition` every 10 ms until it holds or `limit` passes.
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
