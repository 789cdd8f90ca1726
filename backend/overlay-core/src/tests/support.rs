//! Shared fixtures: a scripted command sender and frame builders.

use crate::error::rpc::RpcError;
use crate::rpc::{CommandSender, RpcRequest};

use common::ErrorLocation;

use models::{Command, Envelope, Event, RosterEntry, RosterEntryBuilder};

use std::future::Future;
use std::panic::Location;
use std::sync::{Arc, Mutex};

use serde_json::Value;

type Responder = dyn Fn(&RpcRequest) -> Result<Envelope, RpcError> + Send + Sync;

/// Records every request at call time and answers from a script.
#[derive(Clone)]
pub struct FakeSender {
    sent: Arc<Mutex<Vec<RpcRequest>>>,
    responder: Arc<Responder>,
}

impl FakeSender {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RpcRequest) -> Result<Envelope, RpcError> + Send + Sync + 'static,
    {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Answers every request with an empty success.
    pub fn succeeding() -> Self {
        Self::new(|request| Ok(response(request.cmd, Value::Null)))
    }

    pub fn sent(&self) -> Vec<RpcRequest> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.sent().iter().map(|request| request.cmd).collect()
    }
}

impl CommandSender for FakeSender {
    fn send(&self, request: RpcRequest) -> impl Future<Output = Result<Envelope, RpcError>> + Send {
        let result = (self.responder)(&request);
        self.sent.lock().expect("sent lock").push(request);
        async move { result }
    }
}

pub fn response(cmd: Command, data: Value) -> Envelope {
    Envelope {
        cmd,
        args: None,
        evt: None,
        nonce: Some(String::from("nonce")),
        data: if data.is_null() { None } else { Some(data) },
    }
}

pub fn dispatch(evt: Event, data: Value) -> Envelope {
    Envelope {
        cmd: Command::Dispatch,
        args: None,
        evt: Some(evt),
        nonce: None,
        data: Some(data),
    }
}

#[track_caller]
pub fn protocol_error(code: i64) -> RpcError {
    RpcError::Protocol {
        code,
        message: String::from("scripted failure"),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
pub fn timeout_error() -> RpcError {
    RpcError::Timeout {
        message: String::from("scripted timeout"),
        location: ErrorLocation::from(Location::caller()),
    }
}

pub fn entry(id: &str, name: &str) -> RosterEntry {
    RosterEntryBuilder::default()
        .with_id(id)
        .with_display_name(name)
        .build()
        .expect("valid roster entry")
}

pub fn voice_state(id: &str, username: &str) -> Value {
    serde_json::json!({
        "nick": null,
        "voice_state": {"mute": false, "deaf": false, "self_mute": false, "self_deaf": false},
        "user": {"id": id, "username": username, "avatar": null}
    })
}
