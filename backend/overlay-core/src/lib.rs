//! Connector core for the voice overlay.
//!
//! Keeps a session open with the voice application's local RPC socket and
//! mirrors the current voice channel's members into an observable roster.

pub mod auth;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod roster;
pub mod rpc;
pub mod state;
pub mod subscriptions;
pub mod voice_settings;

#[cfg(test)]
mod tests;

pub use auth::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use config::{ConnectorConfig, Settings};
pub use connection::{ConnectionState, Connector};
pub use error::CoreError;
pub use roster::{ObserverHandle, Roster, RosterChange, RosterModel};

pub const VOICE_APP_HOSTNAME: &str = "127.0.0.1";
pub const VOICE_APP_WS_BASE_URL: &str = const_format::concatcp!("ws://", VOICE_APP_HOSTNAME);
pub const RPC_PROTOCOL_VERSION: u32 = 1;
pub const MIN_PORT: u16 = 6463;
pub const MAX_PORT: u16 = 6472;

pub const DEFAULT_CLIENT_ID: &str = "207646673902501888";
pub const STREAMKIT_ORIGIN: &str = "https://streamkit.discord.com";
pub const TOKEN_EXCHANGE_PATH: &str = "/overlay/token";
pub const TOKEN_EXCHANGE_URL: &str = const_format::concatcp!(STREAMKIT_ORIGIN, TOKEN_EXCHANGE_PATH);
pub const AVATAR_BASE_URL: &str = "https://cdn.discordapp.com/avatars";
