//! Wire and domain models for the voice overlay.
//!
//! This crate contains pure data structures: the JSON envelope spoken over
//! the local RPC socket, the payloads carried inside it, and the roster
//! entry the connector derives from voice states. Models have no I/O and no
//! connector logic.
//!
//! ## Architecture
//!
//! - **models** (this crate): Pure data structures
//! - **overlay-core**: Connector logic operating on models
//! - **overlay**: Binary wiring everything together

pub mod error;
pub mod protocol;
pub mod roster_entry;
pub mod voice;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use protocol::{Command, Envelope, ErrorCode, ErrorData, Event, OutboundRequest};
pub use roster_entry::RosterEntry;
pub use roster_entry::builder::RosterEntryBuilder;
pub use voice::{
    AuthorizeData, ChannelId, ChannelSelect, SpeakingPayload, UserId, VoiceChannel, VoiceFlags,
    VoiceSettings, VoiceStatePayload, VoiceUser,
};

#[cfg(test)]
mod tests;
