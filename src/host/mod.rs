//! Voice server host interface.
//!
//! The transport that talks to the voice server is not part of this crate.
//! It is modelled here as two traits: [`VoiceServer`], the per-server API the
//! router calls into, and [`ServerCallbacks`], the capability set the host
//! invokes for every server and meta event.

pub mod events;
pub mod memory;

pub use events::{EventKind, HostEvent};
pub use memory::{HostCall, MemoryServer};

use crate::error::{HostError, RouterResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Virtual server id as assigned by the voice server.
pub type ServerId = i32;

/// Channel id on one virtual server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i32);

impl ChannelId {
    /// The root channel every server has.
    pub const ROOT: ChannelId = ChannelId(0);
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A channel as reported by the voice server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    /// `None` for the root channel.
    #[serde(default)]
    pub parent: Option<ChannelId>,
}

/// A user's live connection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    /// Connection session id.
    pub session: u32,
    /// Registered user id, `-1` for anonymous users.
    #[serde(default = "anonymous_userid")]
    pub userid: i32,
    pub name: String,
    /// Plugin identity string, possibly empty.
    #[serde(default)]
    pub identity: String,
    /// Plugin context, base64 transport encoding, possibly empty.
    #[serde(default)]
    pub context: String,
    pub channel: ChannelId,
}

fn anonymous_userid() -> i32 {
    -1
}

/// Per-server voice server API.
#[async_trait]
pub trait VoiceServer: Send + Sync {
    /// Id of this virtual server.
    fn id(&self) -> ServerId;

    /// List every channel on the server.
    async fn channels(&self) -> Result<Vec<ChannelInfo>, HostError>;

    /// Create a channel and return its id.
    async fn add_channel(&self, name: &str, parent: ChannelId) -> Result<ChannelId, HostError>;

    /// Remove a channel and all of its descendants.
    async fn remove_channel(&self, id: ChannelId) -> Result<(), HostError>;

    /// Apply `state` (notably its channel) to the user's live session.
    async fn set_state(&self, state: &UserState) -> Result<(), HostError>;
}

/// Callbacks the host invokes, per server and for server lifecycle.
///
/// Channel creation and channel state changes carry nothing the router acts
/// on, so those default to no-ops.
#[async_trait]
pub trait ServerCallbacks: Send + Sync {
    async fn user_connected(&self, server: &dyn VoiceServer, state: UserState) -> RouterResult;

    async fn user_state_changed(&self, server: &dyn VoiceServer, state: UserState)
    -> RouterResult;

    async fn user_disconnected(&self, server: &dyn VoiceServer, state: UserState)
    -> RouterResult;

    async fn channel_created(
        &self,
        _server: &dyn VoiceServer,
        _channel: ChannelInfo,
    ) -> RouterResult {
        Ok(())
    }

    async fn channel_removed(&self, server: &dyn VoiceServer, channel: ChannelInfo)
    -> RouterResult;

    async fn channel_state_changed(
        &self,
        _server: &dyn VoiceServer,
        _channel: ChannelInfo,
    ) -> RouterResult {
        Ok(())
    }

    /// A virtual server came up.
    async fn started(&self, server: &dyn VoiceServer) -> RouterResult;

    /// A virtual server went down.
    async fn stopped(&self, server: &dyn VoiceServer) -> RouterResult;
}
