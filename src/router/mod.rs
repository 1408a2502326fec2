//! Routing engine.
//!
//! The [`Router`] implements the host callback set. State updates go through
//! [`update`]: skip unchanged data, parse the plugin payload, pick the
//! destination channel and move the user there.
//!
//! Per-server state lives behind a `tokio::sync::Mutex` that is held for the
//! whole handling of an event, host calls included. Events for one server are
//! therefore serialized even if the host delivers them concurrently, which is
//! what keeps group channel creation at one channel per party.

mod update;

use crate::config::{Config, ConfigError, WorldMaps};
use crate::error::{HostError, RouterResult};
use crate::host::{ChannelId, ChannelInfo, ServerCallbacks, ServerId, UserState, VoiceServer};
use crate::metrics;
use crate::state::{Removal, ServerContext, Session};
use crate::telemetry::spans;
use async_trait::async_trait;
use dashmap::DashMap;
use proxvoice_proto::PluginSignature;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{Instrument, debug, info, trace, warn};

/// Static routing settings, derived from configuration.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub signature: PluginSignature,
    pub world_maps: WorldMaps,
    pub remove_empty_groups: bool,
}

impl RouterSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            signature: PluginSignature::new(config.router.plugin_signature.clone()),
            world_maps: config.worldmaps.parse()?,
            remove_empty_groups: config.router.remove_empty_groups,
        })
    }
}

/// Where a user was sent; used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Map,
    WaitingRoom,
    Group,
}

impl Destination {
    pub fn label(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::WaitingRoom => "waiting_room",
            Self::Group => "group",
        }
    }
}

/// Session-state reconciliation and channel routing for every virtual server.
pub struct Router {
    settings: RouterSettings,
    servers: DashMap<ServerId, Arc<Mutex<ServerContext>>>,
}

impl Router {
    pub fn new(settings: RouterSettings) -> Self {
        Self {
            settings,
            servers: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// The context of `server_id`, created on first use.
    fn context(&self, server_id: ServerId) -> Arc<Mutex<ServerContext>> {
        // Clone out so the shard guard drops before any await.
        self.servers.entry(server_id).or_default().clone()
    }

    fn existing_context(&self, server_id: ServerId) -> Option<Arc<Mutex<ServerContext>>> {
        self.servers.get(&server_id).map(|c| c.value().clone())
    }

    fn is_live(&self, server_id: ServerId, handle: &Arc<Mutex<ServerContext>>) -> bool {
        self.existing_context(server_id)
            .is_some_and(|live| Arc::ptr_eq(&live, handle))
    }

    /// Lock the context of `server_id`, creating it on first use.
    ///
    /// A [`reset_server`](Self::reset_server) may drop the context while we
    /// wait for it; the lock is only returned for the context still in place.
    async fn lock_context(&self, server_id: ServerId) -> OwnedMutexGuard<ServerContext> {
        loop {
            let handle = self.context(server_id);
            let guard = handle.clone().lock_owned().await;
            if self.is_live(server_id, &handle) {
                return guard;
            }
        }
    }

    /// Like [`lock_context`](Self::lock_context), without creating one.
    async fn lock_existing(&self, server_id: ServerId) -> Option<OwnedMutexGuard<ServerContext>> {
        loop {
            let handle = self.existing_context(server_id)?;
            let guard = handle.clone().lock_owned().await;
            if self.is_live(server_id, &handle) {
                return Some(guard);
            }
        }
    }

    /// Drop all state kept for `server_id`.
    ///
    /// Sessions are forgotten and the channel hierarchy is rebuilt on the
    /// next state update.
    pub async fn reset_server(&self, server_id: ServerId) -> bool {
        let Some((_, ctx)) = self.servers.remove(&server_id) else {
            return false;
        };
        let tracked = ctx.lock().await.sessions.len();
        metrics::add_tracked_sessions(-(tracked as i64));
        true
    }

    /// Run `f` against the context of `server_id`, if there is one.
    pub async fn inspect<R>(
        &self,
        server_id: ServerId,
        f: impl FnOnce(&ServerContext) -> R,
    ) -> Option<R> {
        let ctx = self.existing_context(server_id)?;
        let guard = ctx.lock().await;
        Some(f(&guard))
    }

    /// The stored snapshot of one session.
    pub async fn snapshot(&self, server_id: ServerId, session: u32) -> Option<Session> {
        self.inspect(server_id, |ctx| ctx.sessions.snapshot(session).cloned())
            .await
            .flatten()
    }

    /// Every tracked session of `server_id` as a JSON array, ordered by
    /// session id.
    pub async fn dump(&self, server_id: ServerId) -> Option<Value> {
        self.inspect(server_id, |ctx| {
            let mut sessions: Vec<&Session> = ctx.sessions.iter().collect();
            sessions.sort_by_key(|s| s.session);
            serde_json::to_value(sessions)
        })
        .await?
        .map_err(|e| warn!(server_id, error = %e, "Failed to serialize sessions"))
        .ok()
    }

    /// Bring the topology in line after the host rejected one of its channels.
    fn forget_missing(&self, server_id: ServerId, ctx: &mut ServerContext, error: &HostError) {
        let HostError::NoSuchChannel(channel) = error else {
            return;
        };
        match ctx.topology.on_missing_channel(*channel) {
            Removal::Topology => warn!(
                server_id,
                channel = %channel,
                "Proximity channel missing on server, hierarchy will be rebuilt"
            ),
            Removal::Group(key) => warn!(
                server_id,
                group = key,
                channel = %channel,
                "Group channel missing on server, it will be recreated"
            ),
            Removal::Unrelated => {}
        }
    }

    /// Remove the group channel `channel` if no tracked session is left in it.
    async fn prune_group(&self, server: &dyn VoiceServer, ctx: &mut ServerContext, channel: ChannelId) {
        if !self.settings.remove_empty_groups {
            return;
        }
        let Some(key) = ctx.topology.group_of(channel) else {
            return;
        };
        if ctx.sessions.occupants(channel) > 0 {
            return;
        }

        match server.remove_channel(channel).await {
            Ok(()) => {
                ctx.topology.forget_group(key);
                metrics::record_group_removed();
                info!(server_id = server.id(), group = key, channel = %channel, "Empty group channel removed");
            }
            Err(e) => {
                warn!(server_id = server.id(), group = key, channel = %channel, error = %e, "Failed to remove empty group channel");
            }
        }
    }
}

#[async_trait]
impl ServerCallbacks for Router {
    async fn user_connected(&self, server: &dyn VoiceServer, state: UserState) -> RouterResult {
        let span = spans::user(server.id(), state.session, &state.name);
        self.handle_update(server, state).instrument(span).await
    }

    async fn user_state_changed(&self, server: &dyn VoiceServer, state: UserState) -> RouterResult {
        let span = spans::user(server.id(), state.session, &state.name);
        self.handle_update(server, state).instrument(span).await
    }

    async fn user_disconnected(&self, server: &dyn VoiceServer, state: UserState) -> RouterResult {
        let Some(mut guard) = self.lock_existing(server.id()).await else {
            return Ok(());
        };

        let Some(session) = guard.sessions.remove(state.session) else {
            trace!(server_id = server.id(), session = state.session, "Disconnect for untracked session");
            return Ok(());
        };
        metrics::add_tracked_sessions(-1);
        debug!(server_id = server.id(), session = state.session, user = %state.name, "Session forgotten");

        self.prune_group(server, &mut guard, session.channel).await;
        Ok(())
    }

    async fn channel_created(&self, server: &dyn VoiceServer, channel: ChannelInfo) -> RouterResult {
        trace!(server_id = server.id(), channel = %channel.id, name = %channel.name, "Channel created");
        Ok(())
    }

    async fn channel_removed(&self, server: &dyn VoiceServer, channel: ChannelInfo) -> RouterResult {
        let Some(mut guard) = self.lock_existing(server.id()).await else {
            return Ok(());
        };

        match guard.topology.on_channel_removed(&channel) {
            Removal::Group(key) => {
                metrics::record_group_removed();
                info!(server_id = server.id(), group = key, channel = %channel.id, "Group channel removed");
            }
            Removal::Topology => {
                warn!(
                    server_id = server.id(),
                    channel = %channel.id,
                    name = %channel.name,
                    "Proximity channel removed out of band, hierarchy will be rebuilt"
                );
            }
            Removal::Unrelated => {}
        }
        Ok(())
    }

    async fn started(&self, server: &dyn VoiceServer) -> RouterResult {
        self.reset_server(server.id()).await;
        info!(server_id = server.id(), "Server started");
        Ok(())
    }

    async fn stopped(&self, server: &dyn VoiceServer) -> RouterResult {
        self.reset_server(server.id()).await;
        info!(server_id = server.id(), "Server stopped");
        Ok(())
    }
}
