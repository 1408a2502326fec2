//! Event dispatch.
//!
//! Routes [`HostEvent`]s from the host to a [`ServerCallbacks`] implementation,
//! resolving the addressed virtual server and dropping events for servers the
//! router is not configured to manage.

use crate::error::RouterResult;
use crate::host::{EventKind, HostEvent, ServerCallbacks, ServerId, VoiceServer};
use crate::metrics;
use crate::telemetry::{EventTimer, spans};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, trace, warn};

/// Which virtual servers the router acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFilter {
    All,
    Only(HashSet<ServerId>),
}

impl ServerFilter {
    /// An empty list means every server.
    pub fn from_ids(ids: &[ServerId]) -> Self {
        if ids.is_empty() {
            Self::All
        } else {
            Self::Only(ids.iter().copied().collect())
        }
    }

    pub fn accepts(&self, server: ServerId) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&server),
        }
    }
}

/// Fans host events out to the callbacks of their virtual server.
pub struct Dispatcher {
    callbacks: Arc<dyn ServerCallbacks>,
    filter: ServerFilter,
    servers: DashMap<ServerId, Arc<dyn VoiceServer>>,
}

impl Dispatcher {
    pub fn new(callbacks: Arc<dyn ServerCallbacks>, filter: ServerFilter) -> Self {
        Self {
            callbacks,
            filter,
            servers: DashMap::new(),
        }
    }

    /// Make `server` addressable. Returns `false` if it is filtered out.
    pub fn register_server(&self, server: Arc<dyn VoiceServer>) -> bool {
        let id = server.id();
        if !self.filter.accepts(id) {
            info!(server_id = id, "Server not managed, ignoring");
            return false;
        }
        self.servers.insert(id, server);
        true
    }

    pub fn server(&self, id: ServerId) -> Option<Arc<dyn VoiceServer>> {
        self.servers.get(&id).map(|s| s.value().clone())
    }

    pub fn filter(&self) -> &ServerFilter {
        &self.filter
    }

    /// Handle one event. Failures are logged and counted, never propagated.
    ///
    /// Returns whether the event reached a callback and completed without error.
    pub async fn dispatch(&self, event: HostEvent) -> bool {
        if !self.filter.accepts(event.server) {
            trace!(server_id = event.server, event = event.kind.name(), "Event for unmanaged server");
            return false;
        }
        let Some(server) = self.server(event.server) else {
            warn!(server_id = event.server, event = event.kind.name(), "Event for unknown server");
            return false;
        };

        let name = event.kind.name();
        let _timer = EventTimer::new(name);
        let result = self
            .deliver(server.as_ref(), event.kind)
            .instrument(spans::event(event.server, name))
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                metrics::record_error(e.error_code());
                if e.is_fault() {
                    error!(server_id = event.server, event = name, error = %e, "Event handling failed");
                } else {
                    warn!(server_id = event.server, event = name, error = %e, "Event handling failed");
                }
                false
            }
        }
    }

    async fn deliver(&self, server: &dyn VoiceServer, kind: EventKind) -> RouterResult {
        let callbacks = self.callbacks.as_ref();
        match kind {
            EventKind::UserConnected { state } => callbacks.user_connected(server, state).await,
            EventKind::UserStateChanged { state } => callbacks.user_state_changed(server, state).await,
            EventKind::UserDisconnected { state } => callbacks.user_disconnected(server, state).await,
            EventKind::ChannelCreated { channel } => callbacks.channel_created(server, channel).await,
            EventKind::ChannelRemoved { channel } => callbacks.channel_removed(server, channel).await,
            EventKind::ChannelStateChanged { channel } => {
                callbacks.channel_state_changed(server, channel).await
            }
            EventKind::Started => callbacks.started(server).await,
            EventKind::Stopped => callbacks.stopped(server).await,
        }
    }

    /// Consume events until the sender side closes.
    pub async fn run(&self, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        info!("Event channel closed, dispatcher stopping");
    }
}
