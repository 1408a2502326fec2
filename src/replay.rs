//! Replay of a recorded host event feed against in-memory servers.
//!
//! Each line of the feed is one JSON [`HostEvent`]. Blank lines and lines
//! starting with `#` are skipped. A user state without a `channel` keeps the
//! channel the in-memory server currently has for that session, so feeds do
//! not need to track the moves the router makes.
//!
//! Callbacks the in-memory server fires in response to router calls are fed
//! back through the dispatcher after every line, in order.

use crate::dispatch::Dispatcher;
use crate::host::{ChannelId, EventKind, HostEvent, MemoryServer, ServerId, VoiceServer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read event feed: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome counters of one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Feed lines parsed into events.
    pub events: usize,
    /// Feed lines that were not valid events.
    pub rejected: usize,
    /// Callbacks fired back by the in-memory servers.
    pub echoed: usize,
    /// Events whose handling failed.
    pub failed: usize,
}

/// Drives a [`Dispatcher`] from a feed, creating one [`MemoryServer`] per
/// server id on first sight.
pub struct Replay {
    dispatcher: Arc<Dispatcher>,
    servers: BTreeMap<ServerId, Arc<MemoryServer>>,
    summary: ReplaySummary,
}

impl Replay {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            servers: BTreeMap::new(),
            summary: ReplaySummary::default(),
        }
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    pub fn server(&self, id: ServerId) -> Option<&Arc<MemoryServer>> {
        self.servers.get(&id)
    }

    /// Rendered channel trees of every server seen, keyed by server id.
    pub fn trees(&self) -> impl Iterator<Item = (ServerId, String)> + '_ {
        self.servers.iter().map(|(&id, s)| (id, s.render_tree()))
    }

    /// Consume `reader` to the end.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<ReplaySummary, ReplayError> {
        let mut lines = reader.lines();
        let mut lineno = 0usize;
        while let Some(line) = lines.next_line().await? {
            lineno += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.parse(line) {
                Ok(event) => self.feed(event).await,
                Err(e) => {
                    self.summary.rejected += 1;
                    warn!(line = lineno, error = %e, "Skipping malformed feed line");
                }
            }
        }
        Ok(self.summary)
    }

    /// Apply one event from the feed and everything it triggers.
    pub async fn feed(&mut self, event: HostEvent) {
        self.summary.events += 1;
        let server = self.memory_server(event.server);

        match &event.kind {
            EventKind::UserConnected { state } | EventKind::UserStateChanged { state } => {
                server.observe_user(state);
            }
            _ => {}
        }
        let disconnected = match &event.kind {
            EventKind::UserDisconnected { state } => Some(state.session),
            _ => None,
        };

        if !self.dispatcher.dispatch(event).await {
            self.summary.failed += 1;
        }
        if let Some(session) = disconnected {
            server.forget_user(session);
        }

        loop {
            let echoed = server.drain_emitted();
            if echoed.is_empty() {
                break;
            }
            for kind in echoed {
                self.summary.echoed += 1;
                debug!(server_id = server.id(), event = kind.name(), "Replaying server callback");
                if !self.dispatcher.dispatch(HostEvent::new(server.id(), kind)).await {
                    self.summary.failed += 1;
                }
            }
        }
    }

    fn memory_server(&mut self, id: ServerId) -> Arc<MemoryServer> {
        if let Some(server) = self.servers.get(&id) {
            return server.clone();
        }
        let server = Arc::new(MemoryServer::new(id));
        self.dispatcher.register_server(server.clone());
        self.servers.insert(id, server.clone());
        server
    }

    fn parse(&self, line: &str) -> Result<HostEvent, serde_json::Error> {
        let mut value: Value = serde_json::from_str(line)?;
        let server_id = value
            .get("server")
            .and_then(Value::as_i64)
            .and_then(|id| ServerId::try_from(id).ok());

        if let Some(server_id) = server_id
            && let Some(state) = value.get_mut("state").and_then(Value::as_object_mut)
            && !state.contains_key("channel")
        {
            let current = state
                .get("session")
                .and_then(Value::as_u64)
                .and_then(|s| u32::try_from(s).ok())
                .and_then(|s| self.servers.get(&server_id)?.user(s))
                .map_or(ChannelId::ROOT, |u| u.channel);
            state.insert("channel".to_string(), Value::from(current.0));
        }

        serde_json::from_value(value)
    }
}
