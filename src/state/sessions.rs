//! Session store.
//!
//! Holds the last processed state of every user session on one virtual
//! server, so repeated updates carrying the same plugin data can be
//! recognised and skipped.

use crate::host::{ChannelId, UserState};
use proxvoice_proto::{GameContext, GameIdentity};
use serde::Serialize;
use std::collections::HashMap;

/// The last processed state of one user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub session: u32,
    pub userid: i32,
    pub name: String,
    /// Raw identity string as reported.
    pub identity: String,
    /// Decoded context bytes.
    #[serde(skip)]
    pub context: Vec<u8>,
    pub parsed_identity: Option<GameIdentity>,
    pub parsed_context: Option<GameContext>,
    /// Whether the context came from the supported game plugin.
    pub linked: bool,
    /// Channel the user was last seen in or moved to.
    pub channel: ChannelId,
    /// Topology epoch the session was last processed under.
    pub epoch: u64,
}

impl Session {
    /// Build an unparsed session from a host state and its decoded context.
    pub fn new(state: &UserState, context: Vec<u8>) -> Self {
        Self {
            session: state.session,
            userid: state.userid,
            name: state.name.clone(),
            identity: state.identity.clone(),
            context,
            parsed_identity: None,
            parsed_context: None,
            linked: false,
            channel: state.channel,
            epoch: 0,
        }
    }

    /// Take over the parse results of a previous snapshot.
    pub fn carry_forward(&mut self, prior: &Session) {
        self.parsed_identity = prior.parsed_identity.clone();
        self.parsed_context = prior.parsed_context.clone();
        self.linked = prior.linked;
    }

    /// The party this session's character belongs to, if any.
    pub fn group_key(&self) -> Option<u64> {
        self.parsed_identity.as_ref().and_then(GameIdentity::group_key)
    }
}

/// Sessions of one virtual server, keyed by connection session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<u32, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, session: u32) -> Option<&Session> {
        self.sessions.get(&session)
    }

    /// Whether an update carries information not yet processed.
    ///
    /// True on first contact with any identity or context, and whenever either
    /// differs byte-for-byte from the stored snapshot.
    pub fn needs_update(&self, session: u32, identity: &str, context: &[u8]) -> bool {
        match self.sessions.get(&session) {
            Some(prior) => prior.identity != identity || prior.context != context,
            None => !identity.is_empty() || !context.is_empty(),
        }
    }

    /// Store `session`, replacing any earlier snapshot.
    pub fn store(&mut self, session: Session) {
        self.sessions.insert(session.session, session);
    }

    pub fn remove(&mut self, session: u32) -> Option<Session> {
        self.sessions.remove(&session)
    }

    /// Forget every session.
    pub fn reset(&mut self) {
        self.sessions.clear();
    }

    /// Number of tracked sessions currently in `channel`.
    pub fn occupants(&self, channel: ChannelId) -> usize {
        self.sessions.values().filter(|s| s.channel == channel).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
