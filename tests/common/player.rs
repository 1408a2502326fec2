//! User state builder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proxvoice::host::{ChannelId, UserState};

pub const SIGNATURE: &str = "World of Warcraft 3.3.5a";

/// A voice user with optional game link data.
#[derive(Debug, Clone)]
pub struct Player {
    pub session: u32,
    pub name: String,
    /// Decoded context bytes; base64-encoded when building a state.
    pub context: Vec<u8>,
    pub identity: String,
}

#[allow(dead_code)]
impl Player {
    pub fn new(session: u32, name: &str) -> Self {
        Self {
            session,
            name: name.to_string(),
            context: Vec::new(),
            identity: String::new(),
        }
    }

    /// Linked to the game, standing on `map`.
    pub fn on_map(mut self, map: i64) -> Self {
        self.context = format!("{}\0{{\"map\": {}}}", SIGNATURE, map).into_bytes();
        self
    }

    /// Character `character` in the party led by `leader` (0 when solo).
    pub fn character(mut self, character: &str, leader: i64) -> Self {
        self.identity = format!(r#"{{"char": "{}", "leaderguid": {}}}"#, character, leader);
        self
    }

    pub fn raw_context(mut self, context: &[u8]) -> Self {
        self.context = context.to_vec();
        self
    }

    pub fn raw_identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    /// The state the host would report with the user in `channel`.
    pub fn state(&self, channel: ChannelId) -> UserState {
        UserState {
            session: self.session,
            userid: -1,
            name: self.name.clone(),
            identity: self.identity.clone(),
            context: STANDARD.encode(&self.context),
            channel,
        }
    }
}
