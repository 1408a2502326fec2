//! In-memory voice server.
//!
//! Keeps a channel tree and the users' live states, records every API call
//! and queues the callbacks a real server would fire in response. Used by
//! the replay driver and by tests.

use super::{ChannelId, ChannelInfo, EventKind, ServerId, UserState, VoiceServer};
use crate::error::HostError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// A call the router made into the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    ListChannels,
    AddChannel { name: String, parent: ChannelId },
    RemoveChannel(ChannelId),
    SetState { session: u32, channel: ChannelId },
}

#[derive(Debug)]
struct Inner {
    channels: BTreeMap<ChannelId, ChannelInfo>,
    users: HashMap<u32, UserState>,
    next_channel: i32,
    calls: Vec<HostCall>,
    emitted: Vec<EventKind>,
    unavailable: bool,
}

/// An in-memory [`VoiceServer`].
#[derive(Debug)]
pub struct MemoryServer {
    id: ServerId,
    inner: Mutex<Inner>,
}

impl MemoryServer {
    /// Create a server holding only the root channel.
    pub fn new(id: ServerId) -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(
            ChannelId::ROOT,
            ChannelInfo {
                id: ChannelId::ROOT,
                name: "Root".to_string(),
                parent: None,
            },
        );
        Self {
            id,
            inner: Mutex::new(Inner {
                channels,
                users: HashMap::new(),
                next_channel: 1,
                calls: Vec::new(),
                emitted: Vec::new(),
                unavailable: false,
            }),
        }
    }

    /// Make every API call fail with [`HostError::Unavailable`] while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    /// Record a user's state as reported by the client, without routing.
    pub fn observe_user(&self, state: &UserState) {
        self.inner.lock().users.insert(state.session, state.clone());
    }

    /// Forget a disconnected user.
    pub fn forget_user(&self, session: u32) {
        self.inner.lock().users.remove(&session);
    }

    pub fn user(&self, session: u32) -> Option<UserState> {
        self.inner.lock().users.get(&session).cloned()
    }

    pub fn channel(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.inner.lock().channels.get(&id).cloned()
    }

    /// Find a channel by name under `parent`.
    pub fn find_channel(&self, name: &str, parent: ChannelId) -> Option<ChannelInfo> {
        self.inner
            .lock()
            .channels
            .values()
            .find(|c| c.name == name && c.parent == Some(parent))
            .cloned()
    }

    /// Children of `parent`, in id order.
    pub fn children(&self, parent: ChannelId) -> Vec<ChannelInfo> {
        self.inner
            .lock()
            .channels
            .values()
            .filter(|c| c.parent == Some(parent))
            .cloned()
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.inner.lock().channels.len()
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<HostCall> {
        self.inner.lock().calls.clone()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Take the callbacks a real server would have fired since the last drain.
    pub fn drain_emitted(&self) -> Vec<EventKind> {
        std::mem::take(&mut self.inner.lock().emitted)
    }

    /// Render the channel tree, one channel per line, indented by depth.
    pub fn render_tree(&self) -> String {
        let inner = self.inner.lock();
        let mut out = String::new();
        render(&inner, ChannelId::ROOT, 0, &mut out);
        out
    }
}

fn render(inner: &Inner, id: ChannelId, depth: usize, out: &mut String) {
    let Some(channel) = inner.channels.get(&id) else {
        return;
    };
    let occupants: Vec<&str> = inner
        .users
        .values()
        .filter(|u| u.channel == id)
        .map(|u| u.name.as_str())
        .collect();
    out.push_str(&"  ".repeat(depth));
    out.push_str(&channel.name);
    if !occupants.is_empty() {
        out.push_str(&format!(" [{}]", occupants.join(", ")));
    }
    out.push('\n');
    for child in inner.channels.values().filter(|c| c.parent == Some(id)) {
        render(inner, child.id, depth + 1, out);
    }
}

impl Inner {
    fn check_available(&self) -> Result<(), HostError> {
        if self.unavailable {
            Err(HostError::Unavailable("memory server marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    /// `id` and its descendants, deepest first.
    fn subtree(&self, id: ChannelId) -> Vec<ChannelId> {
        let mut ids = Vec::new();
        for child in self.channels.values().filter(|c| c.parent == Some(id)) {
            ids.extend(self.subtree(child.id));
        }
        ids.push(id);
        ids
    }
}

#[async_trait]
impl VoiceServer for MemoryServer {
    fn id(&self) -> ServerId {
        self.id
    }

    async fn channels(&self) -> Result<Vec<ChannelInfo>, HostError> {
        let mut inner = self.inner.lock();
        inner.calls.push(HostCall::ListChannels);
        inner.check_available()?;
        Ok(inner.channels.values().cloned().collect())
    }

    async fn add_channel(&self, name: &str, parent: ChannelId) -> Result<ChannelId, HostError> {
        let mut inner = self.inner.lock();
        inner.calls.push(HostCall::AddChannel {
            name: name.to_string(),
            parent,
        });
        inner.check_available()?;
        if !inner.channels.contains_key(&parent) {
            return Err(HostError::NoSuchChannel(parent));
        }

        let id = ChannelId(inner.next_channel);
        inner.next_channel += 1;
        let channel = ChannelInfo {
            id,
            name: name.to_string(),
            parent: Some(parent),
        };
        inner.channels.insert(id, channel.clone());
        inner.emitted.push(EventKind::ChannelCreated { channel });
        Ok(id)
    }

    async fn remove_channel(&self, id: ChannelId) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        inner.calls.push(HostCall::RemoveChannel(id));
        inner.check_available()?;
        let Some(parent) = inner.channels.get(&id).map(|c| c.parent) else {
            return Err(HostError::NoSuchChannel(id));
        };
        let Some(parent) = parent else {
            return Err(HostError::Unavailable("cannot remove the root channel".to_string()));
        };

        let doomed = inner.subtree(id);
        let mut moved = Vec::new();
        for user in inner.users.values_mut() {
            if doomed.contains(&user.channel) {
                user.channel = parent;
                moved.push(user.clone());
            }
        }
        for channel_id in doomed {
            if let Some(channel) = inner.channels.remove(&channel_id) {
                inner.emitted.push(EventKind::ChannelRemoved { channel });
            }
        }
        inner
            .emitted
            .extend(moved.into_iter().map(|state| EventKind::UserStateChanged { state }));
        Ok(())
    }

    async fn set_state(&self, state: &UserState) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        inner.calls.push(HostCall::SetState {
            session: state.session,
            channel: state.channel,
        });
        inner.check_available()?;
        if !inner.channels.contains_key(&state.channel) {
            return Err(HostError::NoSuchChannel(state.channel));
        }
        if !inner.users.contains_key(&state.session) {
            return Err(HostError::NoSuchUser(state.session));
        }
        inner.users.insert(state.session, state.clone());
        inner.emitted.push(EventKind::UserStateChanged {
            state: state.clone(),
        });
        Ok(())
    }
}
