//! Channel topology store.
//!
//! Maps logical locations to channel ids on one virtual server:
//!
//! ```text
//! Proximity Groups
//! ├── Waiting Room        LocationKey::WaitingRoom
//! ├── Group Channels      LocationKey::GroupRoot
//! │   └── <leader guid>   one per active party, created on demand
//! └── Overworld
//!     └── <map name>      LocationKey::Map(id), one per configured map
//! ```
//!
//! The static part is rebuilt once per server lifetime; any leftover
//! hierarchy from an earlier run is deleted first so ids are always known.

use crate::config::WorldMaps;
use crate::error::{HostError, TopologyError};
use crate::host::{ChannelId, ChannelInfo, VoiceServer};
use std::collections::HashMap;
use tracing::{debug, info};

pub const ROOT_CHANNEL: &str = "Proximity Groups";
pub const WAITING_ROOM_CHANNEL: &str = "Waiting Room";
pub const GROUP_ROOT_CHANNEL: &str = "Group Channels";
pub const OVERWORLD_CHANNEL: &str = "Overworld";

/// Logical location a channel stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKey {
    WaitingRoom,
    GroupRoot,
    Map(i64),
}

/// What an out-of-band channel removal meant for the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A group channel went away; its key was released.
    Group(u64),
    /// Part of the static hierarchy went away; the store must be rebuilt.
    Topology,
    /// Not one of ours.
    Unrelated,
}

/// Location and group channel ids of one virtual server.
#[derive(Debug, Default)]
pub struct TopologyStore {
    initialized: bool,
    /// Bumped on every rebuild; survives [`reset`](Self::reset).
    epoch: u64,
    locations: HashMap<LocationKey, ChannelId>,
    groups: HashMap<u64, ChannelId>,
    /// Every static channel we created, with its name.
    statics: HashMap<ChannelId, String>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Build the static hierarchy unless already done for this server.
    ///
    /// Returns `true` if this call built it. On a host failure nothing is
    /// recorded and the next call starts over.
    pub async fn ensure_initialized(
        &mut self,
        server: &dyn VoiceServer,
        maps: &WorldMaps,
    ) -> Result<bool, HostError> {
        if self.initialized {
            return Ok(false);
        }

        for stale in server
            .channels()
            .await?
            .into_iter()
            .filter(|c| c.name == ROOT_CHANNEL && c.parent == Some(ChannelId::ROOT))
        {
            debug!(channel = %stale.id, "Removing leftover proximity hierarchy");
            server.remove_channel(stale.id).await?;
        }

        let mut locations = HashMap::new();
        let mut statics = HashMap::new();

        let root = server.add_channel(ROOT_CHANNEL, ChannelId::ROOT).await?;
        statics.insert(root, ROOT_CHANNEL.to_string());

        let waiting = server.add_channel(WAITING_ROOM_CHANNEL, root).await?;
        statics.insert(waiting, WAITING_ROOM_CHANNEL.to_string());
        locations.insert(LocationKey::WaitingRoom, waiting);

        let group_root = server.add_channel(GROUP_ROOT_CHANNEL, root).await?;
        statics.insert(group_root, GROUP_ROOT_CHANNEL.to_string());
        locations.insert(LocationKey::GroupRoot, group_root);

        let overworld = server.add_channel(OVERWORLD_CHANNEL, root).await?;
        statics.insert(overworld, OVERWORLD_CHANNEL.to_string());

        for map in maps.iter() {
            let cid = server.add_channel(&map.name, overworld).await?;
            statics.insert(cid, map.name.clone());
            locations.insert(LocationKey::Map(map.id), cid);
        }

        info!(
            server_id = server.id(),
            root = %root,
            maps = maps.len(),
            "Proximity channel hierarchy created"
        );

        self.locations = locations;
        self.statics = statics;
        self.groups.clear();
        self.initialized = true;
        self.epoch += 1;
        Ok(true)
    }

    /// Forget everything; the next [`ensure_initialized`](Self::ensure_initialized) rebuilds.
    pub fn reset(&mut self) {
        let epoch = self.epoch;
        *self = Self::default();
        self.epoch = epoch;
    }

    /// Number of times the hierarchy has been built.
    ///
    /// Sessions routed under an older epoch point at channels that no longer
    /// exist and must be routed again.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn get(&self, key: LocationKey) -> Option<ChannelId> {
        self.locations.get(&key).copied()
    }

    pub fn waiting_room(&self) -> Option<ChannelId> {
        self.get(LocationKey::WaitingRoom)
    }

    pub fn group_root(&self) -> Option<ChannelId> {
        self.get(LocationKey::GroupRoot)
    }

    /// Channel for `map`, falling back to the waiting room for unknown maps.
    pub fn resolve(&self, map: Option<i64>) -> Result<ChannelId, TopologyError> {
        if !self.initialized {
            return Err(TopologyError::NotInitialized);
        }
        if let Some(cid) = map.and_then(|id| self.get(LocationKey::Map(id))) {
            return Ok(cid);
        }
        self.waiting_room().ok_or(TopologyError::MissingWaitingRoom)
    }

    /// The group channel for `key`, created under the group root if absent.
    ///
    /// Returns the channel id and whether it was created by this call.
    pub async fn resolve_or_create_group(
        &mut self,
        server: &dyn VoiceServer,
        key: u64,
    ) -> Result<(ChannelId, bool), crate::error::RouterError> {
        if let Some(&cid) = self.groups.get(&key) {
            return Ok((cid, false));
        }
        let parent = self.group_root().ok_or(TopologyError::MissingGroupRoot)?;
        let cid = server.add_channel(&key.to_string(), parent).await?;
        self.groups.insert(key, cid);
        info!(server_id = server.id(), group = key, channel = %cid, "Group channel created");
        Ok((cid, true))
    }

    pub fn group(&self, key: u64) -> Option<ChannelId> {
        self.groups.get(&key).copied()
    }

    /// The group key whose channel is `channel`, if it is a group channel.
    pub fn group_of(&self, channel: ChannelId) -> Option<u64> {
        self.groups
            .iter()
            .find_map(|(&key, &cid)| (cid == channel).then_some(key))
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Release `key` after its channel was removed by us.
    pub fn forget_group(&mut self, key: u64) -> Option<ChannelId> {
        self.groups.remove(&key)
    }

    /// Drop whatever the store maps to `channel` after the host reported it
    /// does not exist.
    ///
    /// Unlike [`on_channel_removed`](Self::on_channel_removed) there is no
    /// name to compare, the id alone decides.
    pub fn on_missing_channel(&mut self, channel: ChannelId) -> Removal {
        if self.statics.contains_key(&channel) {
            self.reset();
            return Removal::Topology;
        }
        match self.group_of(channel) {
            Some(key) => {
                self.groups.remove(&key);
                Removal::Group(key)
            }
            None => Removal::Unrelated,
        }
    }

    /// Keep the store consistent with a channel removed out of band.
    pub fn on_channel_removed(&mut self, channel: &ChannelInfo) -> Removal {
        if let Some(name) = self.statics.get(&channel.id)
            && *name == channel.name
        {
            self.reset();
            return Removal::Topology;
        }

        if channel.parent.is_none() || channel.parent != self.group_root() {
            return Removal::Unrelated;
        }
        let Ok(key) = channel.name.parse::<u64>() else {
            return Removal::Unrelated;
        };
        // A stale event must not evict a channel created since.
        if self.groups.get(&key) == Some(&channel.id) {
            self.groups.remove(&key);
            Removal::Group(key)
        } else {
            Removal::Unrelated
        }
    }
}
