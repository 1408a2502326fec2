//! Router under test.

use super::Player;
use proxvoice::config::WorldMaps;
use proxvoice::error::RouterResult;
use proxvoice::host::{
    ChannelId, ChannelInfo, EventKind, HostCall, MemoryServer, ServerCallbacks, VoiceServer,
};
use proxvoice::router::{Router, RouterSettings};
use proxvoice::state::topology::{
    GROUP_ROOT_CHANNEL, OVERWORLD_CHANNEL, ROOT_CHANNEL, WAITING_ROOM_CHANNEL,
};
use proxvoice_proto::PluginSignature;

pub const KALIMDOR: i64 = 1;
pub const EASTERN_KINGDOMS: i64 = 0;
pub const OUTLAND: i64 = 530;
/// A map id not in the table, e.g. a dungeon instance.
pub const DEADMINES: i64 = 36;

pub fn world_maps() -> WorldMaps {
    WorldMaps::new([
        ("Eastern Kingdoms".to_string(), EASTERN_KINGDOMS),
        ("Kalimdor".to_string(), KALIMDOR),
        ("Outland".to_string(), OUTLAND),
    ])
}

pub fn settings() -> RouterSettings {
    RouterSettings {
        signature: PluginSignature::default(),
        world_maps: world_maps(),
        remove_empty_groups: true,
    }
}

/// A [`Router`] driving one [`MemoryServer`].
pub struct TestRouter {
    pub router: Router,
    pub server: MemoryServer,
}

#[allow(dead_code)]
impl TestRouter {
    pub fn new() -> Self {
        Self::with_settings(settings())
    }

    pub fn with_settings(settings: RouterSettings) -> Self {
        Self {
            router: Router::new(settings),
            server: MemoryServer::new(1),
        }
    }

    /// Connect `player` in the root channel.
    pub async fn connect(&self, player: &Player) -> RouterResult {
        let state = player.state(ChannelId::ROOT);
        self.server.observe_user(&state);
        self.router.user_connected(&self.server, state).await
    }

    /// Report `player`'s current data, in whatever channel the server has them.
    pub async fn update(&self, player: &Player) -> RouterResult {
        let state = player.state(self.channel_of(player));
        self.server.observe_user(&state);
        self.router.user_state_changed(&self.server, state).await
    }

    /// The user moves themselves to `channel`.
    pub async fn move_to(&self, player: &Player, channel: ChannelId) -> RouterResult {
        let state = player.state(channel);
        self.server.observe_user(&state);
        self.router.user_state_changed(&self.server, state).await
    }

    pub async fn disconnect(&self, player: &Player) -> RouterResult {
        let state = player.state(self.channel_of(player));
        self.server.forget_user(player.session);
        self.router.user_disconnected(&self.server, state).await
    }

    /// Deliver the callbacks the server fired so far to the router.
    pub async fn echo(&self) {
        for kind in self.server.drain_emitted() {
            let result = match kind {
                EventKind::UserStateChanged { state } => {
                    self.router.user_state_changed(&self.server, state).await
                }
                EventKind::ChannelCreated { channel } => {
                    self.router.channel_created(&self.server, channel).await
                }
                EventKind::ChannelRemoved { channel } => {
                    self.router.channel_removed(&self.server, channel).await
                }
                _ => Ok(()),
            };
            result.unwrap();
        }
    }

    /// Remove `channel` as an administrator would, and tell the router.
    pub async fn remove_out_of_band(&self, channel: ChannelId) {
        self.server.remove_channel(channel).await.unwrap();
        self.echo().await;
    }

    pub fn channel_of(&self, player: &Player) -> ChannelId {
        self.server
            .user(player.session)
            .map_or(ChannelId::ROOT, |u| u.channel)
    }

    pub fn root(&self) -> Option<ChannelInfo> {
        self.server.find_channel(ROOT_CHANNEL, ChannelId::ROOT)
    }

    fn static_child(&self, name: &str) -> Option<ChannelId> {
        let root = self.root()?;
        self.server.find_channel(name, root.id).map(|c| c.id)
    }

    pub fn waiting_room(&self) -> ChannelId {
        self.static_child(WAITING_ROOM_CHANNEL).unwrap()
    }

    pub fn group_root(&self) -> ChannelId {
        self.static_child(GROUP_ROOT_CHANNEL).unwrap()
    }

    pub fn map_channel(&self, name: &str) -> ChannelId {
        let overworld = self.static_child(OVERWORLD_CHANNEL).unwrap();
        self.server.find_channel(name, overworld).unwrap().id
    }

    pub fn group_channels(&self) -> Vec<ChannelInfo> {
        self.server.children(self.group_root())
    }

    pub fn group_channel(&self, leader: u64) -> Option<ChannelId> {
        self.server
            .find_channel(&leader.to_string(), self.group_root())
            .map(|c| c.id)
    }

    pub fn moves(&self) -> usize {
        self.server
            .calls()
            .iter()
            .filter(|c| matches!(c, HostCall::SetState { .. }))
            .count()
    }

    pub fn structural_calls(&self) -> usize {
        self.server
            .calls()
            .iter()
            .filter(|c| matches!(c, HostCall::AddChannel { .. } | HostCall::RemoveChannel(_)))
            .count()
    }
}
