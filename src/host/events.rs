//! Host events as delivered to the dispatcher.

use super::{ChannelInfo, ServerId, UserState};
use serde::{Deserialize, Serialize};

/// One callback from the host, addressed to a virtual server.
///
/// Serialized as a flat JSON object, e.g.
/// `{"server": 1, "event": "user_state_changed", "state": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEvent {
    pub server: ServerId,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    UserConnected { state: UserState },
    UserStateChanged { state: UserState },
    UserDisconnected { state: UserState },
    ChannelCreated { channel: ChannelInfo },
    ChannelRemoved { channel: ChannelInfo },
    ChannelStateChanged { channel: ChannelInfo },
    Started,
    Stopped,
}

impl EventKind {
    /// Static label for metrics and spans.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserConnected { .. } => "user_connected",
            Self::UserStateChanged { .. } => "user_state_changed",
            Self::UserDisconnected { .. } => "user_disconnected",
            Self::ChannelCreated { .. } => "channel_created",
            Self::ChannelRemoved { .. } => "channel_removed",
            Self::ChannelStateChanged { .. } => "channel_state_changed",
            Self::Started => "started",
            Self::Stopped => "stopped",
        }
    }

    /// The user this event is about, if any.
    pub fn user(&self) -> Option<&UserState> {
        match self {
            Self::UserConnected { state }
            | Self::UserStateChanged { state }
            | Self::UserDisconnected { state } => Some(state),
            _ => None,
        }
    }
}

impl HostEvent {
    pub fn new(server: ServerId, kind: EventKind) -> Self {
        Self { server, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelId;

    #[test]
    fn parses_flat_json_lines() {
        let line = r#"{"server": 1, "event": "user_state_changed",
            "state": {"session": 7, "name": "alice", "context": "", "channel": 0}}"#;
        let event: HostEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.server, 1);
        let state = event.kind.user().unwrap();
        assert_eq!(state.session, 7);
        assert_eq!(state.userid, -1);
        assert_eq!(state.identity, "");
        assert_eq!(state.channel, ChannelId::ROOT);
        assert_eq!(event.kind.name(), "user_state_changed");
    }

    #[test]
    fn parses_meta_events() {
        let event: HostEvent = serde_json::from_str(r#"{"server": 2, "event": "stopped"}"#).unwrap();
        assert_eq!(event, HostEvent::new(2, EventKind::Stopped));
    }

    #[test]
    fn parses_channel_events() {
        let line = r#"{"server": 1, "event": "channel_removed",
            "channel": {"id": 12, "name": "42", "parent": 3}}"#;
        let event: HostEvent = serde_json::from_str(line).unwrap();
        match event.kind {
            EventKind::ChannelRemoved { channel } => {
                assert_eq!(channel.parent, Some(ChannelId(3)));
                assert_eq!(channel.name, "42");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
