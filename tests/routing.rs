//! Integration tests for user routing decisions.

mod common;

use common::harness::{DEADMINES, KALIMDOR, OUTLAND};
use common::{Player, TestRouter};
use proxvoice::error::RouterError;
use proxvoice::host::ChannelId;
use proxvoice_proto::GameContext;

#[tokio::test]
async fn test_linked_player_moves_to_map_channel() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(KALIMDOR).character("Tyrande", 0);

    t.connect(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Kalimdor"));
    assert_eq!(t.moves(), 1);
    let snapshot = t.router.snapshot(1, 1).await.unwrap();
    assert!(snapshot.linked);
    assert_eq!(snapshot.parsed_context, Some(GameContext { map: KALIMDOR }));
    assert_eq!(snapshot.channel, t.map_channel("Kalimdor"));
}

#[tokio::test]
async fn test_same_data_twice_is_idempotent() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(OUTLAND).character("Illidan", 0);

    t.update(&alice).await.unwrap();
    let first = t.router.snapshot(1, 1).await.unwrap();
    let calls = t.server.calls().len();

    t.update(&alice).await.unwrap();
    t.echo().await;

    assert_eq!(t.moves(), 1);
    assert_eq!(t.server.calls().len(), calls);
    let second = t.router.snapshot(1, 1).await.unwrap();
    assert_eq!(first.parsed_context, second.parsed_context);
    assert_eq!(first.parsed_identity, second.parsed_identity);
}

#[tokio::test]
async fn test_map_change_moves_again() {
    let t = TestRouter::new();
    let mut alice = Player::new(1, "alice").on_map(KALIMDOR).character("Jaina", 0);
    t.update(&alice).await.unwrap();

    alice = alice.on_map(OUTLAND);
    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Outland"));
    assert_eq!(t.moves(), 2);
}

#[tokio::test]
async fn test_map_overrides_group() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(KALIMDOR).character("Tyrande", 77);

    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Kalimdor"));
    assert!(t.group_channels().is_empty());
}

#[tokio::test]
async fn test_unknown_map_solo_falls_back_to_waiting_room() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(DEADMINES).character("Vanessa", 0);

    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.waiting_room());
    assert!(t.group_channels().is_empty());
}

#[tokio::test]
async fn test_unknown_map_in_party_goes_to_group_channel() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(DEADMINES).character("Vanessa", 42);

    t.update(&alice).await.unwrap();

    let group = t.group_channel(42).unwrap();
    assert_eq!(t.channel_of(&alice), group);
    assert_eq!(t.group_channels().len(), 1);
}

#[tokio::test]
async fn test_unlinked_context_is_never_routed() {
    let t = TestRouter::new();
    let bob = Player::new(2, "bob")
        .raw_context(b"World of Warcraft 1.12.1\0{\"map\": 1}")
        .character("Rexxar", 5);

    t.update(&bob).await.unwrap();

    assert_eq!(t.moves(), 0);
    assert_eq!(t.channel_of(&bob), ChannelId::ROOT);
    let snapshot = t.router.snapshot(1, 2).await.unwrap();
    assert!(!snapshot.linked);
    assert_eq!(snapshot.parsed_context, None);
    assert_eq!(snapshot.parsed_identity, None);
}

#[tokio::test]
async fn test_signature_without_payload_is_linked_but_not_routed() {
    let t = TestRouter::new();
    let bob = Player::new(2, "bob")
        .raw_context(b"World of Warcraft 3.3.5a")
        .character("Rexxar", 0);

    t.update(&bob).await.unwrap();

    assert_eq!(t.moves(), 0);
    let snapshot = t.router.snapshot(1, 2).await.unwrap();
    assert!(snapshot.linked);
    assert_eq!(snapshot.parsed_context, None);
}

#[tokio::test]
async fn test_linked_without_identity_is_not_routed() {
    let t = TestRouter::new();
    let carol = Player::new(3, "carol").on_map(KALIMDOR);

    t.update(&carol).await.unwrap();

    assert_eq!(t.moves(), 0);
    let snapshot = t.router.snapshot(1, 3).await.unwrap();
    assert!(snapshot.linked);
    assert_eq!(snapshot.parsed_context, None);
}

#[tokio::test]
async fn test_invalid_context_keeps_prior_map() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(KALIMDOR).character("Tyrande", 0);
    t.update(&alice).await.unwrap();

    let garbled = alice.clone().raw_context(b"World of Warcraft 3.3.5a\0{\"map\": \"north\"}");
    t.update(&garbled).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Kalimdor"));
    assert_eq!(t.moves(), 1);
    let snapshot = t.router.snapshot(1, 1).await.unwrap();
    assert_eq!(snapshot.parsed_context, Some(GameContext { map: KALIMDOR }));
}

#[tokio::test]
async fn test_invalid_identity_does_not_block_context() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice")
        .on_map(OUTLAND)
        .raw_identity(r#"{"char": "Maiev"}"#);

    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Outland"));
    assert_eq!(t.router.snapshot(1, 1).await.unwrap().parsed_identity, None);
}

#[tokio::test]
async fn test_numeric_strings_are_coerced() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice")
        .raw_context(b"World of Warcraft 3.3.5a\0{\"map\": \"530\"}")
        .raw_identity(r#"{"char": "Maiev", "leaderguid": "0"}"#);

    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Outland"));
}

#[tokio::test]
async fn test_whole_number_float_map_is_coerced() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice")
        .raw_context(b"World of Warcraft 3.3.5a\0{\"map\": 530.0}")
        .character("Maiev", 0);

    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Outland"));
    let snapshot = t.router.snapshot(1, 1).await.unwrap();
    assert_eq!(snapshot.parsed_context, Some(GameContext { map: OUTLAND }));
}

#[tokio::test]
async fn test_fractional_map_is_rejected() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice")
        .raw_context(b"World of Warcraft 3.3.5a\0{\"map\": 1.5}")
        .character("Maiev", 0);

    t.update(&alice).await.unwrap();

    assert_eq!(t.channel_of(&alice), ChannelId::ROOT);
    assert_eq!(t.moves(), 0);
    assert_eq!(t.router.snapshot(1, 1).await.unwrap().parsed_context, None);
}

#[tokio::test]
async fn test_sessions_dump_as_json() {
    let t = TestRouter::new();
    let bob = Player::new(2, "bob").on_map(OUTLAND).character("Akama", 0);
    let alice = Player::new(1, "alice").on_map(KALIMDOR).character("Tyrande", 12);
    t.update(&bob).await.unwrap();
    t.update(&alice).await.unwrap();

    let dump = t.router.dump(1).await.unwrap();
    let sessions = dump.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["name"], "alice");
    assert_eq!(sessions[0]["parsed_context"]["map"], KALIMDOR);
    assert_eq!(sessions[0]["parsed_identity"]["character"], "Tyrande");
    assert_eq!(sessions[0]["parsed_identity"]["leader_guid"], 12);
    assert_eq!(sessions[0]["linked"], true);
    assert!(sessions[0].get("context").is_none());
    assert_eq!(sessions[1]["channel"], t.map_channel("Outland").0);

    assert!(t.router.dump(9).await.is_none());
}

#[tokio::test]
async fn test_malformed_transport_encoding_is_an_error() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice");
    let mut state = alice.state(ChannelId::ROOT);
    state.context = "%%% not base64 %%%".to_string();
    t.server.observe_user(&state);

    let err = proxvoice::host::ServerCallbacks::user_state_changed(&t.router, &t.server, state)
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::Decode(_)));
    assert!(err.is_fault());
    assert!(t.router.snapshot(1, 1).await.is_none());
}

#[tokio::test]
async fn test_plugin_link_lost_keeps_channel() {
    let t = TestRouter::new();
    let alice = Player::new(1, "alice").on_map(KALIMDOR).character("Tyrande", 0);
    t.update(&alice).await.unwrap();

    let unlinked = alice.clone().raw_context(b"");
    t.update(&unlinked).await.unwrap();

    assert_eq!(t.channel_of(&alice), t.map_channel("Kalimdor"));
    let snapshot = t.router.snapshot(1, 1).await.unwrap();
    assert!(!snapshot.linked);
    assert_eq!(snapshot.parsed_context, None);
}
