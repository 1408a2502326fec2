//! Property-based tests for context splitting and payload validation.
//!
//! Game-side payloads are untrusted, so the decoder must never panic and
//! must classify arbitrary input as either a typed payload or `Invalid`.

use proptest::prelude::*;
use proxvoice_proto::{split_context, GameContext, GameIdentity};

/// Plugin tags never contain NUL.
fn tag_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[^\x00]{0,40}").expect("valid regex")
}

/// Character names as a plugin might report them.
fn char_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z]{2,12}").expect("valid regex")
}

proptest! {
    #[test]
    fn split_preserves_tag_and_payload(tag in tag_strategy(), payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut blob = tag.as_bytes().to_vec();
        blob.push(0);
        blob.extend_from_slice(&payload);

        let (got_tag, got_payload) = split_context(&blob);
        prop_assert_eq!(got_tag, tag.as_bytes());
        prop_assert_eq!(got_payload, Some(payload.as_slice()));
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = GameContext::parse(&bytes);
        let _ = GameIdentity::parse(&bytes);
    }

    #[test]
    fn well_formed_identity_always_parses(name in char_strategy(), guid in any::<i64>()) {
        let json = format!(r#"{{"char": "{}", "leaderguid": {}}}"#, name, guid);
        let identity = GameIdentity::parse(json.as_bytes()).unwrap();
        prop_assert_eq!(&identity.character, &name);
        prop_assert_eq!(identity.leader_guid, guid);
        prop_assert_eq!(identity.group_key().is_some(), guid > 0);
    }

    #[test]
    fn well_formed_context_always_parses(map in 0i64..100_000) {
        let json = format!(r#"{{"map": {}}}"#, map);
        prop_assert_eq!(GameContext::parse(json.as_bytes()).unwrap().map, map);
    }
}
