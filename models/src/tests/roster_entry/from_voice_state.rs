use crate::{RosterEntry, VoiceStatePayload};

const AVATAR_BASE: &str = "https://cdn.discordapp.com/avatars";

fn payload(value: serde_json::Value) -> VoiceStatePayload {
    serde_json::from_value(value).expect("valid voice state payload")
}

/// **VALUE**: Verifies the nickname/avatar/flags mapping from a voice state.
///
/// **WHY THIS MATTERS**: This is the only place where wire voice states become roster entries;
/// a wrong mapping shows the wrong name or mute icon for every member.
///
/// **BUG THIS CATCHES**: Would catch if self-mute/self-deaf stop counting as muted/deafened,
/// or the avatar URL format changes.
#[test]
fn given_full_voice_state_when_mapped_then_entry_uses_nick_avatar_and_flags() {
    // GIVEN: A voice state with nick, avatar and self-mute
    let state = payload(serde_json::json!({
        "nick": "Alice",
        "voice_state": {"mute": false, "deaf": false, "self_mute": true, "self_deaf": false},
        "user": {"id": "111", "username": "alice", "avatar": "abcdef"}
    }));

    // WHEN: Mapping to a roster entry
    let entry = RosterEntry::from_voice_state(&state, AVATAR_BASE).expect("valid entry");

    // THEN: Nick, avatar URL and flags are derived
    assert_eq!(entry.id.as_str(), "111");
    assert_eq!(entry.display_name, "Alice");
    assert_eq!(
        entry.avatar_url.as_deref(),
        Some("https://cdn.discordapp.com/avatars/111/abcdef.jpg")
    );
    assert!(entry.muted, "self_mute should count as muted");
    assert!(!entry.deafened);
    assert!(!entry.speaking, "new entries are never speaking");
}

/// **VALUE**: Verifies fallbacks when nick and avatar are absent.
///
/// **WHY THIS MATTERS**: Members without a custom avatar send `avatar: null`; building a URL
/// from it would point at a non-existent image.
///
/// **BUG THIS CATCHES**: Would catch "null" ending up in the avatar URL or an empty label.
#[test]
fn given_missing_nick_and_avatar_when_mapped_then_falls_back_to_username_without_avatar() {
    // GIVEN: A voice state without nick and with a null avatar
    let state = payload(serde_json::json!({
        "voice_state": {"deaf": true},
        "user": {"id": "222", "username": "bob", "avatar": null}
    }));

    // WHEN: Mapping to a roster entry
    let entry = RosterEntry::from_voice_state(&state, AVATAR_BASE).expect("valid entry");

    // THEN: Username is used, no avatar, deafened set
    assert_eq!(entry.display_name, "bob");
    assert_eq!(entry.avatar_url, None);
    assert!(entry.deafened);
    assert!(!entry.muted);
}
