use crate::auth::{Authenticator, MemoryTokenStore, TokenStore};
use crate::config::ConnectorConfig;
use crate::dispatch::{EventDispatcher, Routed, route};
use crate::state::SharedState;
use crate::subscriptions::SubscriptionManager;
use crate::tests::support::{FakeSender, dispatch, entry, response, voice_state};

use common::RedactedAccessToken;

use models::{ChannelId, Command, Envelope, Event, UserId, VoiceSettings};

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::sync::mpsc;

struct Fixture {
    dispatcher: EventDispatcher<FakeSender>,
    sender: FakeSender,
    state: SharedState,
    subscriptions: SubscriptionManager,
}

fn fixture_with(state: SharedState, sender: FakeSender, store: Arc<dyn TokenStore>) -> Fixture {
    let config = ConnectorConfig::default();
    let subscriptions = SubscriptionManager::new();
    let authenticator = Authenticator::new(&config, store).expect("authenticator");
    let dispatcher = EventDispatcher::new(
        sender.clone(),
        state.clone(),
        subscriptions.clone(),
        authenticator,
        config.avatar_base_url.clone(),
    );
    Fixture {
        dispatcher,
        sender,
        state,
        subscriptions,
    }
}

fn fixture(sender: FakeSender) -> Fixture {
    fixture_with(SharedState::new(), sender, Arc::new(MemoryTokenStore::new()))
}

fn channel(id: &str, members: &[(&str, &str)]) -> Value {
    let voice_states: Vec<Value> = members
        .iter()
        .map(|(user, name)| voice_state(user, name))
        .collect();
    json!({"id": id, "name": "General", "voice_states": voice_states})
}

fn ids(state: &SharedState) -> Vec<String> {
    state
        .roster
        .ids()
        .iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

fn channel_events(sender: &FakeSender, cmd: Command, channel: &str) -> BTreeSet<Event> {
    sender
        .sent()
        .iter()
        .filter(|request| {
            request.cmd == cmd && request.channel_id() == Some(ChannelId::from(channel))
        })
        .filter_map(|request| request.evt)
        .collect()
}

/// **VALUE**: Verifies speaking events tagged with another channel are dropped.
///
/// **WHY THIS MATTERS**: Right after a channel switch the old channel's speaking events
/// can still arrive; applying them lights up the wrong member.
///
/// **BUG THIS CATCHES**: Would catch the channel guard being removed or compared against
/// the wrong field.
#[tokio::test]
async fn given_current_channel_7_when_speaking_start_for_42_then_roster_untouched() {
    // GIVEN: Current channel 7 with u1
    let f = fixture(FakeSender::succeeding());
    f.state.set_current_channel(Some(ChannelId::from("7")));
    f.state.roster.insert(entry("u1", "One"));
    let updates = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&updates);
    let _handle = f
        .state
        .roster
        .subscribe_entries(move |_, _| *counter.lock().expect("counter lock") += 1);

    // WHEN: SPEAKING_START for u1 arrives tagged with channel 42
    f.dispatcher
        .handle(dispatch(
            Event::SpeakingStart,
            json!({"user_id": "u1", "channel_id": "42"}),
        ))
        .await;

    // THEN: Nothing changed
    assert_eq!(
        f.state.roster.get_by_id(&UserId::from("u1")).map(|e| e.speaking),
        Some(false)
    );
    assert_eq!(*updates.lock().expect("counter lock"), 0);

    // WHEN: The same event arrives for channel 7
    f.dispatcher
        .handle(dispatch(
            Event::SpeakingStart,
            json!({"user_id": "u1", "channel_id": "7"}),
        ))
        .await;

    // THEN: u1 is speaking
    assert_eq!(
        f.state.roster.get_by_id(&UserId::from("u1")).map(|e| e.speaking),
        Some(true)
    );
    assert_eq!(*updates.lock().expect("counter lock"), 1);
}

/// **VALUE**: Verifies join then leave subscribes and unsubscribes exactly the five
/// channel-scoped events and leaves an empty roster.
///
/// **WHY THIS MATTERS**: Leaked subscriptions keep delivering a previous channel's events;
/// missing ones leave the roster frozen.
///
/// **BUG THIS CATCHES**: Would catch a missing event kind, subscribing before the
/// snapshot, or a roster left populated after leaving.
#[tokio::test]
async fn given_channel_joined_when_left_then_five_subscribed_and_unsubscribed_and_roster_empty() {
    // GIVEN: A server returning channel C with two members, recording the roster size
    // seen by the first SUBSCRIBE
    let state = SharedState::new();
    let observed = state.clone();
    let roster_at_subscribe = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&roster_at_subscribe);
    let sender = FakeSender::new(move |request| {
        if request.cmd == Command::Subscribe {
            seen.lock()
                .expect("seen lock")
                .get_or_insert(observed.roster.len());
        }
        match request.cmd {
            Command::GetChannel => Ok(response(
                Command::GetChannel,
                channel("C", &[("u1", "One"), ("u2", "Two")]),
            )),
            cmd => Ok(response(cmd, Value::Null)),
        }
    });
    let f = fixture_with(state, sender, Arc::new(MemoryTokenStore::new()));

    // WHEN: Selecting C
    f.dispatcher
        .handle(dispatch(Event::VoiceChannelSelect, json!({"channel_id": "C"})))
        .await;

    // THEN: Snapshot taken before subscribing, five subscriptions active
    let scoped: BTreeSet<Event> = Event::CHANNEL_SCOPED.into_iter().collect();
    assert_eq!(f.state.current_channel(), Some(ChannelId::from("C")));
    assert_eq!(ids(&f.state), vec!["u1", "u2"]);
    assert_eq!(*roster_at_subscribe.lock().expect("seen lock"), Some(2));
    assert_eq!(channel_events(&f.sender, Command::Subscribe, "C"), scoped);
    assert_eq!(f.subscriptions.active().len(), 5);

    // WHEN: Leaving voice
    f.dispatcher
        .handle(dispatch(Event::VoiceChannelSelect, json!({"channel_id": null})))
        .await;

    // THEN: The same five unsubscribed, everything empty
    assert_eq!(channel_events(&f.sender, Command::Unsubscribe, "C"), scoped);
    assert_eq!(
        f.sender
            .commands()
            .iter()
            .filter(|cmd| **cmd == Command::Unsubscribe)
            .count(),
        5
    );
    assert!(f.state.roster.is_empty());
    assert_eq!(f.state.current_channel(), None);
    assert!(f.subscriptions.active().is_empty());
}

/// **VALUE**: Verifies switching channels leaves the old one before joining the new one.
///
/// **WHY THIS MATTERS**: The roster must never mix members of two channels.
///
/// **BUG THIS CATCHES**: Would catch the previous channel's subscriptions surviving a switch.
#[tokio::test]
async fn given_channel_a_when_switching_to_b_then_a_unsubscribed_and_roster_is_b() {
    // GIVEN: A server knowing channels A and B
    let sender = FakeSender::new(|request| match request.cmd {
        Command::GetChannel => {
            let id = request.channel_id().map(|c| c.as_str().to_string());
            let body = if id.as_deref() == Some("A") {
                channel("A", &[("u1", "One")])
            } else {
                channel("B", &[("u2", "Two"), ("u3", "Three")])
            };
            Ok(response(Command::GetChannel, body))
        }
        cmd => Ok(response(cmd, Value::Null)),
    });
    let f = fixture(sender);
    f.dispatcher
        .handle(dispatch(Event::VoiceChannelSelect, json!({"channel_id": "A"})))
        .await;

    // WHEN: Switching to B
    f.dispatcher
        .handle(dispatch(Event::VoiceChannelSelect, json!({"channel_id": "B"})))
        .await;

    // THEN: A fully unsubscribed, only B active, roster is B's members
    assert_eq!(channel_events(&f.sender, Command::Unsubscribe, "A").len(), 5);
    assert!(
        f.subscriptions
            .active()
            .iter()
            .all(|(_, channel)| channel.as_str() == "B")
    );
    assert_eq!(ids(&f.state), vec!["u2", "u3"]);
}

/// **VALUE**: Verifies CREATE / CHANGE / DELETE drive the roster and CHANGE keeps speaking.
///
/// **WHY THIS MATTERS**: Mute toggles arrive as CHANGE while the member is talking; losing
/// the speaking flag makes the highlight flicker off.
///
/// **BUG THIS CATCHES**: Would catch CHANGE rebuilding the entry from scratch.
#[tokio::test]
async fn given_member_events_when_dispatched_then_roster_follows_and_change_keeps_speaking() {
    // GIVEN: In channel 7
    let f = fixture(FakeSender::succeeding());
    f.state.set_current_channel(Some(ChannelId::from("7")));

    // WHEN: u1 joins and starts speaking, then self-mutes
    f.dispatcher
        .handle(dispatch(Event::VoiceStateCreate, voice_state("u1", "one")))
        .await;
    f.dispatcher
        .handle(dispatch(
            Event::SpeakingStart,
            json!({"user_id": "u1", "channel_id": "7"}),
        ))
        .await;
    let mut muted = voice_state("u1", "one");
    muted["voice_state"]["self_mute"] = json!(true);
    f.dispatcher
        .handle(dispatch(Event::VoiceStateChange, muted))
        .await;

    // THEN: u1 is muted and still speaking
    let u1 = f
        .state
        .roster
        .get_by_id(&UserId::from("u1"))
        .expect("u1 present");
    assert!(u1.muted);
    assert!(u1.speaking);

    // WHEN: u1 leaves, and a DELETE for an unknown member arrives
    f.dispatcher
        .handle(dispatch(Event::VoiceStateDelete, voice_state("u1", "one")))
        .await;
    f.dispatcher
        .handle(dispatch(Event::VoiceStateDelete, voice_state("ghost", "ghost")))
        .await;

    // THEN: Empty roster
    assert!(f.state.roster.is_empty());
}

/// **VALUE**: Verifies member events outside a channel are ignored.
///
/// **WHY THIS MATTERS**: The roster must be empty whenever there is no current channel.
///
/// **BUG THIS CATCHES**: Would catch a late CREATE repopulating the roster after leaving.
#[tokio::test]
async fn given_no_channel_when_voice_state_created_then_roster_stays_empty() {
    // GIVEN: Not in a channel
    let f = fixture(FakeSender::succeeding());

    // WHEN: A CREATE arrives
    f.dispatcher
        .handle(dispatch(Event::VoiceStateCreate, voice_state("u1", "one")))
        .await;

    // THEN: Ignored
    assert!(f.state.roster.is_empty());
}

/// **VALUE**: Verifies one malformed event does not stop later events.
///
/// **WHY THIS MATTERS**: Handlers run in one task; a failure must stay local.
///
/// **BUG THIS CATCHES**: Would catch a payload error ending the event loop.
#[tokio::test]
async fn given_malformed_event_then_valid_event_when_run_then_valid_event_applied() {
    // GIVEN: In channel 7, a queue with a broken CREATE followed by two valid ones
    let f = fixture(FakeSender::succeeding());
    f.state.set_current_channel(Some(ChannelId::from("7")));
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(dispatch(Event::VoiceStateCreate, json!({"nick": "no user"})))
        .expect("queue");
    tx.send(dispatch(Event::VoiceStateCreate, voice_state("u1", "one")))
        .expect("queue");
    tx.send(dispatch(Event::VoiceStateCreate, voice_state("u2", "two")))
        .expect("queue");
    drop(tx);

    // WHEN: Running the dispatcher to completion
    let state = f.state.clone();
    f.dispatcher.run(rx).await;

    // THEN: Valid events applied in arrival order
    assert_eq!(ids(&state), vec!["u1", "u2"]);
}

/// **VALUE**: Verifies READY authenticates, subscribes session events, and loads the
/// selected channel and settings.
///
/// **WHY THIS MATTERS**: This is the whole startup sequence; without it the overlay stays
/// empty until the user changes channel.
///
/// **BUG THIS CATCHES**: Would catch skipping the initial channel fetch or the settings mirror.
#[tokio::test]
async fn given_stored_token_when_ready_then_authenticated_and_selected_channel_joined() {
    // GIVEN: A stored token and a server in channel 7 with muted settings
    let sender = FakeSender::new(|request| match request.cmd {
        Command::GetSelectedVoiceChannel => Ok(response(
            Command::GetSelectedVoiceChannel,
            channel("7", &[("u1", "One")]),
        )),
        Command::GetVoiceSettings => Ok(response(
            Command::GetVoiceSettings,
            json!({"mute": true, "deaf": false, "input": {"volume": 100}}),
        )),
        cmd => Ok(response(cmd, Value::Null)),
    });
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(
        RedactedAccessToken::new(String::from("stored")),
    ));
    let f = fixture_with(SharedState::new(), sender, store);

    // WHEN: READY arrives
    f.dispatcher.handle(dispatch(Event::Ready, json!({"v": 1}))).await;

    // THEN: Authenticated first, session events subscribed, channel joined, settings mirrored
    let sent = f.sender.sent();
    assert_eq!(sent[0].cmd, Command::Authenticate);
    let session: BTreeSet<Event> = sent
        .iter()
        .filter(|r| r.cmd == Command::Subscribe && r.channel_id().is_none())
        .filter_map(|r| r.evt)
        .collect();
    assert_eq!(
        session,
        Event::SESSION_SCOPED.into_iter().collect::<BTreeSet<_>>()
    );
    assert_eq!(f.state.current_channel(), Some(ChannelId::from("7")));
    assert_eq!(ids(&f.state), vec!["u1"]);
    assert_eq!(channel_events(&f.sender, Command::Subscribe, "7").len(), 5);
    assert_eq!(
        f.state.voice_settings(),
        VoiceSettings {
            mute: true,
            deaf: false
        }
    );
}

/// **VALUE**: Verifies READY with no selected channel leaves the roster empty.
///
/// **WHY THIS MATTERS**: GET_SELECTED_VOICE_CHANNEL answers `null` when not in voice.
///
/// **BUG THIS CATCHES**: Would catch `null` data being treated as a payload error that
/// aborts the settings mirror.
#[tokio::test]
async fn given_not_in_voice_when_ready_then_no_channel_and_no_channel_subscriptions() {
    // GIVEN: A server not in any channel
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(
        RedactedAccessToken::new(String::from("stored")),
    ));
    let f = fixture_with(SharedState::new(), FakeSender::succeeding(), store);

    // WHEN: READY arrives
    f.dispatcher.handle(dispatch(Event::Ready, json!({}))).await;

    // THEN: No channel, only the two session subscriptions
    assert_eq!(f.state.current_channel(), None);
    assert!(f.state.roster.is_empty());
    assert_eq!(
        f.sender
            .commands()
            .iter()
            .filter(|cmd| **cmd == Command::Subscribe)
            .count(),
        2
    );
}

/// **VALUE**: Verifies frame classification.
///
/// **WHY THIS MATTERS**: Only DISPATCH frames with an event kind reach handlers.
///
/// **BUG THIS CATCHES**: Would catch stray responses being routed as events.
#[test]
fn given_frames_when_routed_then_only_dispatch_with_event_is_dispatched() {
    // GIVEN: A push, a late response and an unknown event kind
    let push = dispatch(Event::SpeakingStop, json!({"user_id": "u1"}));
    let late = response(Command::Subscribe, Value::Null);
    let unknown = Envelope::parse(r#"{"cmd":"DISPATCH","evt":"GUILD_STATUS","data":{}}"#)
        .expect("valid envelope");

    // WHEN / THEN
    assert!(matches!(
        route(push),
        Routed::Dispatch {
            event: Event::SpeakingStop,
            ..
        }
    ));
    assert!(matches!(route(late), Routed::Unhandled(_)));
    assert!(matches!(
        route(unknown),
        Routed::Dispatch {
            event: Event::Unknown,
            ..
        }
    ));
}
