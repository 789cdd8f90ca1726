use crate::connector_tests::helpers::{
    ACCESS_TOKEN, CHANNEL_ID, FakeVoiceApp, TEST_ORIGIN, bind_after_free_port,
    start_token_exchange, test_config, voice_state, wait_until,
};

use overlay_core::{ConnectionState, Connector, MemoryTokenStore, RosterChange, TokenStore};

use models::{ChannelId, UserId};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

const SETTLE: Duration = Duration::from_secs(5);

fn ids(connector: &Connector) -> Vec<String> {
    connector
        .roster()
        .ids()
        .iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

async fn connected_session() -> (FakeVoiceApp, Connector, wiremock::MockServer) {
    let (listener, _) = bind_after_free_port().await;
    let app = FakeVoiceApp::start(listener);
    let exchange = start_token_exchange().await;
    let connector = Connector::new(
        test_config(app.port, app.port, &exchange),
        Arc::new(MemoryTokenStore::new()),
    )
    .expect("connector");

    connector.connect();
    assert!(
        wait_until(SETTLE, || connector.roster().len() == 2).await,
        "roster never populated"
    );
    (app, connector, exchange)
}

/// **VALUE**: Verifies the full startup: port scan, handshake, authorize, exchange,
/// authenticate, and roster snapshot of the selected channel.
///
/// **WHY THIS MATTERS**: This is the path every launch takes; any broken link leaves the
/// overlay empty forever.
///
/// **BUG THIS CATCHES**: Would catch a scan that never leaves the first port, a missing
/// Origin header, a token that is not persisted, or a roster that is not filled.
#[tokio::test]
async fn given_voice_app_on_second_port_when_connect_then_scans_authenticates_and_fills_roster() {
    // GIVEN: A dead port followed by the fake voice application
    let (listener, dead_port) = bind_after_free_port().await;
    let app = FakeVoiceApp::start(listener);
    let exchange = start_token_exchange().await;
    let store = Arc::new(MemoryTokenStore::new());
    let connector = Connector::new(test_config(dead_port, app.port, &exchange), store.clone())
        .expect("connector");

    // WHEN: Connecting
    connector.connect();

    // THEN: Connected with channel 7's members
    assert!(
        wait_until(SETTLE, || connector.roster().len() == 2).await,
        "roster never populated"
    );
    assert_eq!(connector.state(), ConnectionState::Connected);
    assert_eq!(connector.current_channel(), Some(ChannelId::from(CHANNEL_ID)));
    assert_eq!(ids(&connector), vec!["u1", "u2"]);

    // THEN: Handshake carried version, client id and origin
    let handshake = app.handshakes().into_iter().next().expect("handshake");
    assert_eq!(handshake.uri, "/?v=1&client_id=207646673902501888");
    assert_eq!(handshake.origin.as_deref(), Some(TEST_ORIGIN));

    // THEN: Authorized once, token stored, five channel subscriptions
    let commands = app.commands();
    assert_eq!(commands.iter().filter(|c| *c == "AUTHORIZE").count(), 1);
    assert_eq!(
        store.get_token().map(|t| t.as_str().to_string()),
        Some(ACCESS_TOKEN.to_string())
    );
    assert!(
        wait_until(SETTLE, || connector.subscriptions().active().len() == 5).await,
        "channel subscriptions missing"
    );

    connector.disconnect();
}

/// **VALUE**: Verifies disconnect closes the socket and stops reconnecting.
///
/// **WHY THIS MATTERS**: After the user turns the overlay off, it must not keep poking the
/// voice application every 100 ms.
///
/// **BUG THIS CATCHES**: Would catch the supervisor ignoring the cleared flag after the
/// close event.
#[tokio::test]
async fn given_connected_when_disconnect_then_no_further_connection_attempts() {
    // GIVEN: A live session
    let (app, connector, _exchange) = connected_session().await;
    assert_eq!(app.connections(), 1);

    // WHEN: Disconnecting
    connector.disconnect();

    // THEN: Disconnected, roster and channel cleared, and no reconnect after many delays
    assert!(
        wait_until(SETTLE, || connector.state() == ConnectionState::Disconnected).await,
        "never disconnected"
    );
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(app.connections(), 1);
    assert!(connector.roster().is_empty());
    assert_eq!(connector.current_channel(), None);
}

/// **VALUE**: Verifies a server-side close clears the roster and reconnects.
///
/// **WHY THIS MATTERS**: The voice application restarts on updates; the overlay must heal
/// without user action and must not show stale members meanwhile.
///
/// **BUG THIS CATCHES**: Would catch the roster surviving a lost session or the reconnect
/// loop not restarting after a successful session ended.
#[tokio::test]
async fn given_connected_when_server_closes_then_roster_cleared_and_session_restored() {
    // GIVEN: A live session with an observer
    let (app, connector, _exchange) = connected_session().await;
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    let _handle = connector
        .roster()
        .subscribe(move |change| sink.lock().expect("changes lock").push(change));

    // WHEN: The server drops the connection
    app.close_connection();

    // THEN: A second connection is made and the roster is rebuilt after a clear
    assert!(
        wait_until(SETTLE, || app.connections() == 2 && connector.roster().len() == 2).await,
        "session not restored"
    );
    let recorded = changes.lock().expect("changes lock").clone();
    assert_eq!(recorded.first(), Some(&RosterChange::new(0, 2, 0)));
    assert_eq!(connector.state(), ConnectionState::Connected);

    connector.disconnect();
}

/// **VALUE**: Verifies pushes update the roster, including after a malformed frame.
///
/// **WHY THIS MATTERS**: Membership and speaking changes only arrive as pushes.
///
/// **BUG THIS CATCHES**: Would catch a malformed frame killing the session, or speaking
/// events not reaching the roster.
#[tokio::test]
async fn given_connected_when_pushes_arrive_then_roster_updates_in_order() {
    // GIVEN: A live session in channel 7
    let (app, connector, _exchange) = connected_session().await;
    assert!(
        wait_until(SETTLE, || connector.subscriptions().active().len() == 5).await,
        "channel subscriptions missing"
    );

    // WHEN: Garbage, then u3 joins, u1 speaks, u2 leaves
    app.push_raw("this is not json");
    app.push("VOICE_STATE_CREATE", voice_state("u3", "three"));
    app.push(
        "SPEAKING_START",
        json!({"user_id": "u1", "channel_id": CHANNEL_ID}),
    );
    app.push("VOICE_STATE_DELETE", voice_state("u2", "two"));

    // THEN: Roster is [u1 (speaking), u3]
    assert!(
        wait_until(SETTLE, || ids(&connector) == vec!["u1", "u3"]).await,
        "roster is {:?}",
        ids(&connector)
    );
    assert!(
        wait_until(SETTLE, || connector
            .roster()
            .get_by_id(&UserId::from("u1"))
            .is_some_and(|entry| entry.speaking))
        .await
    );
    assert_eq!(app.connections(), 1);

    connector.disconnect();
}

/// **VALUE**: Verifies toggles round-trip through the server and update the mirror.
///
/// **WHY THIS MATTERS**: The hotkey path depends on it.
///
/// **BUG THIS CATCHES**: Would catch the toggle sending the current value instead of
/// its negation.
#[tokio::test]
async fn given_connected_when_toggle_mute_then_server_and_mirror_muted() {
    // GIVEN: A live, unmuted session
    let (app, connector, _exchange) = connected_session().await;
    assert!(!connector.voice_settings().mute);

    // WHEN: Toggling mute
    let settings = connector.toggle_mute().await.expect("toggle");

    // THEN: Server and mirror agree
    assert!(settings.mute);
    assert!(connector.voice_settings().mute);
    assert_eq!(app.settings()["mute"], true);

    connector.disconnect();
}

/// **VALUE**: Verifies RPCs without a connection fail fast with NotConnected.
///
/// **WHY THIS MATTERS**: UI callers need an immediate answer, not a one-second wait.
///
/// **BUG THIS CATCHES**: Would catch sends being queued while disconnected.
#[tokio::test]
async fn given_never_connected_when_toggle_mute_then_not_connected() {
    // GIVEN: A connector that was never started
    let exchange = start_token_exchange().await;
    let connector = Connector::new(
        test_config(6463, 6472, &exchange),
        Arc::new(MemoryTokenStore::new()),
    )
    .expect("connector");

    // WHEN: Toggling mute
    let result = connector.toggle_mute().await;

    // THEN: NotConnected, mirror unchanged
    assert!(result.expect_err("should fail").is_not_connected());
    assert!(!connector.voice_settings().mute);
    assert_eq!(connector.state(), ConnectionState::Disconnected);
}
