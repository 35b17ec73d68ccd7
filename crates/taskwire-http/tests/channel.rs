//! Push channel lifecycle against a local WebSocket server.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskwire_core::error::{AuthError, Error};
use taskwire_core::{ClientConfig, NotificationLevel, TaskAction};
use taskwire_http::ChannelState;
use taskwire_http::channel::SESSION_EXPIRED_MESSAGE;

use common::{Harness, Script, WsServer, api_base, harness_with, wait_until, within};

const REFRESH_PATH: &str = "/api/auth/token/refresh/";

fn channel_harness(api: &MockServer, ws: &WsServer) -> Harness {
    let config = ClientConfig::new(api_base(api))
        .unwrap()
        .with_ws_base(ws.base.clone())
        .with_reconnect_delay(Duration::from_millis(50))
        .with_request_timeout(Duration::from_secs(2));
    harness_with(config)
}

async fn mount_refresh(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Connecting
// ============================================================================

#[tokio::test]
async fn connect_opens_with_the_access_token() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    assert_eq!(channel.state(), ChannelState::Idle);

    within(channel.connect()).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);
    assert_eq!(ws.tokens(), vec!["A1".to_string()]);

    channel.shutdown();
}

#[tokio::test]
async fn concurrent_connects_open_one_socket() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    let (a, b) = within(async { tokio::join!(channel.connect(), channel.connect()) }).await;
    assert!(a.is_ok() && b.is_ok());

    wait_until("handshake", || ws.accepted() == 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ws.accepted(), 1);
    assert_eq!(channel.state(), ChannelState::Open);

    // already open: nothing new
    within(channel.connect()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ws.tokens().len(), 1);

    channel.shutdown();
}

#[tokio::test]
async fn connect_without_session_does_nothing() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![]).await;
    let h = channel_harness(&api, &ws);

    let err = within(h.client.channel().connect()).await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
    assert_eq!(h.client.channel().state(), ChannelState::Idle);
    assert!(!h.client.channel().reconnect_pending());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(ws.tokens().is_empty());
}

#[tokio::test]
async fn unreachable_server_schedules_plain_reconnect() {
    let api = MockServer::start().await;
    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::new(api_base(&api))
        .unwrap()
        .with_ws_base(taskwire_core::ApiUrl::new(format!("ws://127.0.0.1:{}", closed_port)).unwrap())
        .with_reconnect_delay(Duration::from_secs(30));
    let h = harness_with(config);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    let err = within(channel.connect()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(channel.state(), ChannelState::Closed);
    assert_eq!(channel.last_close_code(), None);
    assert!(channel.reconnect_pending());
    assert_eq!(h.client.refresher().exchange_count(), 0);

    channel.shutdown();
    assert!(!channel.reconnect_pending());
    assert_eq!(channel.state(), ChannelState::Idle);
}

// ============================================================================
// Close handling
// ============================================================================

#[tokio::test]
async fn normal_close_reconnects_without_refresh() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![Script::Close(1000), Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    within(channel.connect()).await.unwrap();

    wait_until("reconnect", || ws.accepted() == 2).await;
    wait_until("open", || channel.state() == ChannelState::Open).await;

    assert_eq!(ws.tokens(), vec!["A1".to_string(), "A1".to_string()]);
    assert_eq!(h.client.refresher().exchange_count(), 0);

    channel.shutdown();
}

#[tokio::test]
async fn token_close_refreshes_then_reconnects() {
    let api = MockServer::start().await;
    mount_refresh(&api, 200, json!({ "access": "A2" })).await;
    let ws = WsServer::start(vec![Script::Close(4001), Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    within(channel.connect()).await.unwrap();

    wait_until("reconnect", || ws.accepted() == 2).await;
    wait_until("open", || channel.state() == ChannelState::Open).await;

    assert_eq!(ws.tokens(), vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(h.client.refresher().exchange_count(), 1);
    assert!(h.notifier.messages().is_empty());

    channel.shutdown();
}

#[tokio::test]
async fn dropped_connection_refreshes_then_reconnects() {
    let api = MockServer::start().await;
    mount_refresh(&api, 200, json!({ "access": "A2", "refresh": "R2" })).await;
    let ws = WsServer::start(vec![Script::Drop, Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    within(channel.connect()).await.unwrap();

    wait_until("reconnect", || ws.accepted() == 2).await;
    wait_until("open", || channel.state() == ChannelState::Open).await;

    assert_eq!(ws.tokens(), vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(h.client.store().refresh_token().unwrap().as_str(), "R2");

    channel.shutdown();
}

#[tokio::test]
async fn token_close_with_failed_refresh_abandons() {
    let api = MockServer::start().await;
    mount_refresh(&api, 401, json!({ "detail": "Token is blacklisted" })).await;
    let ws = WsServer::start(vec![Script::Close(4001), Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    within(channel.connect()).await.unwrap();

    wait_until("abandon", || channel.state() == ChannelState::Abandoned).await;
    assert_eq!(channel.last_close_code(), Some(4001));
    assert!(!channel.reconnect_pending());
    assert!(!h.client.has_session());
    assert_eq!(
        h.notifier.messages(),
        vec![(SESSION_EXPIRED_MESSAGE.to_string(), NotificationLevel::Error)]
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ws.accepted(), 1);
    assert_eq!(channel.state(), ChannelState::Abandoned);

    // a new login can bring the channel back
    h.login_as("A3", "R3", None);
    within(channel.connect()).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);
    assert_eq!(ws.tokens().last().map(String::as_str), Some("A3"));

    channel.shutdown();
}

#[tokio::test]
async fn session_cleared_before_reconnect_abandons() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![Script::Close(1000), Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    let mut states = channel.subscribe();
    within(channel.connect()).await.unwrap();

    // logged out elsewhere before the reconnect timer fires
    h.client.store().clear().unwrap();

    within(states.wait_for(|state| *state == ChannelState::Abandoned))
        .await
        .unwrap();
    assert_eq!(channel.last_close_code(), Some(1000));
    assert!(!channel.reconnect_pending());
    assert_eq!(h.client.refresher().exchange_count(), 0);
    assert_eq!(
        h.notifier.messages(),
        vec![(SESSION_EXPIRED_MESSAGE.to_string(), NotificationLevel::Error)]
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ws.accepted(), 1);
    assert_eq!(ws.tokens(), vec!["A1".to_string()]);
    assert_eq!(channel.state(), ChannelState::Abandoned);
}

#[tokio::test]
async fn rejected_handshake_takes_refresh_path() {
    let api = MockServer::start().await;
    mount_refresh(&api, 200, json!({ "access": "A2" })).await;
    let ws = WsServer::start(vec![Script::Reject(401), Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    let err = within(channel.connect()).await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::Unauthorized)));

    wait_until("open", || channel.state() == ChannelState::Open).await;
    assert_eq!(ws.tokens(), vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(ws.accepted(), 1);
    assert_eq!(h.client.refresher().exchange_count(), 1);

    channel.shutdown();
}

#[tokio::test]
async fn shutdown_stops_reconnecting() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    within(channel.connect()).await.unwrap();
    wait_until("handshake", || ws.accepted() == 1).await;

    channel.shutdown();
    assert_eq!(channel.state(), ChannelState::Idle);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(ws.accepted(), 1);
    assert_eq!(channel.state(), ChannelState::Idle);
    assert!(!channel.reconnect_pending());
}

#[tokio::test]
async fn shutdown_during_handshake_drops_the_late_socket() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![Script::Stall(Duration::from_millis(300))]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel().clone();
    let pending = tokio::spawn({
        let channel = channel.clone();
        async move { channel.connect().await }
    });

    wait_until("connecting", || channel.state() == ChannelState::Connecting).await;
    channel.shutdown();
    assert_eq!(channel.state(), ChannelState::Idle);

    // the handshake still completes, but its socket is not kept
    within(pending).await.unwrap().unwrap();
    wait_until("handshake", || ws.accepted() == 1).await;
    assert_eq!(channel.state(), ChannelState::Idle);
    assert!(!channel.send(&json!({ "type": "ping" })));
    assert!(!channel.reconnect_pending());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ws.accepted(), 1);
    assert_eq!(channel.state(), ChannelState::Idle);
    assert!(ws.received().is_empty());
}

// ============================================================================
// Frames
// ============================================================================

#[tokio::test]
async fn frames_reach_view_and_notifier() {
    let api = MockServer::start().await;
    let frames = vec![
        json!({
            "type": "task_updated",
            "action": "created",
            "task": { "id": 5, "name": "Pushed" }
        })
        .to_string(),
        "not json".to_string(),
        json!({ "type": "presence", "online": true }).to_string(),
        json!({ "type": "task_notify", "message": "Deadline soon" }).to_string(),
    ];
    let ws = WsServer::start(vec![Script::Send(frames)]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    within(channel.connect()).await.unwrap();

    wait_until("notification", || h.notifier.contains("Deadline soon")).await;

    let changes = h.view.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, TaskAction::Created);
    assert_eq!(changes[0].task.id, 5);
    assert_eq!(
        h.notifier.messages(),
        vec![("Deadline soon".to_string(), NotificationLevel::Info)]
    );
    // a bad frame does not take the socket down
    assert_eq!(channel.state(), ChannelState::Open);

    channel.shutdown();
}

#[tokio::test]
async fn send_requires_an_open_socket() {
    let api = MockServer::start().await;
    let ws = WsServer::start(vec![Script::Hold]).await;
    let h = channel_harness(&api, &ws);
    h.login_as("A1", "R1", None);

    let channel = h.client.channel();
    assert!(!channel.send(&json!({ "type": "ping" })));

    within(channel.connect()).await.unwrap();
    assert!(channel.send(&json!({ "type": "ping" })));

    wait_until("frame", || !ws.received().is_empty()).await;
    assert_eq!(ws.received(), vec![r#"{"type":"ping"}"#.to_string()]);

    channel.shutdown();
    assert!(!channel.send(&json!({ "type": "ping" })));
}
