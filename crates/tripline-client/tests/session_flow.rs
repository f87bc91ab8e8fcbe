//! End-to-end session flows over the scripted harness.
//!
//! Virtual time: the harness environment drives debounce windows and
//! retry backoff, while the paused tokio clock drives the driver's tick
//! cadence. Tests advance both and assert on published snapshots.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tripline_client::{
    Identity, LinkState, SessionCommand, SessionConfig, SessionDriver, SessionHandle,
    SessionSnapshot, Severity, SupportApi, Transport, TransportError, TransportEvent,
};
use tripline_harness::{FakeTransport, FakeTransportHandle, SimEnv, StubSupportApi};

struct Fixture {
    env: SimEnv,
    transport: FakeTransportHandle,
    api: Arc<StubSupportApi>,
    handle: SessionHandle,
    driver: JoinHandle<()>,
}

fn spawn_session() -> Fixture {
    let env = SimEnv::new(7);
    let (transport, transport_handle) = FakeTransport::new();
    let api = Arc::new(StubSupportApi::new());
    let (driver, handle) = SessionDriver::new(
        env.clone(),
        SessionConfig::default(),
        transport,
        Arc::clone(&api) as Arc<dyn SupportApi>,
    );
    Fixture {
        env,
        transport: transport_handle,
        api,
        handle,
        driver: tokio::spawn(driver.run()),
    }
}

/// Poll snapshots until the predicate holds. Instant under paused time.
async fn wait_for(
    handle: &SessionHandle,
    what: &str,
    predicate: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    for _ in 0..100 {
        let snapshot = handle.snapshot();
        if predicate(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}; last snapshot: {:?}", handle.snapshot());
}

/// Let the driver drain its queues and see a few tick periods.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

async fn connect(fixture: &Fixture) {
    fixture.handle.send(SessionCommand::Connect(Identity::new("user-1", "tok"))).unwrap();
    wait_for(&fixture.handle, "connection", |s| s.connection_state == LinkState::Connected).await;
}

#[tokio::test(start_paused = true)]
async fn chat_frame_reaches_store_and_toast() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture
        .transport
        .push_frame(json!({ "type": "chat_message", "id": "m1", "message": "hello there" }));

    let snapshot = wait_for(&fixture.handle, "stored chat", |s| s.unread_count == 1).await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.toasts.len(), 1);
    assert_eq!(snapshot.toasts[0].title, "New chat message");
    assert_eq!(snapshot.toasts[0].body, "hello there");
}

#[tokio::test(start_paused = true)]
async fn duplicate_frame_is_dropped() {
    let fixture = spawn_session();
    connect(&fixture).await;

    let frame = json!({ "type": "chat_message", "id": "m1", "message": "hi" });
    fixture.transport.push_frame(frame.clone());
    wait_for(&fixture.handle, "first copy", |s| s.messages.len() == 1).await;

    fixture.transport.push_frame(frame);
    settle().await;

    let snapshot = fixture.handle.snapshot();
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.unread_count, 1);
    assert_eq!(snapshot.toasts.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn support_burst_collapses_to_bounded_fetches() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.api.set_threads(vec![
        serde_json::from_value(json!({ "ticketId": "t-1", "updatedContent": ["user-2: hi"] }))
            .unwrap(),
    ]);

    // Five pushes, 100 ms apart: one leading fetch, everything else
    // coalesces into a single trailing one.
    for i in 0..5 {
        fixture.transport.push_frame(json!({
            "type": "support_message",
            "id": format!("s{i}"),
            "ticketId": "t-1",
            "updatedContent": [format!("user-2: line {i}")]
        }));
        settle().await;
        fixture.env.advance(Duration::from_millis(100));
    }
    assert_eq!(fixture.api.call_count(), 1, "burst must collapse to the leading fetch");

    fixture.env.advance(Duration::from_secs(3));
    settle().await;
    assert_eq!(fixture.api.call_count(), 2, "one trailing fetch after the window lapses");

    let snapshot = fixture.handle.snapshot();
    assert_eq!(snapshot.tickets.len(), 1);
    assert_eq!(snapshot.tickets[0].ticket_id, "t-1");
}

#[tokio::test(start_paused = true)]
async fn receipt_is_stored_read_with_no_toast() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.transport.push_frame(json!({
        "type": "message_sent",
        "id": "r1",
        "ticketId": "t-1",
        "message": "ok",
        "updatedContent": ["user-1: ok"]
    }));

    let snapshot = wait_for(&fixture.handle, "stored receipt", |s| s.messages.len() == 1).await;
    assert_eq!(snapshot.unread_count, 0);
    assert!(snapshot.toasts.is_empty());
    assert_eq!(snapshot.tickets.len(), 1, "the carried snapshot updates the thread");
}

#[tokio::test(start_paused = true)]
async fn unexpected_close_reconnects_after_backoff() {
    let fixture = spawn_session();
    connect(&fixture).await;
    assert_eq!(fixture.transport.open_count(), 1);

    fixture.transport.push_closed("server restart");
    wait_for(&fixture.handle, "disconnect", |s| {
        s.connection_state == LinkState::Disconnected
    })
    .await;

    fixture.env.advance(Duration::from_millis(1100));
    wait_for(&fixture.handle, "reconnect", |s| s.connection_state == LinkState::Connected).await;
    assert_eq!(fixture.transport.open_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn explicit_disconnect_suppresses_reconnection() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.transport.push_closed("server restart");
    wait_for(&fixture.handle, "disconnect", |s| {
        s.connection_state == LinkState::Disconnected
    })
    .await;

    // Retry is scheduled; the explicit disconnect must cancel it
    fixture.handle.send(SessionCommand::Disconnect).unwrap();
    settle().await;

    fixture.env.advance(Duration::from_secs(60));
    settle().await;
    assert_eq!(fixture.transport.open_count(), 1, "no automatic reconnection after logout");
    assert_eq!(fixture.handle.snapshot().connection_state, LinkState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn outbound_sends_reach_the_transport() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.handle.send(SessionCommand::SendChatMessage("hello".to_owned())).unwrap();
    fixture
        .handle
        .send(SessionCommand::SendSupportMessage {
            to_partner_id: "partner-1".to_owned(),
            text: "need help".to_owned(),
        })
        .unwrap();
    settle().await;

    let sent = fixture.transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["type"], "chat_message");
    assert_eq!(sent[0]["message"], "hello");
    assert!(sent[0]["id"].is_string());
    assert_eq!(sent[1]["type"], "support_message");
    assert_eq!(sent[1]["to"], "partner-1");
}

#[tokio::test(start_paused = true)]
async fn send_while_disconnected_is_dropped_not_fatal() {
    let fixture = spawn_session();

    fixture.handle.send(SessionCommand::SendChatMessage("into the void".to_owned())).unwrap();
    settle().await;

    assert!(fixture.transport.sent().is_empty());
    assert!(!fixture.driver.is_finished(), "a rejected send must not kill the driver");
}

#[tokio::test(start_paused = true)]
async fn mark_read_and_clear_all() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.transport.push_frame(json!({ "type": "chat_message", "id": "m1", "message": "a" }));
    fixture.transport.push_frame(json!({
        "type": "support_message",
        "id": "s1",
        "ticketId": "t-1",
        "updatedContent": ["user-2: hi"]
    }));
    wait_for(&fixture.handle, "both frames", |s| s.messages.len() == 2).await;

    fixture.handle.send(SessionCommand::MarkRead("m1".to_owned())).unwrap();
    let snapshot = wait_for(&fixture.handle, "mark read", |s| s.unread_count == 1).await;
    assert_eq!(snapshot.messages.len(), 2);

    fixture.handle.send(SessionCommand::ClearAll).unwrap();
    let snapshot = wait_for(&fixture.handle, "clear", |s| s.messages.is_empty()).await;
    assert_eq!(snapshot.unread_count, 0);
    assert!(snapshot.tickets.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_reload_keeps_board_and_surfaces_error_toast() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.api.set_threads(vec![
        serde_json::from_value(json!({ "ticketId": "t-1", "updatedContent": ["user-2: hi"] }))
            .unwrap(),
    ]);
    fixture.transport.push_frame(json!({
        "type": "support_message",
        "id": "s1",
        "ticketId": "t-1",
        "updatedContent": ["user-2: hi"]
    }));
    wait_for(&fixture.handle, "board populated", |s| s.tickets.len() == 1).await;

    // Next reload fails; the last-known board must survive
    fixture.api.set_failing(true);
    fixture.env.advance(Duration::from_secs(3));
    fixture.transport.push_frame(json!({
        "type": "support_message",
        "id": "s2",
        "ticketId": "t-1",
        "updatedContent": ["user-2: again"]
    }));

    let snapshot = wait_for(&fixture.handle, "error toast", |s| {
        s.toasts.iter().any(|t| t.severity == Severity::Error)
    })
    .await;
    assert_eq!(snapshot.tickets.len(), 1, "failed reload retains the last-known board");
}

/// Transport whose open never resolves, like a connect against an
/// unreachable server with no OS timeout.
struct StalledOpenTransport;

impl Transport for StalledOpenTransport {
    async fn open(&mut self, _identity: &Identity) -> Result<(), TransportError> {
        std::future::pending().await
    }

    async fn send(&mut self, _frame: Value) -> Result<(), TransportError> {
        Err(TransportError::Stream("no connection".to_owned()))
    }

    async fn recv(&mut self) -> TransportEvent {
        std::future::pending().await
    }

    async fn close(&mut self) {}
}

fn spawn_with_stalled_open() -> (SessionHandle, JoinHandle<()>) {
    let (driver, handle) = SessionDriver::new(
        SimEnv::new(7),
        SessionConfig::default(),
        StalledOpenTransport,
        Arc::new(StubSupportApi::new()) as Arc<dyn SupportApi>,
    );
    let task = tokio::spawn(driver.run());
    (handle, task)
}

#[tokio::test(start_paused = true)]
async fn connecting_state_is_published_while_open_is_in_flight() {
    let (handle, driver) = spawn_with_stalled_open();

    handle.send(SessionCommand::Connect(Identity::new("user-1", "tok"))).unwrap();
    wait_for(&handle, "connecting snapshot", |s| s.connection_state == LinkState::Connecting)
        .await;
    assert!(!driver.is_finished());
    driver.abort();
}

#[tokio::test(start_paused = true)]
async fn shutdown_completes_while_open_is_in_flight() {
    let (handle, driver) = spawn_with_stalled_open();

    handle.send(SessionCommand::Connect(Identity::new("user-1", "tok"))).unwrap();
    wait_for(&handle, "connecting snapshot", |s| s.connection_state == LinkState::Connecting)
        .await;

    handle.send(SessionCommand::Shutdown).unwrap();
    settle().await;
    assert!(driver.is_finished(), "a hanging open must not block shutdown");
}

#[tokio::test(start_paused = true)]
async fn logout_is_processed_while_open_is_in_flight() {
    let (handle, driver) = spawn_with_stalled_open();

    handle.send(SessionCommand::Connect(Identity::new("user-1", "tok"))).unwrap();
    wait_for(&handle, "connecting snapshot", |s| s.connection_state == LinkState::Connecting)
        .await;

    // The loop keeps serving commands while the open hangs
    handle.send(SessionCommand::Disconnect).unwrap();
    wait_for(&handle, "logout", |s| s.connection_state == LinkState::Disconnected).await;
    assert!(!driver.is_finished());

    handle.send(SessionCommand::Shutdown).unwrap();
    settle().await;
    assert!(driver.is_finished());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_driver() {
    let fixture = spawn_session();
    connect(&fixture).await;

    fixture.handle.send(SessionCommand::Shutdown).unwrap();
    settle().await;

    assert!(fixture.driver.is_finished());
    assert!(fixture.handle.send(SessionCommand::ClearAll).is_err());
}
