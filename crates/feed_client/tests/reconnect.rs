//! Reconnection automaton against a scripted transport.

use async_trait::async_trait;
use feed_client::{ClientConfig, ClientError, ClientState, Connector, Session, StreamClient};
use feed_core::wire::{ControlAction, ControlMessage, ServerMessage};
use feed_core::PriceUpdate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Test-side view of one scripted session.
struct Probe {
    sent: Arc<Mutex<Vec<ControlMessage>>>,
    heartbeats: Arc<AtomicUsize>,
    events: mpsc::UnboundedSender<ServerMessage>,
}

impl Probe {
    fn sent(&self) -> Vec<ControlMessage> {
        self.sent.lock().unwrap().clone()
    }
}

struct FakeSession {
    sent: Arc<Mutex<Vec<ControlMessage>>>,
    heartbeats: Arc<AtomicUsize>,
    events: mpsc::UnboundedReceiver<ServerMessage>,
}

fn fake_session() -> (FakeSession, Probe) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let heartbeats = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::unbounded_channel();
    (
        FakeSession {
            sent: Arc::clone(&sent),
            heartbeats: Arc::clone(&heartbeats),
            events: rx,
        },
        Probe {
            sent,
            heartbeats,
            events: tx,
        },
    )
}

#[async_trait]
impl Session for FakeSession {
    async fn send_control(&mut self, message: &ControlMessage) -> Result<(), ClientError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn heartbeat(&mut self) -> Result<(), ClientError> {
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        Ok(self.events.recv().await)
    }

    async fn close(&mut self) {}
}

/// Hands out queued sessions; fails once the queue is empty.
#[derive(Default)]
struct Script {
    sessions: Mutex<VecDeque<FakeSession>>,
    attempts: AtomicUsize,
}

impl Script {
    fn push(&self, session: FakeSession) {
        self.sessions.lock().unwrap().push_back(session);
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
struct ScriptedConnector(Arc<Script>);

#[async_trait]
impl Connector for ScriptedConnector {
    type Session = FakeSession;

    async fn connect(&self, _url: &str) -> Result<FakeSession, ClientError> {
        self.0.attempts.fetch_add(1, Ordering::SeqCst);
        self.0
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::Connect("connection refused".into()))
    }
}

fn config() -> ClientConfig {
    ClientConfig::new("ws://feed.test/ws")
}

async fn wait_for(client: &StreamClient, state: ClientState) {
    let mut rx = client.watch_state();
    tokio::time::timeout(Duration::from_secs(120), rx.wait_for(|s| *s == state))
        .await
        .expect("state not reached")
        .unwrap();
}

fn subscribe_of(message: &ControlMessage) -> &[String] {
    assert_eq!(message.action, ControlAction::Subscribe);
    &message.symbols
}

#[tokio::test(start_paused = true)]
async fn test_parks_after_five_failed_attempts() {
    let connector = ScriptedConnector::default();
    let script = Arc::clone(&connector.0);
    let (client, _events) = StreamClient::spawn(connector, config());

    // attempts at 0 s, 3 s, 6 s and 9 s
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(script.attempts(), 4);
    assert_eq!(client.state(), ClientState::Reconnecting);

    wait_for(&client, ClientState::Disconnected).await;
    assert_eq!(script.attempts(), 5);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(script.attempts(), 5);
    assert_eq!(client.state(), ClientState::Disconnected);
}

fn tick(symbol: &str, timestamp: i64) -> ServerMessage {
    ServerMessage::PriceUpdate(PriceUpdate {
        symbol: symbol.into(),
        price: 3901.0,
        change: 1.0,
        change_percent: 0.0256,
        volume: 12_000,
        timestamp,
    })
}

#[tokio::test(start_paused = true)]
async fn test_reports_connecting_before_first_attempt_completes() {
    let (client, _events) = StreamClient::spawn(ScriptedConnector::default(), config());
    assert_eq!(client.state(), ClientState::Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_external_connect_resets_attempts() {
    let connector = ScriptedConnector::default();
    let script = Arc::clone(&connector.0);
    let (client, _events) = StreamClient::spawn(connector, config());
    wait_for(&client, ClientState::Disconnected).await;
    assert_eq!(script.attempts(), 5);

    let (session, _probe) = fake_session();
    script.push(session);
    client.connect().unwrap();
    wait_for(&client, ClientState::Connected).await;
    assert_eq!(script.attempts(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_replays_desired_set_after_reconnect() {
    let connector = ScriptedConnector::default();
    let script = Arc::clone(&connector.0);
    let (first, first_probe) = fake_session();
    let (second, second_probe) = fake_session();
    script.push(first);
    script.push(second);

    let (client, _events) = StreamClient::spawn(connector, config());
    client.subscribe(["TCS", "INFY"]).unwrap();
    wait_for(&client, ClientState::Connected).await;

    client.subscribe(["SBIN"]).unwrap();
    client.unsubscribe(["INFY"]).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let sent = first_probe.sent();
    assert!(sent
        .iter()
        .any(|m| m.action == ControlAction::Subscribe && m.symbols == ["SBIN"]));
    assert_eq!(sent.last().unwrap().action, ControlAction::Unsubscribe);

    // peer closes the first session
    drop(first_probe);
    wait_for(&client, ClientState::Reconnecting).await;
    wait_for(&client, ClientState::Connected).await;

    let replay = second_probe.sent();
    assert_eq!(replay.len(), 1);
    assert_eq!(subscribe_of(&replay[0]), ["SBIN", "TCS"]);
}

#[tokio::test(start_paused = true)]
async fn test_mutations_while_disconnected_stay_local() {
    let connector = ScriptedConnector::default();
    let script = Arc::clone(&connector.0);
    let mut config = config();
    config.max_attempts = 1;
    let (client, _events) = StreamClient::spawn(connector, config);
    wait_for(&client, ClientState::Disconnected).await;

    client.subscribe(["ITC", "RELIANCE"]).unwrap();
    client.unsubscribe(["ITC"]).unwrap();
    client.subscribe(["HDFCBANK"]).unwrap();
    assert_eq!(
        client.desired().into_iter().collect::<Vec<_>>(),
        ["HDFCBANK", "RELIANCE"]
    );
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(script.attempts(), 1);

    let (session, probe) = fake_session();
    script.push(session);
    client.connect().unwrap();
    wait_for(&client, ClientState::Connected).await;

    let sent = probe.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(subscribe_of(&sent[0]), ["HDFCBANK", "RELIANCE"]);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let connector = ScriptedConnector::default();
    let script = Arc::clone(&connector.0);
    let (client, _events) = StreamClient::spawn(connector, config());
    wait_for(&client, ClientState::Reconnecting).await;

    client.disconnect().unwrap();
    wait_for(&client, ClientState::Disconnected).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(script.attempts(), 1);
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_disconnect_is_terminal() {
    let connector = ScriptedConnector::default();
    let script = Arc::clone(&connector.0);
    let (session, _probe) = fake_session();
    script.push(session);
    let (client, _events) = StreamClient::spawn(connector, config());
    wait_for(&client, ClientState::Connected).await;

    client.disconnect().unwrap();
    wait_for(&client, ClientState::Disconnected).await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(script.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_while_connected() {
    let connector = ScriptedConnector::default();
    let (session, probe) = fake_session();
    connector.0.push(session);
    let (client, _events) = StreamClient::spawn(connector, config());
    wait_for(&client, ClientState::Connected).await;

    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(probe.heartbeats.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_server_messages_are_forwarded() {
    let connector = ScriptedConnector::default();
    let (session, probe) = fake_session();
    connector.0.push(session);
    let (client, mut events) = StreamClient::spawn(connector, config());
    wait_for(&client, ClientState::Connected).await;

    let update = PriceUpdate {
        symbol: "TCS".into(),
        price: 3901.0,
        change: 1.0,
        change_percent: 0.0256,
        volume: 12_000,
        timestamp: 1_718_000_000_000,
    };
    probe
        .events
        .send(ServerMessage::PriceUpdate(update.clone()))
        .unwrap();

    match events.recv().await {
        Some(ServerMessage::PriceUpdate(received)) => assert_eq!(received, update),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_task() {
    let connector = ScriptedConnector::default();
    let (client, _events, task) = StreamClient::spawn_with_handle(connector, config());
    drop(client);
    tokio::time::timeout(Duration::from_secs(60), task)
        .await
        .expect("task did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_full_event_buffer_does_not_block_commands() {
    let connector = ScriptedConnector::default();
    let (session, probe) = fake_session();
    connector.0.push(session);
    let mut config = config();
    config.event_buffer = 1;
    let (client, mut events) = StreamClient::spawn(connector, config);
    wait_for(&client, ClientState::Connected).await;

    for timestamp in 1..=3 {
        probe.events.send(tick("TCS", timestamp)).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    client.disconnect().unwrap();
    wait_for(&client, ClientState::Disconnected).await;

    match events.recv().await {
        Some(ServerMessage::PriceUpdate(first)) => assert_eq!(first.timestamp, 1),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(events.try_recv().is_err());
}
