//! Reconnection automaton.
//!
//! ```text
//! Disconnected ──connect()──▶ Connecting ──ok──▶ Connected
//!      ▲                        │   ▲               │
//!      │ attempts exhausted     │   │ backoff       │ closed / error
//!      │ or disconnect()      fail  │ elapsed       ▼
//!      └────────────────── Reconnecting ◀───────────┘
//! ```
//!
//! The desired subscription set lives with the handle. Every successful
//! connect replays it as a single subscribe request, so nothing is lost
//! across reconnects; mutations while not connected change only the set.

use feed_core::wire::{ControlMessage, ServerMessage};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::transport::{Connector, Session};

/// Connection state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// No session and no reconnect pending
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// Session open and subscriptions replayed
    Connected,
    /// Waiting out the backoff before the next attempt
    Reconnecting,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Disconnected => "disconnected",
            ClientState::Connecting => "connecting",
            ClientState::Connected => "connected",
            ClientState::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    /// Fixed delay before each reconnect attempt
    pub reconnect_delay: Duration,
    /// Consecutive failed attempts before parking in `Disconnected`
    pub max_attempts: u32,
    /// Keep-alive period while connected
    pub heartbeat_interval: Duration,
    /// Capacity of the event channel; messages arriving while it is full are dropped
    pub event_buffer: usize,
}

impl ClientConfig {
    /// Defaults for `url`: 3 s backoff, 5 attempts, 30 s heartbeat.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_millis(3000),
            max_attempts: 5,
            heartbeat_interval: Duration::from_secs(30),
            event_buffer: 256,
        }
    }
}

#[derive(Debug)]
enum Command {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
    Connect,
    Disconnect,
}

/// Handle to a running client task.
///
/// Dropping every clone of the handle stops the task.
#[derive(Clone)]
pub struct StreamClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ClientState>,
    desired: Arc<watch::Sender<BTreeSet<String>>>,
}

impl StreamClient {
    /// Start the client task and begin connecting immediately.
    ///
    /// Returns the handle and the stream of server messages.
    pub fn spawn<C: Connector>(
        connector: C,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (client, events, _task) = Self::spawn_with_handle(connector, config);
        (client, events)
    }

    /// Like [`StreamClient::spawn`], also returning the task handle.
    pub fn spawn_with_handle<C: Connector>(
        connector: C,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<ServerMessage>, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ClientState::Connecting);
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let desired = Arc::new(watch::channel(BTreeSet::new()).0);

        let driver = Driver {
            connector,
            config,
            commands: commands_rx,
            state: state_tx,
            desired: Arc::clone(&desired),
            events: events_tx,
            attempts: 0,
        };
        let task = tokio::spawn(driver.run());

        let client = Self {
            commands: commands_tx,
            state: state_rx,
            desired,
        };
        (client, events_rx, task)
    }

    /// Add symbols to the desired set; sent immediately when connected.
    pub fn subscribe<I, S>(&self, symbols: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        self.desired.send_modify(|set| set.extend(symbols.iter().cloned()));
        self.command(Command::Subscribe(symbols))
    }

    /// Remove symbols from the desired set; sent immediately when connected.
    pub fn unsubscribe<I, S>(&self, symbols: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        self.desired.send_modify(|set| {
            for symbol in &symbols {
                set.remove(symbol);
            }
        });
        self.command(Command::Unsubscribe(symbols))
    }

    /// Leave `Disconnected` and start a fresh series of attempts.
    pub fn connect(&self) -> Result<(), ClientError> {
        self.command(Command::Connect)
    }

    /// Close the session and cancel any pending reconnect.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.command(Command::Disconnect)
    }

    /// Current state
    pub fn state(&self) -> ClientState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn watch_state(&self) -> watch::Receiver<ClientState> {
        self.state.clone()
    }

    /// Snapshot of the desired subscription set
    pub fn desired(&self) -> BTreeSet<String> {
        self.desired.borrow().clone()
    }

    fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Stopped)
    }
}

enum Phase<S> {
    Idle,
    Connecting,
    Connected(S),
    Backoff,
    Stop,
}

enum Step {
    Command(Option<Command>),
    Heartbeat,
    Event(Result<Option<ServerMessage>, ClientError>),
}

struct Driver<C: Connector> {
    connector: C,
    config: ClientConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ClientState>,
    desired: Arc<watch::Sender<BTreeSet<String>>>,
    events: mpsc::Sender<ServerMessage>,
    attempts: u32,
}

impl<C: Connector> Driver<C> {
    async fn run(mut self) {
        let mut phase = Phase::Connecting;
        loop {
            phase = match phase {
                Phase::Idle => self.idle().await,
                Phase::Connecting => self.connecting().await,
                Phase::Connected(session) => self.connected(session).await,
                Phase::Backoff => self.backoff().await,
                Phase::Stop => break,
            };
        }
        self.set_state(ClientState::Disconnected);
        debug!("client task stopped");
    }

    fn set_state(&self, next: ClientState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            info!(state = %next, "client state changed");
        }
    }

    async fn idle(&mut self) -> Phase<C::Session> {
        self.set_state(ClientState::Disconnected);
        match self.commands.recv().await {
            None => Phase::Stop,
            Some(Command::Connect) => {
                self.attempts = 0;
                Phase::Connecting
            }
            Some(_) => Phase::Idle,
        }
    }

    async fn connecting(&mut self) -> Phase<C::Session> {
        self.set_state(ClientState::Connecting);
        self.attempts += 1;

        let attempt = self.connector.connect(&self.config.url);
        tokio::pin!(attempt);
        let result = loop {
            tokio::select! {
                result = &mut attempt => break result,
                command = self.commands.recv() => match command {
                    None => return Phase::Stop,
                    Some(Command::Disconnect) => return Phase::Idle,
                    Some(Command::Connect) => self.attempts = 1,
                    Some(Command::Subscribe(_) | Command::Unsubscribe(_)) => {}
                },
            }
        };

        match result {
            Ok(mut session) => {
                let replay: Vec<String> = self.desired.borrow().iter().cloned().collect();
                if !replay.is_empty() {
                    let request = ControlMessage::subscribe(replay);
                    if let Err(error) = session.send_control(&request).await {
                        warn!(%error, attempt = self.attempts, "subscription replay failed");
                        return self.after_failure();
                    }
                }
                self.attempts = 0;
                self.set_state(ClientState::Connected);
                Phase::Connected(session)
            }
            Err(error) => {
                warn!(%error, attempt = self.attempts, "connect attempt failed");
                self.after_failure()
            }
        }
    }

    fn after_failure(&self) -> Phase<C::Session> {
        if self.attempts >= self.config.max_attempts.max(1) {
            warn!(attempts = self.attempts, "reconnect attempts exhausted");
            Phase::Idle
        } else {
            Phase::Backoff
        }
    }

    async fn connected(&mut self, mut session: C::Session) -> Phase<C::Session> {
        let period = self.config.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                command = self.commands.recv() => Step::Command(command),
                _ = heartbeat.tick() => Step::Heartbeat,
                event = session.next_event() => Step::Event(event),
            };

            let outcome = match step {
                Step::Command(None) => {
                    session.close().await;
                    return Phase::Stop;
                }
                Step::Command(Some(Command::Disconnect)) => {
                    session.close().await;
                    return Phase::Idle;
                }
                Step::Command(Some(Command::Connect)) => Ok(()),
                Step::Command(Some(Command::Subscribe(symbols))) => {
                    session.send_control(&ControlMessage::subscribe(symbols)).await
                }
                Step::Command(Some(Command::Unsubscribe(symbols))) => {
                    session.send_control(&ControlMessage::unsubscribe(symbols)).await
                }
                Step::Heartbeat => session.heartbeat().await,
                Step::Event(Ok(Some(message))) => {
                    self.forward(message);
                    Ok(())
                }
                Step::Event(Ok(None)) => Err(ClientError::Closed),
                Step::Event(Err(error)) => Err(error),
            };

            if let Err(error) = outcome {
                warn!(%error, "session lost");
                return Phase::Backoff;
            }
        }
    }

    /// Never waits on the consumer; a full buffer drops the message.
    fn forward(&self, message: ServerMessage) {
        match self.events.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    buffer = self.config.event_buffer,
                    "event buffer full, dropping server message"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("event receiver dropped");
            }
        }
    }

    async fn backoff(&mut self) -> Phase<C::Session> {
        self.set_state(ClientState::Reconnecting);
        let delay = sleep(self.config.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => return Phase::Connecting,
                command = self.commands.recv() => match command {
                    None => return Phase::Stop,
                    Some(Command::Disconnect) => {
                        debug!("pending reconnect cancelled");
                        return Phase::Idle;
                    }
                    Some(Command::Connect) => {
                        self.attempts = 0;
                        return Phase::Connecting;
                    }
                    Some(Command::Subscribe(_) | Command::Unsubscribe(_)) => {}
                },
            }
        }
    }
}
