//! The stream hub: one owned service instance that serialises every
//! registry mutation with the broadcast tick.

use feed_core::{
    normalize_symbol, CoreError, PriceUpdate, SymbolDirectory, SymbolState, SynthesisEngine,
    SynthesisParams,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::connection::{ConnectionId, PushSink};
use crate::error::{HubError, TransportError};
use crate::registry::Registry;
use crate::scheduler::Scheduler;

/// Timing knobs of the hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Broadcast period
    pub tick_interval: Duration,
    /// Upper bound on a single delivery
    pub send_timeout: Duration,
    /// How long an unsubscribed symbol keeps its price state
    pub symbol_idle_eviction: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            send_timeout: Duration::from_millis(250),
            symbol_idle_eviction: Duration::from_secs(600),
        }
    }
}

/// Outcome of one broadcast tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Symbols stepped (once each)
    pub symbols_stepped: usize,
    /// Updates delivered across all connections
    pub delivered: usize,
    /// Connections dropped because delivery failed
    pub failed: Vec<ConnectionId>,
}

/// Point-in-time counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    /// Live connections
    pub connections: usize,
    /// Symbols with at least one subscriber
    pub subscribed_symbols: usize,
    /// Symbols with price state, subscribed or idle
    pub tracked_symbols: usize,
    /// Whether the broadcast timer is running
    pub scheduler_running: bool,
    /// Number of times the timer has been started
    pub scheduler_starts: u64,
}

struct TrackedSymbol {
    state: SymbolState,
    idle_since: Option<Instant>,
}

struct HubState {
    registry: Registry,
    symbols: HashMap<String, TrackedSymbol>,
    engine: SynthesisEngine,
    scheduler: Scheduler,
    closed: bool,
}

impl HubState {
    fn ensure_open(&self) -> Result<(), HubError> {
        if self.closed {
            Err(HubError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn mark_idle(&mut self, orphaned: &[String], now: Instant) {
        for symbol in orphaned {
            if let Some(tracked) = self.symbols.get_mut(symbol) {
                tracked.idle_since = Some(now);
            }
        }
    }

    fn evict_idle(&mut self, now: Instant, after: Duration) {
        let before = self.symbols.len();
        self.symbols.retain(|_, tracked| {
            tracked
                .idle_since
                .map_or(true, |since| now.duration_since(since) < after)
        });
        let evicted = before - self.symbols.len();
        if evicted > 0 {
            debug!(evicted, "evicted idle symbol state");
        }
    }

    fn stop_if_idle(&mut self) {
        if self.scheduler.maybe_stop(self.registry.index_is_empty()) {
            info!("broadcast scheduler stopped");
        }
    }
}

struct Shared {
    config: HubConfig,
    directory: SymbolDirectory,
    state: Mutex<HubState>,
}

/// Cloneable handle to the distribution service.
///
/// Every clone refers to the same registry, symbol state and timer.
/// Independent instances share nothing, so tests can run several side
/// by side.
#[derive(Clone)]
pub struct StreamHub {
    shared: Arc<Shared>,
}

impl StreamHub {
    /// Create a hub. With `seed` the price paths are reproducible.
    pub fn new(
        config: HubConfig,
        params: SynthesisParams,
        directory: SymbolDirectory,
        seed: Option<u64>,
    ) -> Result<Self, HubError> {
        params.validate()?;
        if config.tick_interval.is_zero() {
            return Err(CoreError::parameter("tick_interval", "must be non-zero").into());
        }
        let engine = match seed {
            Some(seed) => SynthesisEngine::with_seed(params, seed),
            None => SynthesisEngine::from_entropy(params),
        };

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                directory,
                state: Mutex::new(HubState {
                    registry: Registry::new(),
                    symbols: HashMap::new(),
                    engine,
                    scheduler: Scheduler::new(),
                    closed: false,
                }),
            }),
        })
    }

    /// Hub timing configuration
    pub fn config(&self) -> &HubConfig {
        &self.shared.config
    }

    /// Symbol base prices
    pub fn directory(&self) -> &SymbolDirectory {
        &self.shared.directory
    }

    /// Register a new connection under a fresh id.
    pub async fn connect(&self, sink: Arc<dyn PushSink>) -> Result<ConnectionId, HubError> {
        let id = ConnectionId::new();
        self.register(id, sink).await?;
        Ok(id)
    }

    /// Register a connection under a caller-chosen id.
    pub async fn register(
        &self,
        id: ConnectionId,
        sink: Arc<dyn PushSink>,
    ) -> Result<(), HubError> {
        let mut state = self.shared.state.lock().await;
        state.ensure_open()?;
        state.registry.register(id, sink)?;
        debug!(connection_id = %id, "connection registered");
        Ok(())
    }

    /// Subscribe a connection to symbols. Returns the normalised symbols
    /// that were newly added.
    ///
    /// The first subscription that makes the index non-empty starts the
    /// broadcast timer.
    pub async fn subscribe<I, S>(
        &self,
        id: ConnectionId,
        symbols: I,
    ) -> Result<Vec<String>, HubError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = normalize_all(symbols)?;
        let now = Instant::now();

        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        state.ensure_open()?;
        if !state.registry.contains(id) {
            return Err(HubError::NotFound(id));
        }
        state.evict_idle(now, self.shared.config.symbol_idle_eviction);

        for symbol in &symbols {
            match state.symbols.get_mut(symbol) {
                Some(tracked) => tracked.idle_since = None,
                None => {
                    let base = self.shared.directory.base_price(symbol);
                    let symbol_state = state.engine.new_state_at(symbol, base, now.into_std())?;
                    state.symbols.insert(
                        symbol.clone(),
                        TrackedSymbol {
                            state: symbol_state,
                            idle_since: None,
                        },
                    );
                }
            }
        }

        let added = state.registry.subscribe(id, &symbols)?;
        debug!(connection_id = %id, symbols = ?added, "subscribed");

        if !state.registry.index_is_empty() {
            let shared = &self.shared;
            if state.scheduler.start(|| spawn_ticker(shared)) {
                info!(
                    period_ms = shared.config.tick_interval.as_millis() as u64,
                    "broadcast scheduler started"
                );
            }
        }
        Ok(added)
    }

    /// Unsubscribe a connection from symbols. Returns the normalised
    /// symbols that lost their last subscriber.
    pub async fn unsubscribe<I, S>(
        &self,
        id: ConnectionId,
        symbols: I,
    ) -> Result<Vec<String>, HubError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = normalize_all(symbols)?;
        let now = Instant::now();

        let mut state = self.shared.state.lock().await;
        state.ensure_open()?;
        let orphaned = state.registry.unsubscribe(id, &symbols)?;
        debug!(connection_id = %id, symbols = ?symbols, "unsubscribed");

        state.mark_idle(&orphaned, now);
        state.stop_if_idle();
        Ok(orphaned)
    }

    /// Remove a connection. Returns `false` if it was not registered.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut state = self.shared.state.lock().await;
        match state.registry.deregister(id) {
            Some(orphaned) => {
                debug!(connection_id = %id, "connection deregistered");
                state.mark_idle(&orphaned, Instant::now());
                state.stop_if_idle();
                true
            }
            None => false,
        }
    }

    /// Run one broadcast tick.
    ///
    /// Each subscribed symbol is stepped exactly once under the lock. The
    /// lock is released while sending; every send is bounded by the send
    /// timeout, and connections whose delivery failed are deregistered
    /// afterwards.
    pub async fn tick_once(&self) -> TickReport {
        let send_timeout = self.shared.config.send_timeout;
        let now = Instant::now();

        let (symbols_stepped, batches) = {
            let mut guard = self.shared.state.lock().await;
            let state = &mut *guard;
            if state.closed {
                return TickReport::default();
            }
            state.evict_idle(now, self.shared.config.symbol_idle_eviction);

            let mut updates: HashMap<&str, PriceUpdate> = HashMap::new();
            for symbol in state.registry.indexed_symbols() {
                if let Some(tracked) = state.symbols.get_mut(symbol) {
                    let update = state.engine.step_at(&mut tracked.state, now.into_std());
                    updates.insert(symbol.as_str(), update);
                }
            }

            let batches: Vec<(ConnectionId, Arc<dyn PushSink>, Vec<PriceUpdate>)> = state
                .registry
                .connections()
                .filter_map(|connection| {
                    let payload: Vec<PriceUpdate> = connection
                        .symbols
                        .iter()
                        .filter_map(|symbol| updates.get(symbol.as_str()).cloned())
                        .collect();
                    (!payload.is_empty()).then(|| (connection.id, connection.sink.clone(), payload))
                })
                .collect();
            (updates.len(), batches)
        };

        let outcomes = join_all(batches.into_iter().map(|(id, sink, payload)| async move {
            for update in &payload {
                let result = match timeout(send_timeout, sink.send(update)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout),
                };
                if let Err(error) = result {
                    return (id, Err(error));
                }
            }
            (id, Ok(payload.len()))
        }))
        .await;

        let mut report = TickReport {
            symbols_stepped,
            ..TickReport::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(count) => report.delivered += count,
                Err(error) => {
                    warn!(connection_id = %id, %error, "delivery failed, dropping connection");
                    report.failed.push(id);
                }
            }
        }

        if !report.failed.is_empty() {
            let mut state = self.shared.state.lock().await;
            let now = Instant::now();
            for id in &report.failed {
                if let Some(orphaned) = state.registry.deregister(*id) {
                    state.mark_idle(&orphaned, now);
                }
            }
            state.stop_if_idle();
        }
        report
    }

    /// Stop the timer and drop every connection. Later registrations fail
    /// with [`HubError::ShutDown`]. Returns the number of connections closed.
    pub async fn shutdown(&self) -> usize {
        let mut state = self.shared.state.lock().await;
        state.closed = true;
        state.scheduler.stop();
        state.symbols.clear();
        let closed = state.registry.clear();
        info!(connections = closed, "stream hub shut down");
        closed
    }

    /// Current counters
    pub async fn stats(&self) -> HubStats {
        let state = self.shared.state.lock().await;
        HubStats {
            connections: state.registry.connection_count(),
            subscribed_symbols: state.registry.index_len(),
            tracked_symbols: state.symbols.len(),
            scheduler_running: state.scheduler.is_running(),
            scheduler_starts: state.scheduler.starts(),
        }
    }

    /// Sorted subscriptions of a connection
    pub async fn subscriptions(&self, id: ConnectionId) -> Option<Vec<String>> {
        let state = self.shared.state.lock().await;
        state.registry.subscriptions(id).map(|symbols| {
            let mut symbols: Vec<String> = symbols.iter().cloned().collect();
            symbols.sort();
            symbols
        })
    }

    /// Whether the broadcast timer is running
    pub async fn scheduler_running(&self) -> bool {
        self.shared.state.lock().await.scheduler.is_running()
    }

    /// Whether the hub has been shut down
    pub async fn is_closed(&self) -> bool {
        self.shared.state.lock().await.closed
    }
}

fn normalize_all<I, S>(symbols: I) -> Result<Vec<String>, HubError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let symbols = symbols
        .into_iter()
        .map(|symbol| normalize_symbol(symbol.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    if symbols.is_empty() {
        return Err(HubError::EmptySymbols);
    }
    Ok(symbols)
}

// The task holds a weak reference so a forgotten hub does not keep ticking.
fn spawn_ticker(shared: &Arc<Shared>) -> JoinHandle<()> {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    let period = shared.config.tick_interval;

    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(shared) = weak.upgrade() else {
                break;
            };
            let report = StreamHub { shared }.tick_once().await;
            debug!(
                symbols = report.symbols_stepped,
                delivered = report.delivered,
                failed = report.failed.len(),
                "tick"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ChannelSink;

    fn hub() -> StreamHub {
        StreamHub::new(
            HubConfig::default(),
            SynthesisParams::default(),
            SymbolDirectory::default(),
            Some(7),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_normalises_symbols() {
        let hub = hub();
        let (sink, _rx) = ChannelSink::channel(8);
        let id = hub.connect(Arc::new(sink)).await.unwrap();

        let added = hub.subscribe(id, [" tcs ", "TCS", "infy"]).await.unwrap();
        assert_eq!(added, vec!["TCS".to_string(), "INFY".to_string()]);
        assert_eq!(hub.subscriptions(id).await.unwrap(), vec!["INFY", "TCS"]);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_input() {
        let hub = hub();
        let (sink, _rx) = ChannelSink::channel(8);
        let id = hub.connect(Arc::new(sink)).await.unwrap();

        let empty: [&str; 0] = [];
        assert_eq!(hub.subscribe(id, empty).await, Err(HubError::EmptySymbols));
        assert!(hub.subscribe(id, ["<bad>"]).await.unwrap_err().is_validation());
        assert!(!hub.scheduler_running().await);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_connection() {
        let hub = hub();
        let id = ConnectionId::new();
        assert_eq!(hub.subscribe(id, ["TCS"]).await, Err(HubError::NotFound(id)));
        assert_eq!(hub.stats().await.tracked_symbols, 0);
    }

    #[tokio::test]
    async fn test_zero_tick_interval_rejected() {
        let config = HubConfig {
            tick_interval: Duration::ZERO,
            ..HubConfig::default()
        };
        let result = StreamHub::new(
            config,
            SynthesisParams::default(),
            SymbolDirectory::default(),
            None,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_connections() {
        let hub = hub();
        let (sink, _rx) = ChannelSink::channel(8);
        let id = hub.connect(Arc::new(sink)).await.unwrap();
        hub.subscribe(id, ["TCS"]).await.unwrap();

        assert_eq!(hub.shutdown().await, 1);
        assert!(!hub.scheduler_running().await);

        let (sink, _rx) = ChannelSink::channel(8);
        assert_eq!(hub.connect(Arc::new(sink)).await, Err(HubError::ShutDown));
        assert_eq!(hub.tick_once().await, TickReport::default());
    }

    #[tokio::test]
    async fn test_disconnect_unknown_is_noop() {
        let hub = hub();
        assert!(!hub.disconnect(ConnectionId::new()).await);
    }
}
