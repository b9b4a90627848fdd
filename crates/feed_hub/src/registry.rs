//! Connection registry and the subscription index.
//!
//! Each connection owns its set of symbols. The subscription index is the
//! union of those sets, kept as a per-symbol subscriber count so that the
//! hub can tell in O(1) when the last subscriber of a symbol goes away.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::connection::{Connection, ConnectionId, PushSink};
use crate::error::HubError;

/// Live connections and their subscriptions.
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with no subscriptions.
    pub fn register(&mut self, id: ConnectionId, sink: Arc<dyn PushSink>) -> Result<(), HubError> {
        if self.connections.contains_key(&id) {
            return Err(HubError::AlreadyRegistered(id));
        }
        self.connections.insert(id, Connection::new(id, sink));
        Ok(())
    }

    /// Add symbols to a connection. Returns the symbols that were newly added.
    ///
    /// Unknown ids are rejected rather than created, so a subscription can
    /// never exist without its connection.
    pub fn subscribe(
        &mut self,
        id: ConnectionId,
        symbols: &[String],
    ) -> Result<Vec<String>, HubError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(HubError::NotFound(id))?;

        let mut added = Vec::new();
        for symbol in symbols {
            if connection.symbols.insert(symbol.clone()) {
                *self.index.entry(symbol.clone()).or_insert(0) += 1;
                added.push(symbol.clone());
            }
        }
        Ok(added)
    }

    /// Remove symbols from a connection. Returns the symbols that lost
    /// their last subscriber.
    pub fn unsubscribe(
        &mut self,
        id: ConnectionId,
        symbols: &[String],
    ) -> Result<Vec<String>, HubError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(HubError::NotFound(id))?;

        let mut orphaned = Vec::new();
        for symbol in symbols {
            if connection.symbols.remove(symbol) && release(&mut self.index, symbol) {
                orphaned.push(symbol.clone());
            }
        }
        Ok(orphaned)
    }

    /// Remove a connection and all of its subscriptions.
    ///
    /// Returns the symbols that lost their last subscriber, or `None` if
    /// the id was not registered.
    pub fn deregister(&mut self, id: ConnectionId) -> Option<Vec<String>> {
        let connection = self.connections.remove(&id)?;
        Some(
            connection
                .symbols
                .iter()
                .filter(|symbol| release(&mut self.index, symbol))
                .cloned()
                .collect(),
        )
    }

    /// Whether the id is registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Symbols a connection is subscribed to
    pub fn subscriptions(&self, id: ConnectionId) -> Option<&HashSet<String>> {
        self.connections.get(&id).map(|c| &c.symbols)
    }

    /// Union of all subscriptions
    pub fn indexed_symbols(&self) -> impl Iterator<Item = &String> {
        self.index.keys()
    }

    /// Number of connections subscribed to `symbol`
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.index.get(symbol).copied().unwrap_or(0)
    }

    /// True when no connection is subscribed to anything
    pub fn index_is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of distinct subscribed symbols
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Iterate over live connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Drop everything; returns the number of connections removed
    pub fn clear(&mut self) -> usize {
        let count = self.connections.len();
        self.connections.clear();
        self.index.clear();
        count
    }
}

// Decrement a symbol's subscriber count; true when it reached zero.
fn release(index: &mut HashMap<String, usize>, symbol: &str) -> bool {
    match index.get_mut(symbol) {
        Some(count) if *count > 1 => {
            *count -= 1;
            false
        }
        Some(_) => {
            index.remove(symbol);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ChannelSink;

    fn sink() -> Arc<dyn PushSink> {
        let (sink, _rx) = ChannelSink::channel(1);
        Arc::new(sink)
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicate_subscription_is_idempotent() {
        let mut registry = Registry::new();
        let id = ConnectionId::new();
        registry.register(id, sink()).unwrap();

        registry.subscribe(id, &symbols(&["TCS"])).unwrap();
        let added = registry.subscribe(id, &symbols(&["TCS"])).unwrap();

        assert!(added.is_empty());
        assert_eq!(registry.subscriptions(id).unwrap().len(), 1);
        assert_eq!(registry.subscriber_count("TCS"), 1);
    }

    #[test]
    fn test_subscribe_unknown_connection_fails() {
        let mut registry = Registry::new();
        let id = ConnectionId::new();
        let err = registry.subscribe(id, &symbols(&["TCS"])).unwrap_err();
        assert_eq!(err, HubError::NotFound(id));
        assert!(registry.index_is_empty());
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = Registry::new();
        let id = ConnectionId::new();
        registry.register(id, sink()).unwrap();
        assert_eq!(
            registry.register(id, sink()),
            Err(HubError::AlreadyRegistered(id))
        );
    }

    #[test]
    fn test_index_is_union_with_counts() {
        let mut registry = Registry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.register(a, sink()).unwrap();
        registry.register(b, sink()).unwrap();

        registry.subscribe(a, &symbols(&["TCS", "INFY"])).unwrap();
        registry.subscribe(b, &symbols(&["TCS"])).unwrap();

        assert_eq!(registry.index_len(), 2);
        assert_eq!(registry.subscriber_count("TCS"), 2);

        let orphaned = registry.unsubscribe(a, &symbols(&["TCS", "INFY"])).unwrap();
        assert_eq!(orphaned, symbols(&["INFY"]));
        assert_eq!(registry.subscriber_count("TCS"), 1);
    }

    #[test]
    fn test_unsubscribe_missing_symbol_is_noop() {
        let mut registry = Registry::new();
        let id = ConnectionId::new();
        registry.register(id, sink()).unwrap();
        let orphaned = registry.unsubscribe(id, &symbols(&["SBIN"])).unwrap();
        assert!(orphaned.is_empty());
    }

    #[test]
    fn test_deregister_cascades_subscriptions() {
        let mut registry = Registry::new();
        let id = ConnectionId::new();
        registry.register(id, sink()).unwrap();
        registry.subscribe(id, &symbols(&["TCS", "ITC"])).unwrap();

        let mut orphaned = registry.deregister(id).unwrap();
        orphaned.sort();
        assert_eq!(orphaned, symbols(&["ITC", "TCS"]));
        assert!(registry.index_is_empty());
        assert!(!registry.contains(id));
        assert!(registry.deregister(id).is_none());
    }
}
