//! Cached index snapshot.

use feed_core::IndexQuote;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheRead, TtlCache};
use crate::provider::ProviderChain;

/// Read-through snapshot of the headline indices.
pub struct IndexSnapshotService {
    chain: ProviderChain<(), Vec<IndexQuote>>,
    cache: TtlCache<(), Vec<IndexQuote>>,
}

impl IndexSnapshotService {
    /// Create the service over a provider chain
    pub fn new(chain: ProviderChain<(), Vec<IndexQuote>>, ttl: Duration) -> Self {
        Self {
            chain,
            cache: TtlCache::new(ttl),
        }
    }

    /// Current snapshot, fetched through the chain on a miss.
    pub async fn snapshot(&self) -> CacheRead<Vec<IndexQuote>> {
        let read = self
            .cache
            .get_or_fetch((), || async {
                let fetched = self.chain.first_success(&()).await;
                (fetched.value, fetched.provenance)
            })
            .await;
        debug!(cached = read.cached, provenance = %read.provenance, "index snapshot");
        read
    }

    /// Drop the cached snapshot and fetch a new one.
    pub async fn refresh(&self) -> CacheRead<Vec<IndexQuote>> {
        self.cache.invalidate(&()).await;
        self.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticIndices;
    use feed_core::{Provenance, SymbolDirectory};
    use std::sync::Arc;

    fn service() -> IndexSnapshotService {
        let fallback = SyntheticIndices::new(&SymbolDirectory::default(), 0.005);
        IndexSnapshotService::new(
            ProviderChain::new(Arc::new(fallback)),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_fallback_snapshot_is_cached() {
        let service = service();
        let first = service.snapshot().await;
        assert_eq!(first.provenance, Provenance::FallbackSample);
        assert!(!first.cached);

        let second = service.snapshot().await;
        assert!(second.cached);
        assert_eq!(second.value, first.value);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let service = service();
        service.snapshot().await;
        let refreshed = service.refresh().await;
        assert!(!refreshed.cached);
    }
}
