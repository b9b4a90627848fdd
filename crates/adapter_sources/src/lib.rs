//! # adapter_sources: Upstream adapters for non-tick endpoints
//!
//! ## Adapter Layer Role
//!
//! adapter_sources turns unreliable upstream sources into always-available,
//! provenance-tagged payloads. It provides:
//! - A TTL cache that collapses concurrent misses into one fetch (`cache`)
//! - Provider strategies and the ordered fallback chain (`provider`)
//! - JSON-over-HTTP providers built on `reqwest` (`http`)
//! - Synthetic generators used as the last link of every chain (`synthetic`)
//! - The index snapshot and institutional flow services (`indices`, `flow`)
//!
//! ## Failure policy
//!
//! Upstream errors ([`SourceError`]) are logged and fall through to the next
//! provider; the synthetic fallback cannot fail, so the services never
//! return an upstream error. Only malformed caller input produces a
//! [`RequestError`].
//!
//! ## Upstream formats
//!
//! - Index endpoints return a JSON array of
//!   `{"name","value","change","changePercent"}` objects.
//! - Flow endpoints take `?date=YYYY-MM-DD` and return one
//!   `{"date","fii":{"buy","sell","net"},"dii":{...}}` object.

#![deny(missing_docs)]

pub mod cache;
pub mod error;
pub mod flow;
pub mod http;
pub mod indices;
pub mod provider;
pub mod synthetic;

pub use cache::{CacheRead, TtlCache};
pub use error::{RequestError, SourceError};
pub use flow::{FlowReport, FlowService};
pub use http::{http_client, HttpProvider, HttpQuery};
pub use indices::IndexSnapshotService;
pub use provider::{Fallback, Fetched, Provider, ProviderChain};
pub use synthetic::{SyntheticFlow, SyntheticIndices};

use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Build a `primary → mirror → fallback` chain, skipping absent URLs.
pub fn http_chain<K, T>(
    primary_url: Option<&str>,
    mirror_url: Option<&str>,
    client: &reqwest::Client,
    fallback: Arc<dyn Fallback<K, T>>,
) -> ProviderChain<K, T>
where
    K: HttpQuery + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let mut chain = ProviderChain::new(fallback);
    if let Some(url) = primary_url {
        chain = chain.with_provider(Arc::new(HttpProvider::<T>::primary(url, client.clone())));
    }
    if let Some(url) = mirror_url {
        chain = chain.with_provider(Arc::new(HttpProvider::<T>::mirror(url, client.clone())));
    }
    chain
}
