//! Provider strategies and the ordered fallback chain.

use async_trait::async_trait;
use feed_core::Provenance;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::SourceError;

/// A fallible upstream source for values of type `T` keyed by `K`.
#[async_trait]
pub trait Provider<K: Sync, T: Send>: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Tag attached to values this provider returns
    fn provenance(&self) -> Provenance;

    /// Fetch the value for `key`
    async fn fetch(&self, key: &K) -> Result<T, SourceError>;
}

/// Last resort of a chain. Cannot fail.
pub trait Fallback<K, T>: Send + Sync {
    /// Produce a synthetic value for `key`
    fn generate(&self, key: &K) -> T;
}

/// Value returned by a chain together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    /// Payload
    pub value: T,
    /// Provenance tag
    pub provenance: Provenance,
    /// Name of the provider that produced it
    pub source: String,
}

/// Ordered list of providers ending in an infallible fallback.
pub struct ProviderChain<K: Sync, T: Send> {
    providers: Vec<Arc<dyn Provider<K, T>>>,
    fallback: Arc<dyn Fallback<K, T>>,
}

impl<K: Sync, T: Send> ProviderChain<K, T> {
    /// Chain with no providers; every fetch is served by `fallback`
    pub fn new(fallback: Arc<dyn Fallback<K, T>>) -> Self {
        Self {
            providers: Vec::new(),
            fallback,
        }
    }

    /// Append a provider after the existing ones
    pub fn with_provider(mut self, provider: Arc<dyn Provider<K, T>>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Names of the providers in order, fallback excluded
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Try each provider in order and return the first success, or the
    /// fallback value if all of them fail.
    pub async fn first_success(&self, key: &K) -> Fetched<T> {
        for provider in &self.providers {
            match provider.fetch(key).await {
                Ok(value) => {
                    return Fetched {
                        value,
                        provenance: provider.provenance(),
                        source: provider.name().to_string(),
                    }
                }
                Err(error) => {
                    warn!(provider = provider.name(), %error, "provider failed, trying next");
                }
            }
        }

        info!(provenance = %Provenance::FallbackSample, "serving synthetic fallback");
        Fetched {
            value: self.fallback.generate(key),
            provenance: Provenance::FallbackSample,
            source: "synthetic".to_string(),
        }
    }
}
