//! JSON-over-HTTP upstream providers.

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_core::Provenance;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;

use crate::error::SourceError;
use crate::provider::Provider;

/// Query parameters a key contributes to an upstream request.
pub trait HttpQuery {
    /// `(name, value)` pairs appended to the URL
    fn query(&self) -> Vec<(&'static str, String)>;
}

impl HttpQuery for () {
    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl HttpQuery for NaiveDate {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("date", self.format("%Y-%m-%d").to_string())]
    }
}

/// Build the shared client with a per-request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tickstream/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// GETs `url` with the key's query and decodes the JSON body as `T`.
pub struct HttpProvider<T> {
    name: String,
    url: String,
    provenance: Provenance,
    client: reqwest::Client,
    _payload: PhantomData<fn() -> T>,
}

impl<T> HttpProvider<T> {
    /// Create a provider
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        provenance: Provenance,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            provenance,
            client,
            _payload: PhantomData,
        }
    }

    /// Primary endpoint, tagged `live`
    pub fn primary(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self::new("primary", url, Provenance::Live, client)
    }

    /// Secondary mirror, tagged `live-cached`
    pub fn mirror(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self::new("mirror", url, Provenance::LiveCached, client)
    }

    /// Upstream URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<K, T> Provider<K, T> for HttpProvider<T>
where
    K: HttpQuery + Sync,
    T: DeserializeOwned + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn provenance(&self) -> Provenance {
        self.provenance
    }

    async fn fetch(&self, key: &K) -> Result<T, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .query(&key.query())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}
