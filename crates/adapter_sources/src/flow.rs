//! Institutional (FII/DII) flow, cached per session date.

use chrono::NaiveDate;
use feed_core::clock::{is_weekday, weekdays_ending};
use feed_core::{FlowDay, Provenance};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::cache::{CacheRead, TtlCache};
use crate::error::RequestError;
use crate::provider::ProviderChain;

/// Period tokens and the number of sessions they cover
pub const PERIODS: [(&str, usize); 5] = [("1D", 1), ("1W", 5), ("2W", 10), ("1M", 22), ("3M", 66)];

/// Number of sessions covered by a period token (case-insensitive).
///
/// ```
/// use adapter_sources::flow::period_days;
///
/// assert_eq!(period_days("1w").unwrap(), 5);
/// assert!(period_days("6M").is_err());
/// ```
pub fn period_days(token: &str) -> Result<usize, RequestError> {
    let token = token.trim();
    PERIODS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, days)| *days)
        .ok_or_else(|| RequestError::InvalidPeriod(token.to_string()))
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| RequestError::InvalidDate(raw.to_string()))
}

/// Flow over a period, most recent session first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    /// Normalised period token
    pub period: String,
    /// Sessions per day, newest first
    pub data: Vec<FlowDay>,
    /// Least trustworthy provenance among the days
    pub provenance: Provenance,
    /// True when every day came from the cache
    pub cached: bool,
}

/// Read-through flow service.
pub struct FlowService {
    chain: ProviderChain<NaiveDate, FlowDay>,
    cache: TtlCache<NaiveDate, FlowDay>,
}

impl FlowService {
    /// Create the service over a provider chain
    pub fn new(chain: ProviderChain<NaiveDate, FlowDay>, ttl: Duration) -> Self {
        Self {
            chain,
            cache: TtlCache::new(ttl),
        }
    }

    /// Flow for the sessions of `period` ending on or before `today`.
    pub async fn flow(&self, period: &str, today: NaiveDate) -> Result<FlowReport, RequestError> {
        let days = period_days(period)?;
        let mut dates = weekdays_ending(today, days);
        dates.reverse();

        let reads = join_all(dates.into_iter().map(|date| self.day(date))).await;
        Ok(FlowReport {
            period: period.trim().to_ascii_uppercase(),
            provenance: weakest(reads.iter().map(|r| r.provenance)),
            cached: reads.iter().all(|r| r.cached),
            data: reads.iter().map(|r| r.value.as_ref().clone()).collect(),
        })
    }

    /// Cached flow for a single session.
    pub async fn day(&self, date: NaiveDate) -> CacheRead<FlowDay> {
        self.cache
            .get_or_fetch(date, || async move {
                let fetched = self.chain.first_success(&date).await;
                (fetched.value, fetched.provenance)
            })
            .await
    }

    /// Drop and re-fetch one session.
    ///
    /// Weekends and dates after `today` have no session and are reported
    /// as not found.
    pub async fn refresh_date(
        &self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<CacheRead<FlowDay>, RequestError> {
        if !is_weekday(date) || date > today {
            return Err(RequestError::NotFound(date.to_string()));
        }
        self.cache.invalidate(&date).await;
        let read = self.day(date).await;
        info!(%date, provenance = %read.provenance, "flow refreshed");
        Ok(read)
    }

    /// Drop every cached session. Returns the number dropped.
    pub async fn refresh_all(&self) -> usize {
        let dropped = self.cache.invalidate_all().await;
        info!(dropped, "flow cache cleared");
        dropped
    }
}

fn weakest(tags: impl Iterator<Item = Provenance>) -> Provenance {
    tags.max_by_key(|tag| match tag {
        Provenance::Live => 0,
        Provenance::LiveCached => 1,
        Provenance::FallbackSample => 2,
    })
    .unwrap_or(Provenance::Live)
}
