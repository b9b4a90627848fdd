//! Market data value types.
//!
//! All types serialise with camelCase field names, matching what browser
//! clients of the feed expect.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One synthesised price tick for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    /// Normalised symbol
    pub symbol: String,
    /// Current price
    pub price: f64,
    /// Absolute change against the base price
    pub change: f64,
    /// Percentage change against the base price
    pub change_percent: f64,
    /// Synthetic traded volume for the interval
    pub volume: u64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    /// Session date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Session high
    pub high: f64,
    /// Session low
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
}

/// Snapshot of a single market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuote {
    /// Index name, e.g. `NIFTY 50`
    pub name: String,
    /// Index level
    pub value: f64,
    /// Absolute change on the day
    pub change: f64,
    /// Percentage change on the day
    pub change_percent: f64,
}

/// Buy/sell/net amounts for one participant class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLeg {
    /// Gross purchases (crore)
    pub buy: f64,
    /// Gross sales (crore)
    pub sell: f64,
    /// `buy - sell`
    pub net: f64,
}

impl FlowLeg {
    /// Build a leg, deriving `net` from `buy` and `sell`.
    pub fn new(buy: f64, sell: f64) -> Self {
        Self {
            buy,
            sell,
            net: buy - sell,
        }
    }
}

/// Institutional flow for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDay {
    /// Session date
    pub date: NaiveDate,
    /// Foreign institutional investors
    pub fii: FlowLeg,
    /// Domestic institutional investors
    pub dii: FlowLeg,
}

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Primary upstream endpoint
    #[serde(rename = "live")]
    Live,
    /// Secondary mirror of the live data
    #[serde(rename = "live-cached")]
    LiveCached,
    /// Synthetic sample produced locally
    #[serde(rename = "fallback-sample")]
    FallbackSample,
}

impl Provenance {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::LiveCached => "live-cached",
            Provenance::FallbackSample => "fallback-sample",
        }
    }

    /// True for synthetic data
    pub fn is_fallback(&self) -> bool {
        matches!(self, Provenance::FallbackSample)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
