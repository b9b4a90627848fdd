//! Per-symbol tick model.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::CoreError;
use crate::types::PriceUpdate;

/// Parameters of the tick model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    /// Fraction of price moved by a unit shock (v)
    pub volatility: f64,
    /// Weight of the trend relative to the shock (k)
    pub trend_weight: f64,
    /// Elapsed time at which a step reaches full size
    #[serde(with = "duration_ms", rename = "cap_window_ms")]
    pub cap_window: Duration,
    /// Probability per step that the trend reverses
    pub trend_flip_probability: f64,
    /// Multiplicative decay applied to the trend when it does not reverse
    pub trend_decay: f64,
    /// Price floor as a fraction of base
    pub floor_ratio: f64,
    /// Inclusive lower bound of synthetic volume
    pub volume_min: u64,
    /// Inclusive upper bound of synthetic volume
    pub volume_max: u64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            volatility: 0.0005,
            trend_weight: 0.3,
            cap_window: Duration::from_secs(5),
            trend_flip_probability: 0.05,
            trend_decay: 0.95,
            floor_ratio: 0.95,
            volume_min: 10_000,
            volume_max: 1_000_000,
        }
    }
}

impl SynthesisParams {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.volatility.is_finite() && self.volatility > 0.0) {
            return Err(CoreError::parameter("volatility", "must be positive"));
        }
        if !(self.trend_weight.is_finite() && self.trend_weight >= 0.0) {
            return Err(CoreError::parameter("trend_weight", "must be non-negative"));
        }
        if self.cap_window.is_zero() {
            return Err(CoreError::parameter("cap_window", "must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.trend_flip_probability) {
            return Err(CoreError::parameter(
                "trend_flip_probability",
                "must lie in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.trend_decay) {
            return Err(CoreError::parameter("trend_decay", "must lie in [0, 1]"));
        }
        if !(self.floor_ratio > 0.0 && self.floor_ratio <= 1.0) {
            return Err(CoreError::parameter("floor_ratio", "must lie in (0, 1]"));
        }
        if self.volume_min > self.volume_max {
            return Err(CoreError::parameter(
                "volume_min",
                format!("{} exceeds volume_max {}", self.volume_min, self.volume_max),
            ));
        }
        Ok(())
    }

    /// Largest relative move a single step can produce: `v × (1 + k)`.
    pub fn max_step_fraction(&self) -> f64 {
        self.volatility * (1.0 + self.trend_weight)
    }
}

/// Evolving price state of one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolState {
    /// Normalised symbol
    pub symbol: String,
    /// Current price
    pub price: f64,
    /// Reference price; change is reported against it
    pub base: f64,
    /// Signed trend in [-1, 1]
    pub trend: f64,
    /// When the state was last stepped
    pub last_evaluated: Instant,
}

impl SymbolState {
    /// Price floor implied by `floor_ratio`
    pub fn floor(&self, floor_ratio: f64) -> f64 {
        self.base * floor_ratio
    }
}

/// Tick generator with an injected random source.
pub struct SynthesisEngine<R = StdRng> {
    params: SynthesisParams,
    rng: R,
}

impl SynthesisEngine<StdRng> {
    /// Deterministic engine
    pub fn with_seed(params: SynthesisParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    /// Engine seeded from OS entropy
    pub fn from_entropy(params: SynthesisParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }
}

impl<R: Rng> SynthesisEngine<R> {
    /// Engine over any random source
    pub fn with_rng(params: SynthesisParams, rng: R) -> Self {
        Self { params, rng }
    }

    /// Model parameters
    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    /// Create the state of a newly subscribed symbol, evaluated now.
    pub fn new_state(&mut self, symbol: &str, base: f64) -> Result<SymbolState, CoreError> {
        self.new_state_at(symbol, base, Instant::now())
    }

    /// Create the state of a newly subscribed symbol evaluated at `now`.
    ///
    /// The price starts at `base` and the trend is drawn from U[-1, 1].
    pub fn new_state_at(
        &mut self,
        symbol: &str,
        base: f64,
        now: Instant,
    ) -> Result<SymbolState, CoreError> {
        if !(base.is_finite() && base > 0.0) {
            return Err(CoreError::parameter(
                "base",
                format!("{symbol}: base price {base} must be positive"),
            ));
        }
        Ok(SymbolState {
            symbol: symbol.to_string(),
            price: base,
            base,
            trend: self.rng.gen_range(-1.0..=1.0),
            last_evaluated: now,
        })
    }

    /// Step the state by the time since it was last evaluated.
    pub fn step_at(&mut self, state: &mut SymbolState, now: Instant) -> PriceUpdate {
        let elapsed = now.saturating_duration_since(state.last_evaluated);
        let update = self.step(state, elapsed);
        state.last_evaluated = now;
        update
    }

    /// Advance `state` by one tick covering `elapsed`.
    ///
    /// `delta = price × v × (u + trend × k) × min(elapsed / cap, 1)` with
    /// `u ~ U[-1, 1]`; the new price is clamped at the floor.
    pub fn step(&mut self, state: &mut SymbolState, elapsed: Duration) -> PriceUpdate {
        let p = &self.params;
        let shock: f64 = self.rng.gen_range(-1.0..=1.0);
        let decay = (elapsed.as_secs_f64() / p.cap_window.as_secs_f64()).min(1.0);

        let delta = state.price * p.volatility * (shock + state.trend * p.trend_weight) * decay;
        state.price = (state.price + delta).max(state.floor(p.floor_ratio));
        state.trend = evolve_trend(&mut self.rng, state.trend, p);

        let change = state.price - state.base;
        PriceUpdate {
            symbol: state.symbol.clone(),
            price: state.price,
            change,
            change_percent: change / state.base * 100.0,
            volume: self.rng.gen_range(p.volume_min..=p.volume_max),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Reverse with probability `p_flip` (redrawing the magnitude from (0, 1]),
/// otherwise decay toward zero.
pub(crate) fn evolve_trend<R: Rng>(rng: &mut R, trend: f64, params: &SynthesisParams) -> f64 {
    if rng.gen_bool(params.trend_flip_probability) {
        let magnitude: f64 = rng.gen_range(f64::EPSILON..=1.0);
        if trend >= 0.0 {
            -magnitude
        } else {
            magnitude
        }
    } else {
        (trend * params.trend_decay).clamp(-1.0, 1.0)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
