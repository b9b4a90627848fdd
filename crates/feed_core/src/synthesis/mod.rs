//! Stochastic price synthesis.
//!
//! ## Models
//!
//! - [`SynthesisEngine`]: per-symbol tick model used by the streaming feed.
//!   Each step mixes a uniform shock with a slowly decaying trend and is
//!   scaled by how long the symbol went without an update.
//! - [`BarGenerator`]: one-shot daily OHLCV series built from the same
//!   shock/trend mix, used for historical bar requests.
//!
//! Both models clamp prices at `floor_ratio × base` so that a long run of
//! negative shocks cannot collapse a synthetic price.

mod bars;
mod model;

pub use bars::BarGenerator;
pub use model::{SymbolState, SynthesisEngine, SynthesisParams};
