//! # feed_core: Foundation types for the tickstream feed
//!
//! ## Core Layer Role
//!
//! feed_core is the bottom layer of the workspace and has no dependency on
//! any other tickstream crate. It provides:
//! - Wire types shared by the server and the client (`wire`)
//! - Market data value types: `PriceUpdate`, `Bar`, `IndexQuote`, `FlowDay` (`types`)
//! - The stochastic price model and the batch bar generator (`synthesis`)
//! - Symbol normalisation and base prices (`symbols`)
//! - The exchange trading-window clock (`clock`)
//!
//! ## Reproducibility
//!
//! Every random draw goes through an injected `rand::Rng`. Seeding the
//! engine with [`SynthesisEngine::with_seed`] makes a run repeatable:
//!
//! ```rust
//! use feed_core::synthesis::{SynthesisEngine, SynthesisParams};
//! use std::time::Duration;
//!
//! let mut a = SynthesisEngine::with_seed(SynthesisParams::default(), 7);
//! let mut b = SynthesisEngine::with_seed(SynthesisParams::default(), 7);
//!
//! let mut sa = a.new_state("TCS", 3900.0).unwrap();
//! let mut sb = b.new_state("TCS", 3900.0).unwrap();
//! let ua = a.step(&mut sa, Duration::from_secs(2));
//! let ub = b.step(&mut sb, Duration::from_secs(2));
//! assert_eq!(ua.price, ub.price);
//! ```

#![deny(missing_docs)]

pub mod clock;
pub mod error;
pub mod symbols;
pub mod synthesis;
pub mod types;
pub mod wire;

pub use clock::ExchangeClock;
pub use error::CoreError;
pub use symbols::{normalize_symbol, symbol_hash, SymbolDirectory};
pub use synthesis::{BarGenerator, SymbolState, SynthesisEngine, SynthesisParams};
pub use types::{Bar, FlowDay, FlowLeg, IndexQuote, PriceUpdate, Provenance};
