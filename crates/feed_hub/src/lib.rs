//! # feed_hub: Real-time distribution kernel
//!
//! ## Kernel Layer Role
//!
//! feed_hub sits between the price model in `feed_core` and the transport
//! in `feed_server`. It provides:
//! - The connection registry and subscription index (`registry`)
//! - The `{Stopped, Running}` broadcast timer (`scheduler`)
//! - Push sinks, the seam to any transport (`connection`)
//! - [`StreamHub`], the owned service instance that ties them together (`hub`)
//!
//! ## Concurrency
//!
//! All registry, subscription and symbol-state mutations go through one
//! async mutex, so a tick never observes a half-applied subscribe. Sends
//! happen outside that lock, each bounded by the configured timeout; a
//! failed or hung connection is deregistered after the tick and the other
//! connections are unaffected.
//!
//! ```rust,no_run
//! use feed_hub::{ChannelSink, HubConfig, StreamHub};
//! use feed_core::{SymbolDirectory, SynthesisParams};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), feed_hub::HubError> {
//! let hub = StreamHub::new(
//!     HubConfig::default(),
//!     SynthesisParams::default(),
//!     SymbolDirectory::default(),
//!     Some(42),
//! )?;
//! let (sink, mut updates) = ChannelSink::channel(64);
//! let id = hub.connect(Arc::new(sink)).await?;
//! hub.subscribe(id, ["TCS", "INFY"]).await?;
//!
//! while let Some(update) = updates.recv().await {
//!     println!("{} {:.2}", update.symbol, update.price);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod connection;
pub mod error;
pub mod hub;
pub mod registry;
pub mod scheduler;

pub use connection::{ChannelSink, Connection, ConnectionId, PushSink};
pub use error::{HubError, TransportError};
pub use hub::{HubConfig, HubStats, StreamHub, TickReport};
pub use registry::Registry;
pub use scheduler::{Scheduler, SchedulerState};
