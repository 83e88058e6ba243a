//! Polymarket venue adapters.
//!
//! - [`websocket`]: order-book channel as a [`MarketDataStream`](crate::exchange::MarketDataStream)
//! - [`message`]: wire format for that channel
//! - [`discovery`]: Gamma REST market discovery
//! - `executor`: CLOB order execution (requires the `polymarket` feature)

pub mod discovery;
pub mod message;
pub mod websocket;

#[cfg(feature = "polymarket")]
pub mod executor;

pub use discovery::{GammaClient, GammaMarket};
pub use websocket::PolymarketDataStream;

#[cfg(feature = "polymarket")]
pub use executor::PolymarketExecutor;
