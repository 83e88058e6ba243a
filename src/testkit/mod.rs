//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! - [`stream`]: mock [`MarketDataStream`](crate::exchange::MarketDataStream)
//!   implementations, `ScriptedStream` and `ChannelStream`.
//! - [`executor`]: `RecordingExecutor`, a scripted execution client.
//! - [`domain`]: builders for tokens, markets and events.

pub mod domain;
pub mod executor;
pub mod stream;
