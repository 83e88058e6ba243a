//! Twinleg - Yes/No complement arbitrage for binary prediction markets.
//!
//! A binary market's Yes and No tokens pay out 1.0 between them at
//! resolution. When the best asks of both sides sum to less than
//! `1 - threshold`, buying both locks in the difference. This crate streams
//! order-book prices, keeps the latest best ask per side, detects those
//! windows, and buys both legs concurrently, hedging when only one fills.
//!
//! # Modules
//!
//! - [`domain`] - Token mapping, price ledger, detection, order legs and reports
//! - [`exchange`] - Streaming and execution traits, reconnection, the feed connection
//! - [`adapter`] - Polymarket stream, discovery and CLOB client; dry-run executor
//! - [`app`] - Execution guard, dual-leg coordinator, the price engine, wiring
//! - [`config`] - TOML configuration with environment overrides
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `polymarket` (default) - Live order execution against the Polymarket CLOB
//! - `testkit` - Scripted streams and a recording execution client for tests
//!
//! # Example
//!
//! ```
//! use twinleg::domain::{is_arbitrage, DetectorConfig, LedgerEntry};
//! use rust_decimal_macros::dec;
//!
//! let entry = LedgerEntry {
//!     yes_price: Some(dec!(0.46)),
//!     no_price: Some(dec!(0.50)),
//!     updated_at: None,
//! };
//! assert!(is_arbitrage(&entry, &DetectorConfig { threshold: dec!(0.01) }));
//! ```

pub mod adapter;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
