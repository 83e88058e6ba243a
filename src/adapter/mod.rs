//! Venue adapters implementing the exchange ports.

pub mod dry_run;
pub mod polymarket;

pub use dry_run::DryRunExecutor;
