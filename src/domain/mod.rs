//! Exchange-agnostic domain logic.

mod detector;
mod ids;
mod ledger;
mod market;
mod money;
mod trade;

pub use detector::{detect_arbitrage, is_arbitrage, DetectorConfig, Opportunity};
pub use ids::{MarketId, OrderId, TokenId};
pub use ledger::{LedgerEntry, MarketLedger};
pub use market::{MarketPair, Side, TokenBinding, TokenMapping};
pub use money::{is_outcome_price, Price, Volume};
pub use trade::{ExecutionReport, HedgeAction, LegResult, OrderLeg, PlacementOutcome};
