//! Latest best-ask per side per market.
//!
//! The ledger is owned by the feed-consumption path and mutated only there,
//! one price event at a time. Because the consumer runs each update and the
//! detection that follows it to completion before reading the next event,
//! the ledger needs no internal locking.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::ids::{MarketId, TokenId};
use super::market::{Side, TokenMapping};
use super::money::Price;

/// Snapshot of one market's best asks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    pub yes_price: Option<Price>,
    pub no_price: Option<Price>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// Both sides have been observed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.yes_price.is_some() && self.no_price.is_some()
    }

    /// Combined best-ask price, once both sides are known.
    #[must_use]
    pub fn combined(&self) -> Option<Price> {
        Some(self.yes_price? + self.no_price?)
    }

    fn set(&mut self, side: Side, price: Price) {
        match side {
            Side::Yes => self.yes_price = Some(price),
            Side::No => self.no_price = Some(price),
        }
        self.updated_at = Some(Utc::now());
    }
}

/// In-memory table of best asks keyed by market.
///
/// Entries are never removed during a session; an absent entry reads as
/// `{None, None}`.
pub struct MarketLedger {
    mapping: Arc<TokenMapping>,
    entries: HashMap<MarketId, LedgerEntry>,
}

impl MarketLedger {
    #[must_use]
    pub fn new(mapping: Arc<TokenMapping>) -> Self {
        Self {
            mapping,
            entries: HashMap::new(),
        }
    }

    /// Record a best ask for a token.
    ///
    /// Returns the market the token belongs to, or `None` (and leaves the
    /// ledger untouched) when the token is not mapped.
    pub fn update(&mut self, token_id: &TokenId, price: Price) -> Option<MarketId> {
        let binding = self.mapping.resolve(token_id)?;
        self.entries
            .entry(binding.market_id.clone())
            .or_default()
            .set(binding.side, price);
        Some(binding.market_id.clone())
    }

    /// Current snapshot for a market.
    #[must_use]
    pub fn read(&self, market_id: &MarketId) -> LedgerEntry {
        self.entries.get(market_id).copied().unwrap_or_default()
    }

    /// Number of markets with at least one observed price.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn mapping(&self) -> &TokenMapping {
        &self.mapping
    }
}
