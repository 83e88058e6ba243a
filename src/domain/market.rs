//! Market-related domain types.
//!
//! - [`Side`] - Which outcome of a binary market a token represents
//! - [`MarketPair`] - A binary market with its Yes and No tokens
//! - [`TokenMapping`] - Immutable index from token ID to market and side

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ids::{MarketId, TokenId};

/// Outcome side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// The complementary side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary market: one condition, two complementary tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketPair {
    market_id: MarketId,
    question: String,
    yes_token: TokenId,
    no_token: TokenId,
}

impl MarketPair {
    pub fn new(
        market_id: MarketId,
        question: impl Into<String>,
        yes_token: TokenId,
        no_token: TokenId,
    ) -> Self {
        Self {
            market_id,
            question: question.into(),
            yes_token,
            no_token,
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub const fn yes_token(&self) -> &TokenId {
        &self.yes_token
    }

    #[must_use]
    pub const fn no_token(&self) -> &TokenId {
        &self.no_token
    }

    /// Token for the given side.
    #[must_use]
    pub const fn token(&self, side: Side) -> &TokenId {
        match side {
            Side::Yes => &self.yes_token,
            Side::No => &self.no_token,
        }
    }
}

/// Where a token belongs: its market and which side it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBinding {
    pub market_id: MarketId,
    pub side: Side,
}

/// Immutable mapping from token identifier to `{market_id, side}`.
///
/// Built once at startup from discovery data and shared read-only (behind an
/// `Arc`) for the lifetime of the monitoring session.
#[derive(Debug, Clone, Default)]
pub struct TokenMapping {
    bindings: HashMap<TokenId, TokenBinding>,
    markets: HashMap<MarketId, MarketPair>,
}

impl TokenMapping {
    /// Build the mapping from discovered market pairs.
    ///
    /// A token already bound to an earlier market keeps its first binding.
    pub fn from_pairs(pairs: impl IntoIterator<Item = MarketPair>) -> Self {
        let mut mapping = Self::default();

        for pair in pairs {
            if mapping.markets.contains_key(pair.market_id()) {
                warn!(market_id = %pair.market_id(), "Duplicate market in discovery data, skipping");
                continue;
            }
            if pair.yes_token() == pair.no_token() {
                warn!(market_id = %pair.market_id(), "Market lists the same token for both sides, skipping");
                continue;
            }
            let taken = [pair.yes_token(), pair.no_token()]
                .into_iter()
                .find(|t| mapping.bindings.contains_key(*t));
            if let Some(token_id) = taken {
                warn!(
                    market_id = %pair.market_id(),
                    token_id = %token_id,
                    "Token already bound to another market, skipping"
                );
                continue;
            }

            for side in [Side::Yes, Side::No] {
                mapping.bindings.insert(
                    pair.token(side).clone(),
                    TokenBinding {
                        market_id: pair.market_id().clone(),
                        side,
                    },
                );
            }
            mapping.markets.insert(pair.market_id().clone(), pair);
        }

        mapping
    }

    /// Resolve a token to its market and side.
    #[must_use]
    pub fn resolve(&self, token_id: &TokenId) -> Option<&TokenBinding> {
        self.bindings.get(token_id)
    }

    /// Look up a market pair by ID.
    #[must_use]
    pub fn market(&self, market_id: &MarketId) -> Option<&MarketPair> {
        self.markets.get(market_id)
    }

    /// All token IDs, sorted for stable subscription messages.
    #[must_use]
    pub fn token_ids(&self) -> Vec<TokenId> {
        let mut tokens: Vec<TokenId> = self.bindings.keys().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Iterate over all market pairs.
    pub fn markets(&self) -> impl Iterator<Item = &MarketPair> {
        self.markets.values()
    }

    #[must_use]
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
