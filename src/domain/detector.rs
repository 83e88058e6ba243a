//! Arbitrage detection logic.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::ids::{MarketId, TokenId};
use super::ledger::LedgerEntry;
use super::market::MarketPair;
use super::money::{Price, Volume};

/// Configuration for the arbitrage detector.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Minimum discount below 1.0 required to fire, as a fraction (e.g. 0.005).
    #[serde(default = "default_threshold")]
    pub threshold: Decimal,
}

fn default_threshold() -> Decimal {
    Decimal::new(5, 3) // 0.005
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

impl DetectorConfig {
    /// Combined price the market must drop strictly below to trigger.
    #[must_use]
    pub fn trigger_below(&self) -> Price {
        Decimal::ONE - self.threshold
    }
}

/// Decide whether a ledger entry is arbitrageable.
///
/// Fires iff both sides are present and `yes + no < 1 - threshold`. Every
/// qualifying call fires; suppressing repeats for an open window is the
/// execution guard's job.
#[must_use]
pub fn is_arbitrage(entry: &LedgerEntry, config: &DetectorConfig) -> bool {
    entry
        .combined()
        .is_some_and(|combined| combined < config.trigger_below())
}

/// A detected opportunity, priced from the ledger at detection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    pub market_id: MarketId,
    pub question: String,
    pub yes_token: TokenId,
    pub no_token: TokenId,
    pub yes_price: Price,
    pub no_price: Price,
    pub size: Volume,
}

impl Opportunity {
    /// Sum of both best asks.
    #[must_use]
    pub fn combined(&self) -> Price {
        self.yes_price + self.no_price
    }

    /// Discount below the 1.0 payout, per share.
    #[must_use]
    pub fn edge(&self) -> Price {
        Decimal::ONE - self.combined()
    }

    /// Edge expressed as a percentage.
    #[must_use]
    pub fn edge_pct(&self) -> Decimal {
        self.edge() * Decimal::ONE_HUNDRED
    }

    /// Profit if both legs fill at the observed asks.
    #[must_use]
    pub fn expected_profit(&self) -> Decimal {
        self.edge() * self.size
    }
}

/// Run detection for a market and build the opportunity if it fires.
#[must_use]
pub fn detect_arbitrage(
    pair: &MarketPair,
    entry: &LedgerEntry,
    config: &DetectorConfig,
    size: Volume,
) -> Option<Opportunity> {
    if !is_arbitrage(entry, config) {
        return None;
    }

    Some(Opportunity {
        market_id: pair.market_id().clone(),
        question: pair.question().to_string(),
        yes_token: pair.yes_token().clone(),
        no_token: pair.no_token().clone(),
        yes_price: entry.yes_price?,
        no_price: entry.no_price?,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(yes: Option<Decimal>, no: Option<Decimal>) -> LedgerEntry {
        LedgerEntry {
            yes_price: yes,
            no_price: no,
            updated_at: None,
        }
    }

    fn config(threshold: Decimal) -> DetectorConfig {
        DetectorConfig { threshold }
    }

    fn make_pair() -> MarketPair {
        MarketPair::new(
            MarketId::from("test-market"),
            "Test question?",
            TokenId::from("yes-token"),
            TokenId::from("no-token"),
        )
    }

    #[test]
    fn test_detects_when_sum_below_trigger() {
        let e = entry(Some(dec!(0.46)), Some(dec!(0.50)));
        assert!(is_arbitrage(&e, &config(dec!(0.01))));
    }

    #[test]
    fn test_boundary_does_not_trigger() {
        // 0.49 + 0.50 == 1 - 0.01
        let e = entry(Some(dec!(0.49)), Some(dec!(0.50)));
        assert!(!is_arbitrage(&e, &config(dec!(0.01))));
    }

    #[test]
    fn test_missing_side_never_triggers() {
        let cfg = config(dec!(0.01));
        assert!(!is_arbitrage(&entry(Some(dec!(0.01)), None), &cfg));
        assert!(!is_arbitrage(&entry(None, Some(dec!(0.01))), &cfg));
        assert!(!is_arbitrage(&entry(None, None), &cfg));
    }

    #[test]
    fn test_sum_above_one_does_not_trigger() {
        let e = entry(Some(dec!(0.55)), Some(dec!(0.50)));
        assert!(!is_arbitrage(&e, &config(dec!(0.005))));
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(DetectorConfig::default().threshold, dec!(0.005));
        assert_eq!(DetectorConfig::default().trigger_below(), dec!(0.995));
    }

    #[test]
    fn test_detect_builds_opportunity_with_prices_and_tokens() {
        let pair = make_pair();
        let e = entry(Some(dec!(0.46)), Some(dec!(0.50)));

        let opp = detect_arbitrage(&pair, &e, &config(dec!(0.01)), dec!(100)).unwrap();

        assert_eq!(opp.yes_price, dec!(0.46));
        assert_eq!(opp.no_price, dec!(0.50));
        assert_eq!(opp.yes_token.as_str(), "yes-token");
        assert_eq!(opp.no_token.as_str(), "no-token");
        assert_eq!(opp.combined(), dec!(0.96));
        assert_eq!(opp.edge(), dec!(0.04));
        assert_eq!(opp.edge_pct(), dec!(4.00));
        assert_eq!(opp.expected_profit(), dec!(4.00));
    }

    #[test]
    fn test_detect_returns_none_when_not_arbitrageable() {
        let pair = make_pair();
        let e = entry(Some(dec!(0.50)), Some(dec!(0.50)));
        assert!(detect_arbitrage(&pair, &e, &config(dec!(0.005)), dec!(100)).is_none());
    }
}
