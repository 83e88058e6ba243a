//! Builders for domain primitives used across tests.

use std::sync::Arc;

use crate::domain::{
    LegResult, MarketId, MarketPair, OrderId, OrderLeg, PlacementOutcome, Price, Side, TokenId,
    TokenMapping,
};
use crate::exchange::{MarketEvent, PriceEvent};
use rust_decimal::Decimal;

pub fn token(id: &str) -> TokenId {
    TokenId::from(id)
}

pub fn market_id(id: &str) -> MarketId {
    MarketId::from(id)
}

/// Market `id` with tokens `{id}-yes` and `{id}-no`.
pub fn pair(id: &str) -> MarketPair {
    MarketPair::new(
        market_id(id),
        format!("Will {id} resolve Yes?"),
        token(&format!("{id}-yes")),
        token(&format!("{id}-no")),
    )
}

/// Mapping over [`pair`] for each id.
pub fn mapping(ids: &[&str]) -> Arc<TokenMapping> {
    Arc::new(TokenMapping::from_pairs(ids.iter().map(|id| pair(id))))
}

pub fn price(token_id: &str, best_ask: Price) -> PriceEvent {
    PriceEvent {
        token_id: token(token_id),
        best_ask,
    }
}

pub fn price_event(token_id: &str, best_ask: Price) -> MarketEvent {
    MarketEvent::Price(price(token_id, best_ask))
}

pub fn disconnect_event(reason: &str) -> MarketEvent {
    MarketEvent::Disconnected {
        reason: reason.to_string(),
    }
}

/// A filled BUY leg for `side` of market `id`.
pub fn filled_leg(id: &str, side: Side, price: Price, size: Decimal) -> LegResult {
    let suffix = match side {
        Side::Yes => "yes",
        Side::No => "no",
    };
    LegResult {
        leg: OrderLeg {
            token_id: token(&format!("{id}-{suffix}")),
            market_id: market_id(id),
            side,
            price,
            size,
        },
        outcome: PlacementOutcome::Filled {
            order_id: Some(OrderId::new(format!("{id}-{suffix}-order"))),
        },
    }
}
