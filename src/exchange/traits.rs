//! Exchange trait definitions.
//!
//! These traits define the interface that any exchange implementation must provide:
//! a streaming price source and an order execution client.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{HedgeAction, LegResult, OrderId, PlacementOutcome, Price, TokenId, Volume};
use crate::error::{Error, Result};

/// Best ask observed for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEvent {
    pub token_id: TokenId,
    pub best_ask: Price,
}

/// Events produced by a market data stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    /// A new best ask from a snapshot or an incremental update.
    Price(PriceEvent),
    /// The link dropped; the stream must reconnect before yielding more events.
    Disconnected { reason: String },
}

/// A streaming connection to an exchange's order-book channel.
#[async_trait]
pub trait MarketDataStream: Send {
    /// Establish the connection.
    async fn connect(&mut self) -> Result<()>;

    /// Subscribe to a set of tokens in a single request.
    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()>;

    /// Next event, or `None` when the stream has ended.
    async fn next_event(&mut self) -> Option<MarketEvent>;

    /// Exchange name for logging.
    fn exchange_name(&self) -> &'static str;
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Represents an order to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// The token/asset ID to trade.
    pub token_id: TokenId,
    /// Buy or Sell.
    pub side: OrderSide,
    /// Order size in shares.
    pub size: Volume,
    /// Limit price.
    pub price: Price,
}

impl OrderRequest {
    pub fn buy(token_id: TokenId, size: Volume, price: Price) -> Self {
        Self {
            token_id,
            side: OrderSide::Buy,
            size,
            price,
        }
    }

    pub fn sell(token_id: TokenId, size: Volume, price: Price) -> Self {
        Self {
            token_id,
            side: OrderSide::Sell,
            size,
            price,
        }
    }
}

/// Result of a cancel request that reached the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The order was resting and is now cancelled.
    Cancelled,
    /// The exchange refused, typically because the order already matched.
    NotCancelled { reason: String },
}

/// Order execution client, constructed once at startup and passed in explicitly.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Place one order. Failures come back as typed outcomes, never as `Err`.
    async fn place_order(&self, order: &OrderRequest) -> PlacementOutcome;

    /// Cancel an order by ID.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome>;

    /// Flatten the exposure left by a filled leg whose sibling did not fill.
    ///
    /// An `Err` means exposure remains. Venues with a native flatten
    /// operation may override this; the default is [`cancel_or_sell`].
    async fn hedge(&self, filled: &LegResult, sell_price: Price) -> Result<HedgeAction> {
        cancel_or_sell(self, filled, sell_price).await
    }

    /// Get the exchange name for logging/debugging.
    fn exchange_name(&self) -> &'static str;
}

/// Cancel the filled leg's order if it is still resting; otherwise sell the
/// position back at `sell_price`.
///
/// # Errors
///
/// Returns [`Error::AsymmetricExposure`] if the offsetting sell does not fill.
pub async fn cancel_or_sell<C>(
    client: &C,
    filled: &LegResult,
    sell_price: Price,
) -> Result<HedgeAction>
where
    C: ExecutionClient + ?Sized,
{
    if let Some(order_id) = filled.order_id() {
        match client.cancel_order(order_id).await {
            Ok(CancelOutcome::Cancelled) => {
                return Ok(HedgeAction::Cancelled {
                    order_id: order_id.clone(),
                });
            }
            Ok(CancelOutcome::NotCancelled { reason }) => {
                debug!(order_id = %order_id, reason = %reason, "Order not resting, selling position");
            }
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Cancel failed, selling position");
            }
        }
    }

    let order = OrderRequest::sell(filled.leg.token_id.clone(), filled.leg.size, sell_price);
    match client.place_order(&order).await {
        PlacementOutcome::Filled { order_id } => Ok(HedgeAction::Sold {
            order_id,
            price: sell_price,
        }),
        PlacementOutcome::Rejected { reason } | PlacementOutcome::Errored { reason } => {
            Err(Error::AsymmetricExposure {
                market_id: filled.leg.market_id.clone(),
                token_id: filled.leg.token_id.clone(),
                reason,
            })
        }
    }
}
