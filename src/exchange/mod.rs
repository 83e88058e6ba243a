//! Exchange abstraction layer.
//!
//! Defines the streaming and execution traits exchange implementations must
//! fulfill, plus the exchange-agnostic machinery built on top of them:
//! reconnection and the feed connection that turns a stream into a channel
//! of price events.

mod feed;
mod reconnecting;
mod traits;

pub use feed::FeedConnection;
pub use reconnecting::ReconnectingDataStream;
pub use traits::{
    cancel_or_sell, CancelOutcome, ExecutionClient, MarketDataStream, MarketEvent, OrderRequest,
    OrderSide, PriceEvent,
};
