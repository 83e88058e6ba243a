//! Feed connection: one long-lived stream turned into a channel of prices.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::reconnecting::ReconnectingDataStream;
use super::traits::{MarketDataStream, MarketEvent, PriceEvent};
use crate::config::ReconnectionConfig;
use crate::domain::TokenId;
use crate::error::{Error, Result};

/// Persistent price feed for a fixed token set.
///
/// Connects once, subscribes once, and from then on yields only price
/// events for subscribed tokens. Link loss is handled underneath by
/// [`ReconnectingDataStream`].
pub struct FeedConnection<S: MarketDataStream> {
    stream: ReconnectingDataStream<S>,
    tokens: HashSet<TokenId>,
}

impl<S: MarketDataStream> FeedConnection<S> {
    /// Connect and issue a single subscription covering `token_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if `token_ids` is empty, or the inner
    /// stream's error if the handshake or subscription fails.
    pub async fn connect(
        inner: S,
        token_ids: &[TokenId],
        config: ReconnectionConfig,
    ) -> Result<Self> {
        if token_ids.is_empty() {
            return Err(Error::Connection("no tokens to subscribe".into()));
        }

        let mut stream = ReconnectingDataStream::new(inner, config);
        stream.connect().await?;
        stream.subscribe(token_ids).await?;

        info!(
            exchange = stream.exchange_name(),
            tokens = token_ids.len(),
            "Feed connected and subscribed"
        );

        Ok(Self {
            stream,
            tokens: token_ids.iter().cloned().collect(),
        })
    }

    /// Next price for a subscribed token. `None` only if the stream ends for good.
    pub async fn next_price(&mut self) -> Option<PriceEvent> {
        loop {
            match self.stream.next_event().await? {
                MarketEvent::Price(event) if self.tokens.contains(&event.token_id) => {
                    return Some(event);
                }
                MarketEvent::Price(event) => {
                    debug!(token_id = %event.token_id, "Ignoring price for unsubscribed token");
                }
                MarketEvent::Disconnected { .. } => {}
            }
        }
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

impl<S: MarketDataStream + 'static> FeedConnection<S> {
    /// Forward prices into `tx` on a background task.
    ///
    /// The task exits when the receiver is dropped or the stream ends.
    pub fn spawn(mut self, tx: mpsc::Sender<PriceEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = self.next_price().await {
                if tx.send(event).await.is_err() {
                    debug!("Price receiver dropped, stopping feed");
                    return;
                }
            }
            info!("Feed ended");
        })
    }
}
