//! Polymarket market-channel stream.
//!
//! Implements [`MarketDataStream`] over `tokio-tungstenite`. The handshake is
//! bounded by a timeout. Malformed frames are logged and dropped; a close
//! frame or socket error surfaces as [`MarketEvent::Disconnected`] so the
//! reconnecting wrapper can take over.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::message::{decode_frame, SubscribeMessage};
use crate::domain::TokenId;
use crate::error::{Error, Result};
use crate::exchange::{MarketDataStream, MarketEvent, PriceEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming connection to the Polymarket order-book channel.
pub struct PolymarketDataStream {
    url: String,
    connect_timeout: Duration,
    ws: Option<WsStream>,
    /// Events decoded from a multi-payload frame, not yet handed out.
    pending: VecDeque<PriceEvent>,
}

impl PolymarketDataStream {
    #[must_use]
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
            ws: None,
            pending: VecDeque::new(),
        }
    }

    fn disconnected(&mut self, reason: String) -> MarketEvent {
        self.ws = None;
        self.pending.clear();
        MarketEvent::Disconnected { reason }
    }

    fn ingest(&mut self, text: &str) {
        let payloads = match decode_frame(text) {
            Ok(payloads) => payloads,
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "Discarding unparseable frame");
                return;
            }
        };

        for payload in payloads {
            match payload.price_events() {
                Ok(events) => self.pending.extend(events),
                Err(e) => warn!(error = %e, "Discarding malformed price message"),
            }
        }
    }
}

#[async_trait]
impl MarketDataStream for PolymarketDataStream {
    async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "Connecting to WebSocket");

        let (ws, response) = tokio::time::timeout(self.connect_timeout, connect_async(&self.url))
            .await
            .map_err(|_| {
                Error::Connection(format!(
                    "handshake did not complete within {}ms",
                    self.connect_timeout.as_millis()
                ))
            })?
            .map_err(|e| Error::Connection(format!("handshake failed: {e}")))?;

        info!(status = %response.status(), "WebSocket connected");
        self.ws = Some(ws);
        self.pending.clear();
        Ok(())
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("not connected".into()))?;

        let json = serde_json::to_string(&SubscribeMessage::new(token_ids))?;
        info!(tokens = token_ids.len(), "Subscribing to order-book channel");
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(MarketEvent::Price(event));
            }

            let ws = self.ws.as_mut()?;
            let Some(frame) = ws.next().await else {
                return Some(self.disconnected("stream ended".into()));
            };

            match frame {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Received text frame");
                    self.ingest(&text);
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return Some(self.disconnected(format!("failed to send pong: {e}")));
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by server".into());
                    return Some(self.disconnected(reason));
                }
                Ok(_) => debug!("Ignoring non-text frame"),
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    return Some(self.disconnected(e.to_string()));
                }
            }
        }
    }

    fn exchange_name(&self) -> &'static str {
        "polymarket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stream() -> PolymarketDataStream {
        PolymarketDataStream::new("wss://example.test/ws", Duration::from_secs(1))
    }

    #[test]
    fn ingest_queues_events_in_frame_order() {
        let mut s = stream();
        s.ingest(
            r#"[{"asset_id":"yes","asks":[{"price":"0.46","size":"1"}]},
                {"asset_id":"no","asks":[{"price":"0.50","size":"1"}]}]"#,
        );
        let tokens: Vec<_> = s.pending.iter().map(|e| e.token_id.as_str()).collect();
        assert_eq!(tokens, ["yes", "no"]);
        assert_eq!(s.pending[1].best_ask, dec!(0.50));
    }

    #[test]
    fn ingest_drops_bad_payload_but_keeps_good_ones() {
        let mut s = stream();
        s.ingest(
            r#"[{"asset_id":"bad","asks":[{"price":"x","size":"1"}]},
                {"asset_id":"good","asks":[{"price":"0.3","size":"1"}]}]"#,
        );
        assert_eq!(s.pending.len(), 1);
        assert_eq!(s.pending[0].token_id.as_str(), "good");
    }

    #[test]
    fn ingest_ignores_garbage() {
        let mut s = stream();
        s.ingest("PONG");
        assert!(s.pending.is_empty());
    }

    #[tokio::test]
    async fn subscribe_before_connect_fails() {
        let mut s = stream();
        let result = s.subscribe(&[TokenId::from("t")]).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn next_event_without_connection_is_none() {
        let mut s = stream();
        assert!(s.next_event().await.is_none());
    }
}
