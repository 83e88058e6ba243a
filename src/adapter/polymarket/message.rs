//! Polymarket market-channel wire format.
//!
//! Frames arrive either as a single object or as a JSON array of objects.
//! Two shapes carry prices:
//!
//! ```json
//! {"event_type":"book","asset_id":"123","asks":[{"price":"0.46","size":"120"}],"bids":[]}
//! {"event_type":"price_change","price_changes":[{"asset_id":"123","best_ask":"0.45"}]}
//! ```
//!
//! Everything else (tick size changes, trades, acks) is recognised and
//! skipped. Prices may be JSON strings or numbers.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{is_outcome_price, Price, TokenId};
use crate::error::{Error, Result};
use crate::exchange::PriceEvent;

/// Subscription request, sent once per connection.
#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub assets_ids: Vec<String>,
    pub channels: Vec<&'static str>,
}

impl SubscribeMessage {
    pub fn new(token_ids: &[TokenId]) -> Self {
        Self {
            msg_type: "subscribe",
            assets_ids: token_ids.iter().map(|t| t.as_str().to_string()).collect(),
            channels: vec!["book"],
        }
    }
}

/// A decimal as sent on the wire: quoted or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl WireDecimal {
    fn to_decimal(&self) -> Result<Decimal> {
        let raw = match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|e| Error::Parse(format!("invalid price '{raw}': {e}")))
    }

    fn to_price(&self) -> Result<Price> {
        let price = self.to_decimal()?;
        if !is_outcome_price(price) {
            return Err(Error::Parse(format!("price {price} outside [0, 1]")));
        }
        Ok(price)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLevel {
    pub price: WireDecimal,
    #[serde(default)]
    pub size: Option<WireDecimal>,
}

/// Order-book snapshot or update for one token.
#[derive(Debug, Clone, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    pub asks: Vec<WireLevel>,
    #[serde(default)]
    pub market: Option<String>,
}

impl BookMessage {
    /// Lowest ask, or `None` when the ask side is empty.
    ///
    /// The venue documents asks as best-first; taking the minimum gives the
    /// same answer for that ordering and stays correct if it changes.
    pub fn best_ask(&self) -> Result<Option<Price>> {
        let mut best: Option<Price> = None;
        for level in &self.asks {
            let price = level.price.to_price()?;
            best = Some(best.map_or(price, |b| b.min(price)));
        }
        Ok(best)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceChangeEntry {
    pub asset_id: String,
    #[serde(default)]
    pub best_ask: Option<WireDecimal>,
}

/// Incremental update carrying the new best ask per token.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceChangeMessage {
    pub price_changes: Vec<PriceChangeEntry>,
}

/// One object from a frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WirePayload {
    Book(BookMessage),
    PriceChange(PriceChangeMessage),
    Other(serde_json::Value),
}

impl WirePayload {
    /// Price events carried by this payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if a price is malformed or out of range, or
    /// if a `book`/`price_change` payload does not match its expected shape.
    pub fn price_events(&self) -> Result<Vec<PriceEvent>> {
        match self {
            Self::Book(book) => Ok(book
                .best_ask()?
                .map(|best_ask| PriceEvent {
                    token_id: TokenId::from(book.asset_id.as_str()),
                    best_ask,
                })
                .into_iter()
                .collect()),
            Self::PriceChange(change) => {
                let mut events = Vec::with_capacity(change.price_changes.len());
                for entry in &change.price_changes {
                    if let Some(raw) = &entry.best_ask {
                        events.push(PriceEvent {
                            token_id: TokenId::from(entry.asset_id.as_str()),
                            best_ask: raw.to_price()?,
                        });
                    }
                }
                Ok(events)
            }
            Self::Other(value) => match value.get("event_type").and_then(|t| t.as_str()) {
                Some(kind @ ("book" | "price_change")) => {
                    Err(Error::Parse(format!("malformed {kind} payload")))
                }
                _ => Ok(Vec::new()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireFrame {
    Batch(Vec<WirePayload>),
    Single(WirePayload),
}

/// Split a text frame into its payloads.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the frame is not JSON.
pub fn decode_frame(text: &str) -> Result<Vec<WirePayload>> {
    let frame: WireFrame = serde_json::from_str(text)
        .map_err(|e| Error::Parse(format!("malformed frame: {e}")))?;
    Ok(match frame {
        WireFrame::Batch(payloads) => payloads,
        WireFrame::Single(payload) => vec![payload],
    })
}
