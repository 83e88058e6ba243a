//! Market discovery against the Gamma REST API.
//!
//! Pages through active, open, order-book-enabled markets sorted by volume
//! and turns each binary market into a [`MarketPair`].

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::DiscoveryConfig;
use crate::domain::{MarketId, MarketPair, TokenId, TokenMapping};
use crate::error::Result;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Market record as returned by Gamma `/markets`.
///
/// `outcomes` and `clobTokenIds` are JSON arrays encoded as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub outcomes: Option<String>,
    #[serde(default)]
    pub clob_token_ids: Option<String>,
}

impl GammaMarket {
    pub fn token_ids(&self) -> Vec<String> {
        decode_string_array(self.clob_token_ids.as_deref(), "clobTokenIds")
    }

    pub fn outcome_names(&self) -> Vec<String> {
        decode_string_array(self.outcomes.as_deref(), "outcomes")
    }

    /// Build the Yes/No pair for this market.
    ///
    /// Sides follow the outcome names when they are literally Yes and No;
    /// otherwise the first token is Yes and the second No.
    pub fn to_pair(&self) -> Option<MarketPair> {
        let condition_id = self.condition_id.as_deref().filter(|c| !c.is_empty())?;
        let tokens = self.token_ids();
        if tokens.len() < 2 {
            warn!(
                market_id = condition_id,
                tokens = tokens.len(),
                "Market has fewer than two tokens, skipping"
            );
            return None;
        }

        let names = self.outcome_names();
        let index_of = |label: &str| names.iter().position(|n| n.eq_ignore_ascii_case(label));
        let (yes_idx, no_idx) = match (index_of("yes"), index_of("no")) {
            (Some(y), Some(n)) if y < tokens.len() && n < tokens.len() => (y, n),
            _ => (0, 1),
        };

        Some(MarketPair::new(
            MarketId::from(condition_id),
            self.question.clone().unwrap_or_default(),
            TokenId::from(tokens[yes_idx].as_str()),
            TokenId::from(tokens[no_idx].as_str()),
        ))
    }
}

fn decode_string_array(raw: Option<&str>, field: &str) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        debug!(error = %e, field, "Failed to decode JSON-encoded array");
        Vec::new()
    })
}

/// Convert raw market records into pairs, dropping non-binary entries.
pub fn pairs_from_markets(markets: &[GammaMarket]) -> Vec<MarketPair> {
    markets.iter().filter_map(GammaMarket::to_pair).collect()
}

/// HTTP client for Gamma market discovery.
pub struct GammaClient {
    http: HttpClient,
    base_url: String,
    config: DiscoveryConfig,
}

impl GammaClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, config: DiscoveryConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            config,
        })
    }

    fn page_url(&self, offset: usize) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?.join("markets")?;
        url.query_pairs_mut()
            .append_pair("limit", &self.config.page_limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("active", "true")
            .append_pair("closed", "false")
            .append_pair("enable_order_book", "true")
            .append_pair("order", "volume")
            .append_pair("ascending", "false");
        Ok(url)
    }

    async fn fetch_page(&self, offset: usize) -> Result<Vec<GammaMarket>> {
        let url = self.page_url(offset)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = async {
                self.http
                    .get(url.clone())
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Vec<GammaMarket>>()
                    .await
            }
            .await;

            match result {
                Ok(markets) => return Ok(markets),
                Err(e) if attempt < MAX_ATTEMPTS && (e.is_timeout() || e.is_connect()) => {
                    warn!(attempt, error = %e, "Gamma request failed, retrying");
                    sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetch every active binary market, stopping at a short page or `max_markets`.
    ///
    /// # Errors
    ///
    /// Returns an error if a page request fails after retries.
    pub async fn discover(&self) -> Result<Vec<MarketPair>> {
        let page_limit = self.config.page_limit as usize;
        let cap = self.config.max_markets.unwrap_or(usize::MAX);
        let mut pairs = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(offset).await?;
            let fetched = page.len();
            debug!(offset, fetched, "Fetched market page");

            pairs.extend(pairs_from_markets(&page));
            if pairs.len() >= cap {
                pairs.truncate(cap);
                break;
            }
            if fetched < page_limit {
                break;
            }

            offset += fetched;
            sleep(Duration::from_millis(self.config.page_delay_ms)).await;
        }

        info!(markets = pairs.len(), "Market discovery complete");
        Ok(pairs)
    }

    /// Discover markets and build the token mapping.
    ///
    /// # Errors
    ///
    /// See [`GammaClient::discover`].
    pub async fn token_mapping(&self) -> Result<TokenMapping> {
        Ok(TokenMapping::from_pairs(self.discover().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(condition_id: &str, outcomes: &str, tokens: &str) -> GammaMarket {
        GammaMarket {
            condition_id: Some(condition_id.into()),
            question: Some("Will it rain?".into()),
            outcomes: Some(outcomes.into()),
            clob_token_ids: Some(tokens.into()),
        }
    }

    #[test]
    fn deserializes_gamma_payload() {
        let json = r#"[{
            "id": "12",
            "conditionId": "0xabc",
            "question": "Will it rain?",
            "outcomes": "[\"Yes\", \"No\"]",
            "clobTokenIds": "[\"111\", \"222\"]",
            "volumeNum": 1200.5
        }]"#;
        let markets: Vec<GammaMarket> = serde_json::from_str(json).unwrap();
        let pair = markets[0].to_pair().unwrap();

        assert_eq!(pair.market_id().as_str(), "0xabc");
        assert_eq!(pair.question(), "Will it rain?");
        assert_eq!(pair.yes_token().as_str(), "111");
        assert_eq!(pair.no_token().as_str(), "222");
    }

    #[test]
    fn outcome_names_decide_sides() {
        let pair = market("m", r#"["No","Yes"]"#, r#"["a","b"]"#).to_pair().unwrap();
        assert_eq!(pair.yes_token().as_str(), "b");
        assert_eq!(pair.no_token().as_str(), "a");
    }

    #[test]
    fn non_yes_no_outcomes_fall_back_to_token_order() {
        let pair = market("m", r#"["Lakers","Celtics"]"#, r#"["a","b"]"#)
            .to_pair()
            .unwrap();
        assert_eq!(pair.yes_token().as_str(), "a");
        assert_eq!(pair.no_token().as_str(), "b");
    }

    #[test]
    fn markets_without_two_tokens_are_skipped() {
        let markets = vec![
            market("one", r#"["Yes"]"#, r#"["a"]"#),
            market("broken", r#"["Yes","No"]"#, "not json"),
            market("ok", r#"["Yes","No"]"#, r#"["c","d"]"#),
        ];
        let pairs = pairs_from_markets(&markets);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].market_id().as_str(), "ok");
    }

    #[test]
    fn missing_condition_id_is_skipped() {
        let mut m = market("x", r#"["Yes","No"]"#, r#"["a","b"]"#);
        m.condition_id = None;
        assert!(m.to_pair().is_none());
    }

    #[test]
    fn page_url_carries_filters() {
        let client = GammaClient::new("https://gamma.example.test/", DiscoveryConfig::default())
            .unwrap();
        let url = client.page_url(200).unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/markets");
        assert_eq!(query["limit"], "100");
        assert_eq!(query["offset"], "200");
        assert_eq!(query["active"], "true");
        assert_eq!(query["closed"], "false");
        assert_eq!(query["enable_order_book"], "true");
        assert_eq!(query["order"], "volume");
        assert_eq!(query["ascending"], "false");
    }
}
