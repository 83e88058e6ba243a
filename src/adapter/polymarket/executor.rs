//! Order execution for the Polymarket CLOB.

use std::str::FromStr;
use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Normal, Signer};
use polymarket_client_sdk::clob::types::Side;
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::U256;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{OrderId, PlacementOutcome, Price, Volume};
use crate::error::{ConfigError, ExecutionError, Result};
use crate::exchange::{CancelOutcome, ExecutionClient, OrderRequest, OrderSide};

type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Signs and submits limit orders to the Polymarket CLOB.
pub struct PolymarketExecutor {
    client: Arc<AuthenticatedClient>,
    signer: Arc<PrivateKeySigner>,
}

impl PolymarketExecutor {
    /// Authenticate against the CLOB with the configured wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is missing or invalid, or if
    /// authentication fails.
    pub async fn connect(config: &Config) -> Result<Self> {
        let private_key = config
            .wallet
            .private_key
            .as_deref()
            .ok_or(ConfigError::MissingField {
                field: "WALLET_PRIVATE_KEY",
            })?;
        let chain_id = config.network.chain_id;

        let signer = PrivateKeySigner::from_str(private_key)
            .map_err(|e| ConfigError::InvalidValue {
                field: "WALLET_PRIVATE_KEY",
                reason: e.to_string(),
            })?
            .with_chain_id(Some(chain_id));

        info!(chain_id, address = %signer.address(), "Authenticating CLOB client");

        let client = Client::new(&config.network.api_url, ClobConfig::default())
            .map_err(|e| ExecutionError::AuthFailed(format!("failed to create CLOB client: {e}")))?
            .authentication_builder(&signer)
            .authenticate()
            .await
            .map_err(|e| ExecutionError::AuthFailed(e.to_string()))?;

        info!("CLOB client authenticated");

        Ok(Self {
            client: Arc::new(client),
            signer: Arc::new(signer),
        })
    }

    async fn submit(
        &self,
        token_id: &str,
        side: Side,
        size: Volume,
        price: Price,
    ) -> std::result::Result<String, ExecutionError> {
        let token = U256::from_str(token_id).map_err(|e| ExecutionError::InvalidTokenId {
            token_id: token_id.to_string(),
            reason: e.to_string(),
        })?;

        let order = self
            .client
            .limit_order()
            .token_id(token)
            .side(side)
            .price(price)
            .size(size)
            .build()
            .await
            .map_err(|e| ExecutionError::OrderBuildFailed(e.to_string()))?;

        let signed = self
            .client
            .sign(self.signer.as_ref(), order)
            .await
            .map_err(|e| ExecutionError::SigningFailed(e.to_string()))?;

        let response = self
            .client
            .post_order(signed)
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;

        if response.order_id.is_empty() {
            return Err(ExecutionError::OrderRejected(
                "exchange returned no order id".into(),
            ));
        }
        Ok(response.order_id)
    }
}

#[async_trait]
impl ExecutionClient for PolymarketExecutor {
    async fn place_order(&self, order: &OrderRequest) -> PlacementOutcome {
        let side = match order.side {
            OrderSide::Buy => Side::Buy,
            OrderSide::Sell => Side::Sell,
        };

        match self
            .submit(order.token_id.as_str(), side, order.size, order.price)
            .await
        {
            Ok(order_id) => {
                info!(
                    order_id = %order_id,
                    token_id = %order.token_id,
                    side = ?order.side,
                    price = %order.price,
                    size = %order.size,
                    "Order accepted"
                );
                PlacementOutcome::Filled {
                    order_id: Some(OrderId::new(order_id)),
                }
            }
            Err(e @ (ExecutionError::OrderRejected(_) | ExecutionError::InvalidTokenId { .. })) => {
                warn!(token_id = %order.token_id, error = %e, "Order rejected");
                PlacementOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!(token_id = %order.token_id, error = %e, "Order placement failed");
                PlacementOutcome::Errored {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome> {
        let response = self
            .client
            .cancel_order(order_id.as_str())
            .await
            .map_err(|e| ExecutionError::CancelFailed {
                order_id: order_id.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(reason) = response.not_canceled.get(order_id.as_str()) {
            return Ok(CancelOutcome::NotCancelled {
                reason: reason.to_string(),
            });
        }

        info!(order_id = %order_id, "Order cancelled");
        Ok(CancelOutcome::Cancelled)
    }

    fn exchange_name(&self) -> &'static str {
        "polymarket"
    }
}
