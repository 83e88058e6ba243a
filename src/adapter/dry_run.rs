//! Paper-trading execution client.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::{OrderId, PlacementOutcome};
use crate::error::Result;
use crate::exchange::{CancelOutcome, ExecutionClient, OrderRequest};

/// Fills every order locally at its limit price and never touches the venue.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    placed: AtomicU64,
}

impl DryRunExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders "filled" so far.
    #[must_use]
    pub fn placed(&self) -> u64 {
        self.placed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExecutionClient for DryRunExecutor {
    async fn place_order(&self, order: &OrderRequest) -> PlacementOutcome {
        self.placed.fetch_add(1, Ordering::Relaxed);
        let order_id = OrderId::new(format!("dry-{}", Uuid::new_v4()));
        info!(
            order_id = %order_id,
            token_id = %order.token_id,
            side = ?order.side,
            price = %order.price,
            size = %order.size,
            "[dry run] Order filled"
        );
        PlacementOutcome::Filled {
            order_id: Some(order_id),
        }
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome> {
        info!(order_id = %order_id, "[dry run] Order cancelled");
        Ok(CancelOutcome::Cancelled)
    }

    fn exchange_name(&self) -> &'static str {
        "dry-run"
    }
}
