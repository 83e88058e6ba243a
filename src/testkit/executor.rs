//! Scripted [`ExecutionClient`] that records every call.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{HedgeAction, LegResult, OrderId, PlacementOutcome, Price, TokenId};
use crate::error::{Error, Result};
use crate::exchange::{cancel_or_sell, CancelOutcome, ExecutionClient, OrderRequest, OrderSide};

/// Execution client for tests.
///
/// BUY orders fill unless an outcome was scripted for their token. SELL
/// orders use the scripted sell outcome (filled by default). Cancels
/// succeed unless scripted otherwise. `hedge` runs the default
/// cancel-or-sell logic and records which token it was asked to flatten.
pub struct RecordingExecutor {
    buy_outcomes: Mutex<HashMap<TokenId, VecDeque<PlacementOutcome>>>,
    delays: HashMap<TokenId, Duration>,
    sell_outcome: Mutex<Option<PlacementOutcome>>,
    cancel_result: Mutex<std::result::Result<CancelOutcome, String>>,
    orders: Mutex<Vec<OrderRequest>>,
    cancels: Mutex<Vec<OrderId>>,
    hedges: Mutex<Vec<TokenId>>,
    next_id: AtomicU64,
}

impl RecordingExecutor {
    /// Every order fills; every cancel succeeds.
    pub fn new() -> Self {
        Self {
            buy_outcomes: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
            sell_outcome: Mutex::new(None),
            cancel_result: Mutex::new(Ok(CancelOutcome::Cancelled)),
            orders: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            hedges: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue an outcome for the next BUY on `token_id`.
    pub fn with_buy_outcome(self, token_id: &TokenId, outcome: PlacementOutcome) -> Self {
        self.buy_outcomes
            .lock()
            .entry(token_id.clone())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Delay every placement on `token_id` by `delay`.
    pub fn with_delay(mut self, token_id: &TokenId, delay: Duration) -> Self {
        self.delays.insert(token_id.clone(), delay);
        self
    }

    pub fn with_sell_outcome(self, outcome: PlacementOutcome) -> Self {
        *self.sell_outcome.lock() = Some(outcome);
        self
    }

    pub fn with_cancel_outcome(self, outcome: CancelOutcome) -> Self {
        *self.cancel_result.lock() = Ok(outcome);
        self
    }

    /// Make every cancel request fail outright.
    pub fn with_cancel_error(self, reason: &str) -> Self {
        *self.cancel_result.lock() = Err(reason.to_string());
        self
    }

    /// Every placement request, in submission order.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().clone()
    }

    pub fn buys(&self) -> Vec<OrderRequest> {
        self.orders_with(OrderSide::Buy)
    }

    pub fn sells(&self) -> Vec<OrderRequest> {
        self.orders_with(OrderSide::Sell)
    }

    pub fn cancels(&self) -> Vec<OrderId> {
        self.cancels.lock().clone()
    }

    /// Tokens passed to `hedge`, one entry per call.
    pub fn hedged_tokens(&self) -> Vec<TokenId> {
        self.hedges.lock().clone()
    }

    fn orders_with(&self, side: OrderSide) -> Vec<OrderRequest> {
        self.orders
            .lock()
            .iter()
            .filter(|o| o.side == side)
            .cloned()
            .collect()
    }

    fn fill(&self) -> PlacementOutcome {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        PlacementOutcome::Filled {
            order_id: Some(OrderId::new(format!("order-{n}"))),
        }
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionClient for RecordingExecutor {
    async fn place_order(&self, order: &OrderRequest) -> PlacementOutcome {
        self.orders.lock().push(order.clone());

        if let Some(delay) = self.delays.get(&order.token_id) {
            tokio::time::sleep(*delay).await;
        }

        let scripted = match order.side {
            OrderSide::Buy => self
                .buy_outcomes
                .lock()
                .get_mut(&order.token_id)
                .and_then(VecDeque::pop_front),
            OrderSide::Sell => self.sell_outcome.lock().clone(),
        };
        scripted.unwrap_or_else(|| self.fill())
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome> {
        self.cancels.lock().push(order_id.clone());
        self.cancel_result.lock().clone().map_err(Error::Connection)
    }

    async fn hedge(&self, filled: &LegResult, sell_price: Price) -> Result<HedgeAction> {
        self.hedges.lock().push(filled.leg.token_id.clone());
        cancel_or_sell(self, filled, sell_price).await
    }

    fn exchange_name(&self) -> &'static str {
        "recording"
    }
}
