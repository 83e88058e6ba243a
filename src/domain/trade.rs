//! Order legs and execution outcomes.

use super::ids::{MarketId, OrderId, TokenId};
use super::market::Side;
use super::money::{Price, Volume};

/// Immutable description of one BUY leg of an arbitrage pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLeg {
    pub token_id: TokenId,
    pub market_id: MarketId,
    pub side: Side,
    pub price: Price,
    pub size: Volume,
}

/// Typed result of a single order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// The exchange accepted and matched the order.
    Filled { order_id: Option<OrderId> },
    /// The exchange refused the order.
    Rejected { reason: String },
    /// The placement failed before a verdict (network, signing, timeout).
    Errored { reason: String },
}

impl PlacementOutcome {
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        matches!(self, Self::Filled { .. })
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Filled { .. } => "filled",
            Self::Rejected { .. } => "rejected",
            Self::Errored { .. } => "errored",
        }
    }

    /// Human-readable detail for logs and reports.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Filled {
                order_id: Some(order_id),
            } => format!("order {order_id}"),
            Self::Filled { order_id: None } => "filled".to_string(),
            Self::Rejected { reason } | Self::Errored { reason } => reason.clone(),
        }
    }
}

/// Outcome of one leg's placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegResult {
    pub leg: OrderLeg,
    pub outcome: PlacementOutcome,
}

impl LegResult {
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.outcome.is_filled()
    }

    #[must_use]
    pub fn order_id(&self) -> Option<&OrderId> {
        match &self.outcome {
            PlacementOutcome::Filled { order_id } => order_id.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn detail(&self) -> String {
        self.outcome.detail()
    }
}

/// How an exposed leg was flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HedgeAction {
    /// The order was still resting and has been cancelled.
    Cancelled { order_id: OrderId },
    /// The filled position was sold back.
    Sold { order_id: Option<OrderId>, price: Price },
}

/// Final result of one dual-leg execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionReport {
    /// Both legs filled at a combined price below 1.
    Success { yes: LegResult, no: LegResult },
    /// Exactly one leg filled and the hedge flattened it.
    Hedged {
        filled: LegResult,
        failed: LegResult,
        hedge: HedgeAction,
    },
    /// Neither leg filled; no exposure was created.
    Failed { yes: LegResult, no: LegResult },
    /// Exactly one leg filled and the hedge did not flatten it.
    Exposed {
        filled: LegResult,
        failed: LegResult,
        reason: String,
    },
}

impl ExecutionReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Unresolved exposure that needs manual intervention.
    #[must_use]
    pub const fn is_exposed(&self) -> bool {
        matches!(self, Self::Exposed { .. })
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Hedged { .. } => "hedged",
            Self::Failed { .. } => "failed",
            Self::Exposed { .. } => "exposed",
        }
    }
}
