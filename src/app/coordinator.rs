//! Dual-leg execution.
//!
//! Both BUY legs are submitted concurrently and each is bounded by its own
//! timeout, so the coordinator always sees two [`LegResult`]s before it
//! decides anything. An asymmetric fill is hedged exactly once; a failed
//! hedge halts the market and is reported as unresolved exposure.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, warn};

use super::guard::{ExecutionGuard, GuardPermit};
use crate::config::ExecutionConfig;
use crate::domain::{
    ExecutionReport, LegResult, Opportunity, OrderLeg, PlacementOutcome, Price, Side,
};
use crate::error::Error;
use crate::exchange::{ExecutionClient, OrderRequest};

/// Places the two legs of an opportunity and resolves the outcome.
pub struct ExecutionCoordinator {
    client: Arc<dyn ExecutionClient>,
    guard: Arc<ExecutionGuard>,
    leg_timeout: Duration,
    hedge_timeout: Duration,
    hedge_price: Price,
}

impl ExecutionCoordinator {
    pub fn new(
        client: Arc<dyn ExecutionClient>,
        guard: Arc<ExecutionGuard>,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            client,
            guard,
            leg_timeout: config.leg_timeout(),
            hedge_timeout: config.hedge_timeout(),
            hedge_price: config.hedge_min_price,
        }
    }

    #[must_use]
    pub fn guard(&self) -> &Arc<ExecutionGuard> {
        &self.guard
    }

    #[must_use]
    pub fn exchange_name(&self) -> &'static str {
        self.client.exchange_name()
    }

    /// Run one execution while holding the market's permit.
    ///
    /// The permit is consumed and released when this returns, whatever the
    /// outcome.
    pub async fn execute(&self, permit: GuardPermit, opportunity: Opportunity) -> ExecutionReport {
        info!(
            market_id = %opportunity.market_id,
            yes_price = %opportunity.yes_price,
            no_price = %opportunity.no_price,
            size = %opportunity.size,
            exchange = self.client.exchange_name(),
            "Executing arbitrage"
        );

        let (yes_leg, no_leg) = legs(&opportunity);
        let (yes, no) = tokio::join!(self.place(yes_leg), self.place(no_leg));

        let report = self.resolve(yes, no).await;
        log_report(&opportunity, &report);
        permit.release();
        report
    }

    async fn place(&self, leg: OrderLeg) -> LegResult {
        let order = OrderRequest::buy(leg.token_id.clone(), leg.size, leg.price);
        let outcome = match timeout(self.leg_timeout, self.client.place_order(&order)).await {
            Ok(outcome) => outcome,
            Err(_) => PlacementOutcome::Errored {
                reason: format!("placement timed out after {}ms", self.leg_timeout.as_millis()),
            },
        };

        if !outcome.is_filled() {
            warn!(
                market_id = %leg.market_id,
                token_id = %leg.token_id,
                side = %leg.side,
                outcome = outcome.label(),
                detail = %outcome.detail(),
                "Leg did not fill"
            );
        }
        LegResult { leg, outcome }
    }

    async fn resolve(&self, yes: LegResult, no: LegResult) -> ExecutionReport {
        match (yes.is_filled(), no.is_filled()) {
            (true, true) => ExecutionReport::Success { yes, no },
            (false, false) => ExecutionReport::Failed { yes, no },
            (true, false) => self.hedge(yes, no).await,
            (false, true) => self.hedge(no, yes).await,
        }
    }

    async fn hedge(&self, filled: LegResult, failed: LegResult) -> ExecutionReport {
        warn!(
            market_id = %filled.leg.market_id,
            token_id = %filled.leg.token_id,
            side = %filled.leg.side,
            "Asymmetric fill, hedging filled leg"
        );

        let result = timeout(
            self.hedge_timeout,
            self.client.hedge(&filled, self.hedge_price),
        )
        .await;

        let err = match result {
            Ok(Ok(hedge)) => {
                info!(
                    market_id = %filled.leg.market_id,
                    token_id = %filled.leg.token_id,
                    hedge = ?hedge,
                    "Exposure flattened"
                );
                return ExecutionReport::Hedged {
                    filled,
                    failed,
                    hedge,
                };
            }
            Ok(Err(e)) => e,
            Err(_) => Error::AsymmetricExposure {
                market_id: filled.leg.market_id.clone(),
                token_id: filled.leg.token_id.clone(),
                reason: format!("hedge timed out after {}ms", self.hedge_timeout.as_millis()),
            },
        };

        let reason = err.to_string();
        error!(
            alert = "manual_intervention_required",
            market_id = %filled.leg.market_id,
            token_id = %filled.leg.token_id,
            side = %filled.leg.side,
            size = %filled.leg.size,
            price = %filled.leg.price,
            error = %reason,
            "UNRESOLVED EXPOSURE"
        );
        self.guard.halt(&filled.leg.market_id, reason.clone());

        ExecutionReport::Exposed {
            filled,
            failed,
            reason,
        }
    }
}

fn legs(opportunity: &Opportunity) -> (OrderLeg, OrderLeg) {
    let leg = |side: Side| {
        let (token_id, price) = match side {
            Side::Yes => (&opportunity.yes_token, opportunity.yes_price),
            Side::No => (&opportunity.no_token, opportunity.no_price),
        };
        OrderLeg {
            token_id: token_id.clone(),
            market_id: opportunity.market_id.clone(),
            side,
            price,
            size: opportunity.size,
        }
    };
    (leg(Side::Yes), leg(Side::No))
}

fn log_report(opportunity: &Opportunity, report: &ExecutionReport) {
    let market_id = &opportunity.market_id;
    match report {
        ExecutionReport::Success { yes, no } => info!(
            market_id = %market_id,
            combined = %opportunity.combined(),
            expected_profit = %opportunity.expected_profit(),
            yes = %yes.detail(),
            no = %no.detail(),
            "Both legs filled"
        ),
        ExecutionReport::Hedged { filled, failed, .. } => warn!(
            market_id = %market_id,
            filled = %filled.leg.side,
            failed_detail = %failed.detail(),
            "Execution failed, exposure hedged"
        ),
        ExecutionReport::Failed { yes, no } => info!(
            market_id = %market_id,
            yes = %yes.detail(),
            no = %no.detail(),
            "Execution failed, no legs filled"
        ),
        // Already escalated in `hedge`.
        ExecutionReport::Exposed { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, TokenId};
    use rust_decimal_macros::dec;

    fn opportunity() -> Opportunity {
        Opportunity {
            market_id: MarketId::from("m"),
            question: "q".into(),
            yes_token: TokenId::from("y"),
            no_token: TokenId::from("n"),
            yes_price: dec!(0.46),
            no_price: dec!(0.50),
            size: dec!(10),
        }
    }

    #[test]
    fn legs_are_priced_from_the_opportunity() {
        let (yes, no) = legs(&opportunity());

        assert_eq!(yes.side, Side::Yes);
        assert_eq!(yes.token_id.as_str(), "y");
        assert_eq!(yes.price, dec!(0.46));
        assert_eq!(no.side, Side::No);
        assert_eq!(no.token_id.as_str(), "n");
        assert_eq!(no.price, dec!(0.50));
        assert_eq!(yes.size, no.size);
        assert_eq!(yes.market_id, no.market_id);
    }
}
