//! The sequential price consumer.
//!
//! One [`Engine`] owns the [`MarketLedger`] and processes price events one
//! at a time: update the ledger, run detection on the affected market, and
//! hand a trigger to the guard. Admitted executions run as spawned tasks,
//! so the consumer never waits on order placement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::coordinator::ExecutionCoordinator;
use crate::config::ArbitrageConfig;
use crate::domain::{
    detect_arbitrage, DetectorConfig, ExecutionReport, MarketId, MarketLedger, Opportunity,
    TokenMapping, Volume,
};
use crate::error::GuardError;
use crate::exchange::PriceEvent;

/// Counters kept over one monitoring session.
#[derive(Debug, Default)]
pub struct EngineStats {
    price_events: AtomicU64,
    unmapped_events: AtomicU64,
    triggers: AtomicU64,
    suppressed: AtomicU64,
    executions: AtomicU64,
    exposures: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub price_events: u64,
    pub unmapped_events: u64,
    pub triggers: u64,
    pub suppressed: u64,
    pub executions: u64,
    pub exposures: u64,
}

impl EngineStats {
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            price_events: self.price_events.load(Ordering::Relaxed),
            unmapped_events: self.unmapped_events.load(Ordering::Relaxed),
            triggers: self.triggers.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            exposures: self.exposures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Ledger owner and trigger dispatcher.
pub struct Engine {
    ledger: MarketLedger,
    mapping: Arc<TokenMapping>,
    detector: DetectorConfig,
    order_size: Volume,
    verbose: bool,
    coordinator: Arc<ExecutionCoordinator>,
    stats: Arc<EngineStats>,
    tasks: JoinSet<ExecutionReport>,
}

impl Engine {
    pub fn new(
        mapping: Arc<TokenMapping>,
        config: &ArbitrageConfig,
        coordinator: Arc<ExecutionCoordinator>,
    ) -> Self {
        Self {
            ledger: MarketLedger::new(Arc::clone(&mapping)),
            mapping,
            detector: config.detector(),
            order_size: config.order_size,
            verbose: config.verbose,
            coordinator,
            stats: Arc::new(EngineStats::default()),
            tasks: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &MarketLedger {
        &self.ledger
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Markets closed to trading after unresolved exposure.
    #[must_use]
    pub fn halted_markets(&self) -> Vec<MarketId> {
        self.coordinator.guard().halted_markets()
    }

    /// Executions spawned and not yet collected.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Apply one price event and dispatch any resulting trigger.
    ///
    /// Returns the opportunity if an execution was started for it.
    pub fn on_price(&mut self, event: PriceEvent) -> Option<Opportunity> {
        let opportunity = self.detect(&event)?;
        self.dispatch(opportunity)
    }

    /// Ledger update followed by detection on the same market.
    ///
    /// Unmapped tokens leave the ledger untouched and skip detection.
    pub fn detect(&mut self, event: &PriceEvent) -> Option<Opportunity> {
        EngineStats::bump(&self.stats.price_events);

        let Some(market_id) = self.ledger.update(&event.token_id, event.best_ask) else {
            EngineStats::bump(&self.stats.unmapped_events);
            debug!(token_id = %event.token_id, "Price for unmapped token ignored");
            return None;
        };

        let entry = self.ledger.read(&market_id);
        let pair = self.mapping.market(&market_id)?;

        let Some(opportunity) = detect_arbitrage(pair, &entry, &self.detector, self.order_size)
        else {
            if self.verbose {
                if let Some(combined) = entry.combined() {
                    debug!(
                        market_id = %market_id,
                        combined = %combined,
                        trigger_below = %self.detector.trigger_below(),
                        "No arbitrage"
                    );
                }
            }
            return None;
        };

        EngineStats::bump(&self.stats.triggers);
        info!(
            market_id = %opportunity.market_id,
            question = %opportunity.question,
            yes_price = %opportunity.yes_price,
            no_price = %opportunity.no_price,
            combined = %opportunity.combined(),
            edge_pct = %opportunity.edge_pct().round_dp(2),
            expected_profit = %opportunity.expected_profit(),
            "Arbitrage detected"
        );
        Some(opportunity)
    }

    /// Admit an opportunity through the guard and spawn its execution.
    pub fn dispatch(&mut self, opportunity: Opportunity) -> Option<Opportunity> {
        let permit = match self.coordinator.guard().try_acquire(&opportunity.market_id) {
            Ok(permit) => permit,
            Err(GuardError::Conflict { market_id }) => {
                EngineStats::bump(&self.stats.suppressed);
                debug!(market_id = %market_id, "Execution already in flight, trigger suppressed");
                return None;
            }
            Err(GuardError::Halted { market_id, reason }) => {
                EngineStats::bump(&self.stats.suppressed);
                debug!(market_id = %market_id, reason = %reason, "Market halted, trigger suppressed");
                return None;
            }
        };

        EngineStats::bump(&self.stats.executions);
        let coordinator = Arc::clone(&self.coordinator);
        let stats = Arc::clone(&self.stats);
        let spawned = opportunity.clone();
        self.tasks.spawn(async move {
            let report = coordinator.execute(permit, spawned).await;
            if report.is_exposed() {
                EngineStats::bump(&stats.exposures);
            }
            report
        });
        Some(opportunity)
    }

    /// Wait for every spawned execution and return their reports.
    pub async fn drain(&mut self) -> Vec<ExecutionReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            if let Some(report) = collect(joined) {
                reports.push(report);
            }
        }
        reports
    }

    /// Consume price events until the channel closes or shutdown is signalled.
    ///
    /// In-flight executions are awaited before returning; each is bounded by
    /// the coordinator's timeouts.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<PriceEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> StatsSnapshot {
        info!(
            markets = self.mapping.market_count(),
            threshold = %self.detector.threshold,
            order_size = %self.order_size,
            exchange = self.coordinator.exchange_name(),
            "Engine started"
        );

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received");
                        break;
                    }
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    collect(joined);
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Price feed closed");
                        break;
                    };
                    self.on_price(event);
                }
            }
        }

        let pending = self.tasks.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight executions");
        }
        self.drain().await;

        // Halts are in-memory only; the next run trades these markets again.
        let halted = self.halted_markets();
        if !halted.is_empty() {
            let markets: Vec<&str> = halted.iter().map(MarketId::as_str).collect();
            warn!(
                markets = ?markets,
                "Stopping with halted markets; verify positions before restarting"
            );
        }

        let stats = self.stats();
        info!(
            price_events = stats.price_events,
            unmapped_events = stats.unmapped_events,
            triggers = stats.triggers,
            suppressed = stats.suppressed,
            executions = stats.executions,
            exposures = stats.exposures,
            markets_priced = self.ledger.len(),
            "Engine stopped"
        );
        stats
    }
}

fn collect(joined: Result<ExecutionReport, tokio::task::JoinError>) -> Option<ExecutionReport> {
    match joined {
        Ok(report) => {
            debug!(outcome = report.label(), "Execution finished");
            Some(report)
        }
        Err(e) => {
            error!(error = %e, "Execution task failed");
            None
        }
    }
}
