//! Per-market execution gate.
//!
//! Each market moves `Idle -> Pending -> Idle`. Acquiring returns a
//! [`GuardPermit`]; dropping the permit is the release, so every exit path
//! of an execution (including panics and early returns) frees the market.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::domain::MarketId;
use crate::error::GuardError;

/// Guard bookkeeping for one market, created on its first trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionState {
    pub in_progress: bool,
    pub last_execution: Option<DateTime<Utc>>,
    /// Set after unresolved exposure; blocks new executions until resumed.
    pub halted: Option<String>,
}

/// At most one in-flight execution per market.
#[derive(Debug, Default)]
pub struct ExecutionGuard {
    states: Mutex<HashMap<MarketId, ExecutionState>>,
}

impl ExecutionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically move `market_id` from Idle to Pending.
    ///
    /// # Errors
    ///
    /// [`GuardError::Conflict`] if an execution is already in flight,
    /// [`GuardError::Halted`] if the market carries unresolved exposure.
    pub fn try_acquire(self: &Arc<Self>, market_id: &MarketId) -> Result<GuardPermit, GuardError> {
        let mut states = self.states.lock();
        let state = states.entry(market_id.clone()).or_default();

        if let Some(reason) = &state.halted {
            return Err(GuardError::Halted {
                market_id: market_id.clone(),
                reason: reason.clone(),
            });
        }
        if state.in_progress {
            return Err(GuardError::Conflict {
                market_id: market_id.clone(),
            });
        }

        state.in_progress = true;
        debug!(market_id = %market_id, "Execution guard acquired");

        Ok(GuardPermit {
            guard: Arc::clone(self),
            market_id: market_id.clone(),
            released: false,
        })
    }

    fn release(&self, market_id: &MarketId) {
        let mut states = self.states.lock();
        if let Some(state) = states.get_mut(market_id) {
            state.in_progress = false;
            state.last_execution = Some(Utc::now());
        }
        debug!(market_id = %market_id, "Execution guard released");
    }

    /// Close a market to new executions.
    pub fn halt(&self, market_id: &MarketId, reason: impl Into<String>) {
        let reason = reason.into();
        error!(market_id = %market_id, reason = %reason, "Market halted");
        self.states.lock().entry(market_id.clone()).or_default().halted = Some(reason);
    }

    /// Reopen a halted market after the exposure was handled by hand.
    pub fn resume(&self, market_id: &MarketId) -> bool {
        let resumed = self
            .states
            .lock()
            .get_mut(market_id)
            .and_then(|state| state.halted.take())
            .is_some();
        if resumed {
            info!(market_id = %market_id, "Market resumed");
        }
        resumed
    }

    #[must_use]
    pub fn is_pending(&self, market_id: &MarketId) -> bool {
        self.states
            .lock()
            .get(market_id)
            .is_some_and(|state| state.in_progress)
    }

    #[must_use]
    pub fn is_halted(&self, market_id: &MarketId) -> bool {
        self.states
            .lock()
            .get(market_id)
            .is_some_and(|state| state.halted.is_some())
    }

    /// Markets currently halted, sorted.
    #[must_use]
    pub fn halted_markets(&self) -> Vec<MarketId> {
        let mut halted: Vec<MarketId> = self
            .states
            .lock()
            .iter()
            .filter(|(_, state)| state.halted.is_some())
            .map(|(id, _)| id.clone())
            .collect();
        halted.sort();
        halted
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.states
            .lock()
            .values()
            .filter(|state| state.in_progress)
            .count()
    }

    /// Snapshot of a market's state, if it has ever been triggered.
    #[must_use]
    pub fn state(&self, market_id: &MarketId) -> Option<ExecutionState> {
        self.states.lock().get(market_id).cloned()
    }
}

/// Proof that the holder owns a market's Pending slot.
#[must_use = "dropping the permit releases the market immediately"]
#[derive(Debug)]
pub struct GuardPermit {
    guard: Arc<ExecutionGuard>,
    market_id: MarketId,
    released: bool,
}

impl GuardPermit {
    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    /// Return the market to Idle now.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.guard.release(&self.market_id);
        }
    }
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        self.release_once();
    }
}
