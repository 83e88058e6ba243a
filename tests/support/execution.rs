use std::sync::Arc;

use rust_decimal_macros::dec;
use twinleg::app::{ExecutionCoordinator, ExecutionGuard};
use twinleg::domain::Opportunity;
use twinleg::testkit::domain::{market_id, token};
use twinleg::testkit::executor::RecordingExecutor;

use super::config::fast_execution_config;

/// Opportunity on market `id` at (0.46, 0.50) for 100 shares.
pub fn opportunity(id: &str) -> Opportunity {
    Opportunity {
        market_id: market_id(id),
        question: format!("Will {id} resolve Yes?"),
        yes_token: token(&format!("{id}-yes")),
        no_token: token(&format!("{id}-no")),
        yes_price: dec!(0.46),
        no_price: dec!(0.50),
        size: dec!(100),
    }
}

pub struct Harness {
    pub executor: Arc<RecordingExecutor>,
    pub guard: Arc<ExecutionGuard>,
    pub coordinator: Arc<ExecutionCoordinator>,
}

pub fn harness(executor: RecordingExecutor) -> Harness {
    let executor = Arc::new(executor);
    let guard = Arc::new(ExecutionGuard::new());
    let coordinator = Arc::new(ExecutionCoordinator::new(
        executor.clone(),
        guard.clone(),
        &fast_execution_config(),
    ));
    Harness {
        executor,
        guard,
        coordinator,
    }
}
