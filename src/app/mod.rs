//! Application layer: execution gating, dual-leg coordination, the price
//! consumer, and wiring.

pub mod coordinator;
pub mod engine;
pub mod guard;
mod orchestrator;

pub use coordinator::ExecutionCoordinator;
pub use engine::{Engine, EngineStats, StatsSnapshot};
pub use guard::{ExecutionGuard, ExecutionState, GuardPermit};
pub use orchestrator::App;
