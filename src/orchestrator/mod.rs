//! The per-frame wake control loop.
//!
//! Ties classification, inventory matching and the decision table to a
//! control plane session, under configurable connection and failure
//! policies.

mod policy;
mod wake_orchestrator;

pub use policy::{ConnectionMode, FailurePolicy, OrchestratorSettings, RetryPolicy};
pub use wake_orchestrator::{RunSummary, WakeOrchestrator};
