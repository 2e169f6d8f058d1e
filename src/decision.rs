//! Power state to wake action mapping.

use crate::domain::{PowerState, WakeAction};

/// Selects the wake primitive for a machine's current power state.
///
/// Total and deterministic: every state maps to exactly one action, and
/// states without a known wake path map to [`WakeAction::NoOp`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WakeDecisionTable;

impl WakeDecisionTable {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(&self, state: &PowerState) -> WakeAction {
        match state {
            PowerState::ShutOff | PowerState::Crashed => WakeAction::Start,
            PowerState::PmSuspended => WakeAction::PmWakeup,
            PowerState::Paused => WakeAction::Resume,
            PowerState::Running | PowerState::Other(_) => WakeAction::NoOp,
        }
    }
}
