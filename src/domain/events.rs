//! Outcomes of a wake cycle.

use std::time::{Duration, Instant};

use super::{HardwareAddress, ManagedMachine, PowerState, WakeAction};

/// A machine that matched an observed wake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeMatch {
    pub machine: ManagedMachine,
    /// State observed just before acting.
    pub state: PowerState,
    /// Action that was issued (or `NoOp`).
    pub action: WakeAction,
}

/// Result of processing one wake request.
///
/// A match is reported as such whether or not an action was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    Matched(WakeMatch),
    NoMatch,
}

impl WakeOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn action(&self) -> WakeAction {
        match self {
            Self::Matched(m) => m.action,
            Self::NoMatch => WakeAction::NoOp,
        }
    }
}

/// A completed wake cycle, as handed to reporters.
#[derive(Debug, Clone)]
pub struct WakeEvent {
    /// When the frame was accepted. Defaults to the moment the event is
    /// built.
    pub timestamp: Instant,
    pub target: HardwareAddress,
    pub outcome: WakeOutcome,
}

impl WakeEvent {
    pub fn new(target: HardwareAddress, outcome: WakeOutcome) -> Self {
        Self {
            timestamp: Instant::now(),
            target,
            outcome,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Time from frame acceptance until now.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}
