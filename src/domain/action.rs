//! Wake primitives offered by the control plane.

use std::fmt;

/// The action taken for a matched machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeAction {
    /// Cold boot.
    Start,
    /// Guest power-management wakeup.
    PmWakeup,
    /// Unpause.
    Resume,
    /// Leave the machine as it is.
    NoOp,
}

impl WakeAction {
    /// Whether this action leaves the machine untouched.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

impl fmt::Display for WakeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::PmWakeup => write!(f, "pm-wakeup"),
            Self::Resume => write!(f, "resume"),
            Self::NoOp => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_noop_leaves_machine_untouched() {
        assert!(WakeAction::NoOp.is_noop());
        for action in [WakeAction::Start, WakeAction::PmWakeup, WakeAction::Resume] {
            assert!(!action.is_noop(), "{}", action);
        }
    }
}
