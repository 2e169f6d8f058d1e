//! Connection and failure policies for the orchestrator.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Lifetime of the control plane session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// Hold one session across frames, reconnecting after a failure.
    #[default]
    Persistent,
    /// Open and close a session for every frame.
    PerFrame,
}

impl FromStr for ConnectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persistent" => Ok(Self::Persistent),
            "per-frame" | "per_frame" => Ok(Self::PerFrame),
            _ => Err(ConfigError::InvalidValue {
                key: "connection".to_string(),
                value: s.to_string(),
                expected: "persistent or per-frame",
            }),
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent => write!(f, "persistent"),
            Self::PerFrame => write!(f, "per-frame"),
        }
    }
}

/// What a failed wake cycle does to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and keep processing frames.
    #[default]
    Isolate,
    /// Stop the loop and hand the error to the caller.
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(Self::Isolate),
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            _ => Err(ConfigError::InvalidValue {
                key: "on_error".to_string(),
                value: s.to_string(),
                expected: "isolate or fail-fast",
            }),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isolate => write!(f, "isolate"),
            Self::FailFast => write!(f, "fail-fast"),
        }
    }
}

/// Reconnect attempts made before a frame is given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first connect fails.
    pub retries: u32,
    /// Delay before the first retry; grows linearly.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Everything the orchestrator needs besides its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrchestratorSettings {
    pub connection: ConnectionMode,
    pub failure_policy: FailurePolicy,
    pub retry: RetryPolicy,
}
