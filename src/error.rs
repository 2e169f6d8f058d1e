//! Error types for the wake daemon.
//!
//! Each layer has its own error enum so that callers can tell startup
//! failures (configuration, capture) apart from per-frame failures
//! (control plane, descriptors).

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling the daemon configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no interface to listen on specified (use --interface <name>)")]
    MissingInterface,

    #[error("invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("{path}:{line}: expected 'key = value'")]
    Syntax { path: PathBuf, line: usize },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from the packet capture layer.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("unable to open device: {0}")]
    InterfaceNotFound(String),

    #[error("failed to create datalink channel: {0}")]
    ChannelCreation(String),

    #[error("insufficient permissions to capture packets (run as root or grant CAP_NET_RAW)")]
    InsufficientPermissions,
}

/// Error returned when a hardware address string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hardware address '{0}'")]
pub struct AddressParseError(pub String);

/// Errors while reading a domain descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("malformed domain XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("descriptor root is <{0}>, expected <domain>")]
    UnexpectedRoot(String),
}

/// Errors reported by the hypervisor control plane.
#[derive(Error, Debug)]
pub enum ControlPlaneError {
    #[error("control plane at {endpoint} is unreachable: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("unexpected output from '{command}': {detail}")]
    UnexpectedOutput { command: String, detail: String },

    #[error("domain '{0}' not found")]
    DomainNotFound(String),
}

/// The control-plane step during which a wake cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeStep {
    Connect,
    Enumerate,
    Describe,
    QueryState,
    Start,
    PmWakeup,
    Resume,
    Disconnect,
}

impl WakeStep {
    /// Whether the step changes a domain's power state.
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Start | Self::PmWakeup | Self::Resume)
    }
}

impl fmt::Display for WakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Enumerate => "domain enumeration",
            Self::Describe => "descriptor retrieval",
            Self::QueryState => "state query",
            Self::Start => "start",
            Self::PmWakeup => "pm wakeup",
            Self::Resume => "resume",
            Self::Disconnect => "disconnect",
        };
        f.write_str(name)
    }
}

/// A failed wake cycle for a single frame.
#[derive(Error, Debug)]
#[error("{step} failed: {source}")]
pub struct WakeError {
    pub step: WakeStep,
    #[source]
    pub source: ControlPlaneError,
}

impl WakeError {
    pub fn new(step: WakeStep, source: ControlPlaneError) -> Self {
        Self { step, source }
    }
}
