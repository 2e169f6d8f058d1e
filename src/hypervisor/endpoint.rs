//! Control plane endpoint addressing.

use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ControlPlaneError};

/// Default libvirt socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/libvirt/libvirt-sock";

/// How the control plane socket is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketTransport {
    #[default]
    Unix,
    Tcp,
}

impl FromStr for SocketTransport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "tcp" => Ok(Self::Tcp),
            _ => Err(ConfigError::InvalidValue {
                key: "socket".to_string(),
                value: s.to_string(),
                expected: "unix or tcp",
            }),
        }
    }
}

impl fmt::Display for SocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => write!(f, "unix"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Where the hypervisor control plane listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub transport: SocketTransport,
    /// Socket path for unix, `host:port` for tcp.
    pub address: String,
}

impl Endpoint {
    pub fn new(transport: SocketTransport, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
        }
    }

    /// libvirt connection URI for this endpoint.
    pub fn connection_uri(&self) -> String {
        match self.transport {
            SocketTransport::Unix => format!("qemu:///system?socket={}", self.address),
            SocketTransport::Tcp => format!("qemu+tcp://{}/system", self.address),
        }
    }

    /// Check that something is listening, giving up after `timeout`.
    pub fn probe(&self, timeout: Duration) -> Result<(), ControlPlaneError> {
        match self.transport {
            SocketTransport::Unix => self.probe_unix(),
            SocketTransport::Tcp => self.probe_tcp(timeout),
        }
    }

    #[cfg(unix)]
    fn probe_unix(&self) -> Result<(), ControlPlaneError> {
        std::os::unix::net::UnixStream::connect(&self.address)
            .map(drop)
            .map_err(|source| self.unreachable(source))
    }

    #[cfg(not(unix))]
    fn probe_unix(&self) -> Result<(), ControlPlaneError> {
        Err(self.unreachable(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "unix sockets are not supported on this platform",
        )))
    }

    fn probe_tcp(&self, timeout: Duration) -> Result<(), ControlPlaneError> {
        let addrs = self
            .address
            .to_socket_addrs()
            .map_err(|source| self.unreachable(source))?;

        let mut last_error = std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "address resolved to nothing",
        );
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = e,
            }
        }
        Err(self.unreachable(last_error))
    }

    fn unreachable(&self, source: std::io::Error) -> ControlPlaneError {
        ControlPlaneError::Unreachable {
            endpoint: self.to_string(),
            source,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(SocketTransport::Unix, DEFAULT_SOCKET_PATH)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.transport, self.address)
    }
}
