//! Hypervisor control plane abstraction.
//!
//! The wake engine only needs a handful of capabilities from the
//! hypervisor. They are expressed as traits so the engine can be driven by
//! the libvirt CLI in production and by an in-memory fake in tests.

mod endpoint;
mod virsh;

#[cfg(test)]
pub(crate) mod fake;

pub use endpoint::{Endpoint, SocketTransport, DEFAULT_SOCKET_PATH};
pub use virsh::{VirshConnector, VirshSession, DEFAULT_VIRSH};

use crate::domain::{DomainRef, PowerState};
use crate::error::ControlPlaneError;

/// Which domains an enumeration should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Active,
    Inactive,
    All,
}

/// An open session with the hypervisor control plane.
pub trait Hypervisor {
    /// Enumerate domains, in the control plane's own order.
    fn list_domains(&mut self, filter: ListFilter) -> Result<Vec<DomainRef>, ControlPlaneError>;

    /// Fetch the domain's XML descriptor.
    fn domain_descriptor(&mut self, domain: &DomainRef) -> Result<String, ControlPlaneError>;

    fn power_state(&mut self, domain: &DomainRef) -> Result<PowerState, ControlPlaneError>;

    /// Boot a shut off or crashed domain.
    fn start(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError>;

    /// Wake a domain suspended by guest power management.
    fn pm_wakeup(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError>;

    /// Unpause a paused domain.
    fn resume(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError>;

    /// Close the session. Dropping without calling this is allowed.
    fn disconnect(&mut self) -> Result<(), ControlPlaneError> {
        Ok(())
    }
}

/// Opens sessions with the control plane.
pub trait Connector {
    type Session: Hypervisor;

    fn connect(&self) -> Result<Self::Session, ControlPlaneError>;
}
