//! Virtual machines as reported by the hypervisor.

use std::fmt;

use super::HardwareAddress;

/// Opaque identifier the control plane uses to address a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineId(String);

impl MachineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution status of a domain, as reported by the control plane.
///
/// The reported value is taken as authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerState {
    Running,
    ShutOff,
    Crashed,
    Paused,
    PmSuspended,
    /// Any state without a dedicated wake path (no state, blocked,
    /// shutting down, ...). Carries the control plane's own name for it.
    Other(String),
}

impl PowerState {
    /// Map a libvirt `virDomainState` code.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Running,
            3 => Self::Paused,
            5 => Self::ShutOff,
            6 => Self::Crashed,
            7 => Self::PmSuspended,
            0 => Self::Other("no state".to_string()),
            2 => Self::Other("blocked".to_string()),
            4 => Self::Other("in shutdown".to_string()),
            n => Self::Other(format!("state {}", n)),
        }
    }

    /// Map the state name printed by `virsh domstate`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "shut off" => Self::ShutOff,
            "crashed" => Self::Crashed,
            "paused" => Self::Paused,
            "pmsuspended" => Self::PmSuspended,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::ShutOff => write!(f, "shut off"),
            Self::Crashed => write!(f, "crashed"),
            Self::Paused => write!(f, "paused"),
            Self::PmSuspended => write!(f, "pmsuspended"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A domain as returned by enumeration, before its descriptor is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRef {
    pub id: MachineId,
    /// Display name, when the enumeration already provides one.
    pub name: Option<String>,
}

impl DomainRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: MachineId::new(id),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The best human-readable label for log lines.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// One virtual machine and the hardware addresses configured on it.
///
/// Materialized per wake cycle; nothing about it survives the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedMachine {
    pub id: MachineId,
    pub name: String,
    /// Interface addresses in descriptor order.
    pub addresses: Vec<HardwareAddress>,
}

impl ManagedMachine {
    pub fn new(
        id: MachineId,
        name: impl Into<String>,
        addresses: Vec<HardwareAddress>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            addresses,
        }
    }

    pub fn has_address(&self, address: &HardwareAddress) -> bool {
        self.addresses.contains(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_from_virsh() {
        assert_eq!(PowerState::from_name("running"), PowerState::Running);
        assert_eq!(PowerState::from_name("shut off\n"), PowerState::ShutOff);
        assert_eq!(PowerState::from_name("crashed"), PowerState::Crashed);
        assert_eq!(PowerState::from_name("paused"), PowerState::Paused);
        assert_eq!(PowerState::from_name("pmsuspended"), PowerState::PmSuspended);
        assert_eq!(
            PowerState::from_name("in shutdown"),
            PowerState::Other("in shutdown".to_string())
        );
    }

    #[test]
    fn state_codes_from_libvirt() {
        assert_eq!(PowerState::from_code(1), PowerState::Running);
        assert_eq!(PowerState::from_code(3), PowerState::Paused);
        assert_eq!(PowerState::from_code(5), PowerState::ShutOff);
        assert_eq!(PowerState::from_code(6), PowerState::Crashed);
        assert_eq!(PowerState::from_code(7), PowerState::PmSuspended);
        assert!(matches!(PowerState::from_code(2), PowerState::Other(_)));
        assert!(matches!(PowerState::from_code(42), PowerState::Other(_)));
    }

    #[test]
    fn domain_label_prefers_name() {
        let domain = DomainRef::new("c7a5fdbd-cdaf-9455-926a-d65c16db1809");
        assert_eq!(domain.label(), "c7a5fdbd-cdaf-9455-926a-d65c16db1809");
        assert_eq!(domain.with_name("web01").label(), "web01");
    }

    #[test]
    fn machine_address_lookup() {
        let mac: HardwareAddress = "52:54:00:aa:bb:cc".parse().unwrap();
        let machine = ManagedMachine::new(MachineId::new("1"), "vm", vec![mac]);
        assert!(machine.has_address(&mac));
        assert!(!machine.has_address(&HardwareAddress::broadcast()));
    }
}
