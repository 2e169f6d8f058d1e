//! Domain models for virtual Wake-on-LAN.
//!
//! These types are independent of capture and hypervisor plumbing.

mod action;
mod address;
mod events;
mod frame;
mod machine;

pub use action::WakeAction;
pub use address::HardwareAddress;
pub use events::{WakeEvent, WakeMatch, WakeOutcome};
pub use frame::{
    Frame, FrameProtocol, MagicPacketFormat, WolCandidate, ETHERTYPE_WOL, WOL_UDP_PORT,
};
pub use machine::{DomainRef, MachineId, ManagedMachine, PowerState};
