//! Virtual machine inventory.
//!
//! Reads domain descriptors and matches observed hardware addresses
//! against the machines they describe.

mod descriptor;
mod matcher;

pub use descriptor::DomainDescriptor;
pub use matcher::InventoryMatcher;
