//! Hardware address to machine matching.

use std::borrow::Borrow;
use std::convert::Infallible;

use crate::domain::{HardwareAddress, ManagedMachine};

/// Finds the machine configured with a given hardware address.
///
/// Machines and their interfaces are searched in enumeration order and the
/// first hit wins. Duplicate addresses across machines are not detected.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryMatcher;

impl InventoryMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Whether `machine` has `target` on any of its interfaces.
    pub fn matches(&self, machine: &ManagedMachine, target: &HardwareAddress) -> bool {
        machine.has_address(target)
    }

    /// The first machine carrying `target`, or `None`, over an already
    /// retrieved inventory.
    ///
    /// `None` is the common case and not an error.
    pub fn find_first<'a, I>(
        &self,
        target: &HardwareAddress,
        machines: I,
    ) -> Option<&'a ManagedMachine>
    where
        I: IntoIterator<Item = &'a ManagedMachine>,
    {
        match self.try_find_first(target, machines.into_iter().map(Ok::<_, Infallible>)) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Like [`find_first`](Self::find_first), over machines that are
    /// retrieved one at a time and may fail to load.
    ///
    /// Machines after the first match are never pulled from `machines`,
    /// and the first retrieval error ends the search.
    pub fn try_find_first<T, E, I>(
        &self,
        target: &HardwareAddress,
        machines: I,
    ) -> Result<Option<T>, E>
    where
        T: Borrow<ManagedMachine>,
        I: IntoIterator<Item = Result<T, E>>,
    {
        for machine in machines {
            let machine = machine?;
            if self.matches(machine.borrow(), target) {
                return Ok(Some(machine));
            }
        }
        Ok(None)
    }
}
