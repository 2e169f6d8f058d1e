//! Link-layer hardware addresses.

use std::fmt;
use std::str::FromStr;

use macaddr::MacAddr6;

use crate::error::AddressParseError;

/// Separators accepted between octets or octet groups.
const SEPARATORS: [char; 3] = [':', '-', '.'];

/// A 48-bit link-layer address.
///
/// Parsing ignores letter case and separator style, so `52:54:00:AA:BB:CC`,
/// `52-54-00-aa-bb-cc`, `5254.00aa.bbcc` and `525400aabbcc` are all the same
/// address. Equality is the only relation used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareAddress(MacAddr6);

impl HardwareAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(MacAddr6::from(octets))
    }

    pub fn octets(&self) -> [u8; 6] {
        let mut octets = [0u8; 6];
        octets.copy_from_slice(self.0.as_bytes());
        octets
    }

    /// The all-ones broadcast address.
    pub fn broadcast() -> Self {
        Self::new([0xff; 6])
    }

    pub fn is_broadcast(&self) -> bool {
        self.octets() == [0xff; 6]
    }
}

impl From<[u8; 6]> for HardwareAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self::new(octets)
    }
}

impl From<MacAddr6> for HardwareAddress {
    fn from(mac: MacAddr6) -> Self {
        Self(mac)
    }
}

impl FromStr for HardwareAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<u8> = s
            .trim()
            .chars()
            .filter(|c| !SEPARATORS.contains(c))
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| AddressParseError(s.to_string()))?;

        if digits.len() != 12 {
            return Err(AddressParseError(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (octet, pair) in octets.iter_mut().zip(digits.chunks(2)) {
            *octet = (pair[0] << 4) | pair[1];
        }
        Ok(Self::new(octets))
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}
