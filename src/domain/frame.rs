//! Captured link-layer frames and the magic packet formats they carry.

use std::fmt;

use super::HardwareAddress;

/// Reserved ethertype for raw Wake-on-LAN frames.
pub const ETHERTYPE_WOL: u16 = 0x0842;

/// Conventional UDP port for Wake-on-LAN (discard).
pub const WOL_UDP_PORT: u16 = 9;

/// How the magic packet was carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProtocol {
    /// Ethernet frame with the WOL ethertype.
    RawEthernet,
    /// UDP datagram to the given destination port.
    Udp { port: u16 },
}

impl fmt::Display for FrameProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawEthernet => write!(f, "ethertype {:#06x}", ETHERTYPE_WOL),
            Self::Udp { port } => write!(f, "udp/{}", port),
        }
    }
}

/// A frame that passed the capture filter.
///
/// Ephemeral: built once per captured packet and dropped after
/// classification.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Total captured length in bytes.
    pub length: usize,
    pub destination: HardwareAddress,
    pub source: HardwareAddress,
    pub protocol: FrameProtocol,
    /// The bytes that should hold the magic packet (Ethernet payload for
    /// raw frames, UDP payload otherwise).
    pub payload: Vec<u8>,
}

/// The three canonical magic-packet frame sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicPacketFormat {
    /// Bare magic packet.
    Bare,
    /// Magic packet wrapped in additional link-layer framing.
    Framed,
    /// Magic packet carrying a SecureOn password.
    SecureOn,
}

impl MagicPacketFormat {
    pub const BARE_LEN: usize = 102;
    pub const FRAMED_LEN: usize = 144;
    pub const SECURE_ON_LEN: usize = 234;

    /// Classify a total frame length. Other lengths are not canonical.
    pub fn from_frame_length(length: usize) -> Option<Self> {
        match length {
            Self::BARE_LEN => Some(Self::Bare),
            Self::FRAMED_LEN => Some(Self::Framed),
            Self::SECURE_ON_LEN => Some(Self::SecureOn),
            _ => None,
        }
    }

    pub fn frame_length(&self) -> usize {
        match self {
            Self::Bare => Self::BARE_LEN,
            Self::Framed => Self::FRAMED_LEN,
            Self::SecureOn => Self::SECURE_ON_LEN,
        }
    }
}

/// A frame accepted as a wake request, reduced to what the engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WolCandidate {
    /// Address whose owner should be woken.
    pub target: HardwareAddress,
    pub protocol: FrameProtocol,
    /// Canonical size class, if the frame length matches one.
    pub format: Option<MagicPacketFormat>,
}
