//! Magic packet parser.
//!
//! A magic packet is six `0xFF` bytes followed by the target address
//! repeated sixteen times, optionally followed by a 4- or 6-byte SecureOn
//! password.

use crate::domain::HardwareAddress;

/// Synchronization stream that opens every magic packet.
const SYNC_STREAM: [u8; 6] = [0xff; 6];

/// Times the target address is repeated after the sync stream.
const ADDRESS_REPETITIONS: usize = 16;

/// Length of sync stream plus repetitions.
pub const MAGIC_PACKET_LEN: usize = SYNC_STREAM.len() + ADDRESS_REPETITIONS * 6;

/// Accepted SecureOn password lengths.
const PASSWORD_LENGTHS: [usize; 2] = [4, 6];

/// A validated magic packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPacket {
    /// The address repeated in the payload.
    pub target: HardwareAddress,
    /// SecureOn password, if one trailed the repetitions.
    pub password: Option<Vec<u8>>,
}

/// Parser for magic packet payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicPacketParser;

impl MagicPacketParser {
    pub fn new() -> Self {
        Self
    }

    /// Find the first well-formed magic packet in `payload`.
    ///
    /// The sync stream may be preceded by other bytes. Anything after the
    /// repetitions that is not a password-sized tail is ignored.
    pub fn parse(&self, payload: &[u8]) -> Option<MagicPacket> {
        if payload.len() < MAGIC_PACKET_LEN {
            return None;
        }

        (0..=payload.len() - MAGIC_PACKET_LEN).find_map(|offset| Self::parse_at(payload, offset))
    }

    fn parse_at(payload: &[u8], offset: usize) -> Option<MagicPacket> {
        let packet = &payload[offset..offset + MAGIC_PACKET_LEN];
        if packet[..SYNC_STREAM.len()] != SYNC_STREAM {
            return None;
        }

        let mut blocks = packet[SYNC_STREAM.len()..].chunks_exact(6);
        let first = blocks.next()?;
        if !blocks.all(|block| block == first) {
            return None;
        }

        let mut octets = [0u8; 6];
        octets.copy_from_slice(first);

        let tail = &payload[offset + MAGIC_PACKET_LEN..];
        let password = PASSWORD_LENGTHS
            .contains(&tail.len())
            .then(|| tail.to_vec());

        Some(MagicPacket {
            target: HardwareAddress::new(octets),
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: [u8; 6] = [0x52, 0x54, 0x00, 0xaa, 0xbb, 0xcc];

    fn magic(target: [u8; 6]) -> Vec<u8> {
        let mut payload = SYNC_STREAM.to_vec();
        for _ in 0..ADDRESS_REPETITIONS {
            payload.extend_from_slice(&target);
        }
        payload
    }

    #[test]
    fn parses_bare_packet() {
        let packet = MagicPacketParser::new().parse(&magic(TARGET)).unwrap();
        assert_eq!(packet.target, HardwareAddress::new(TARGET));
        assert_eq!(packet.password, None);
    }

    #[test]
    fn parses_secureon_password() {
        let mut payload = magic(TARGET);
        payload.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let packet = MagicPacketParser::new().parse(&payload).unwrap();
        assert_eq!(packet.password, Some(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn parses_four_byte_password() {
        let mut payload = magic(TARGET);
        payload.extend_from_slice(&[9, 9, 9, 9]);

        let packet = MagicPacketParser::new().parse(&payload).unwrap();
        assert_eq!(packet.password, Some(vec![9, 9, 9, 9]));
    }

    #[test]
    fn ignores_padding_after_packet() {
        let mut payload = magic(TARGET);
        payload.extend_from_slice(&[0u8; 18]);

        let packet = MagicPacketParser::new().parse(&payload).unwrap();
        assert_eq!(packet.target, HardwareAddress::new(TARGET));
        assert_eq!(packet.password, None);
    }

    #[test]
    fn finds_packet_after_leading_bytes() {
        let mut payload = vec![0x00, 0x01, 0x02];
        payload.extend(magic(TARGET));

        let packet = MagicPacketParser::new().parse(&payload).unwrap();
        assert_eq!(packet.target, HardwareAddress::new(TARGET));
    }

    #[test]
    fn rejects_short_payload() {
        let payload = magic(TARGET);
        assert!(MagicPacketParser::new()
            .parse(&payload[..MAGIC_PACKET_LEN - 1])
            .is_none());
    }

    #[test]
    fn rejects_broken_sync_stream() {
        let mut payload = magic(TARGET);
        payload[2] = 0x00;
        assert!(MagicPacketParser::new().parse(&payload).is_none());
    }

    #[test]
    fn rejects_inconsistent_repetition() {
        let mut payload = magic(TARGET);
        payload[6 + 6 * 10] ^= 0x01;
        assert!(MagicPacketParser::new().parse(&payload).is_none());
    }
}
