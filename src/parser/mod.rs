//! Magic packet payload parsing.
//!
//! Turns raw payload bytes into a validated magic packet. Only used when
//! strict validation is enabled.

mod magic_parser;

pub use magic_parser::{MagicPacket, MagicPacketParser};
