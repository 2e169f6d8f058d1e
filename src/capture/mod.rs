//! Packet capture abstraction.
//!
//! This module defines the `PacketCapture` trait (DIP) and provides
//! a pnet-based implementation that only surfaces frames which may carry
//! a Wake-on-LAN magic packet.

mod pnet_capture;

pub use pnet_capture::{extract_wol_frame, PnetCapture};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::domain::Frame;
use crate::error::CaptureError;

/// Source of candidate Wake-on-LAN frames.
///
/// The orchestrator only depends on this trait, so the daemon can be fed
/// from a live interface or from a canned sequence of frames in tests.
pub trait PacketCapture: Send {
    /// Start capturing and return an iterator over frames that passed the
    /// capture filter: ethertype 0x0842, or UDP to port 9.
    ///
    /// The iterator ends once the running flag is cleared.
    fn capture_wol_frames(&mut self) -> Result<Box<dyn Iterator<Item = Frame> + '_>, CaptureError>;

    /// Get the name of the interface being captured.
    fn interface_name(&self) -> &str;

    /// Set the running flag for graceful shutdown.
    fn set_running(&mut self, running: Arc<AtomicBool>);
}
