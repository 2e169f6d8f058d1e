//! Reporting of wake activity.
//!
//! This module defines the `EventReporter` trait and a tracing-backed
//! implementation. The wake engine only hands over facts; how they are
//! rendered is up to the reporter.

mod log_reporter;

pub use log_reporter::LogReporter;

use crate::domain::{HardwareAddress, WakeEvent, WolCandidate};
use crate::error::WakeError;

/// Sink for wake activity.
pub trait EventReporter {
    /// A frame was accepted as a wake request.
    fn frame_received(&self, candidate: &WolCandidate);

    /// A wake cycle completed, matched or not.
    fn report(&self, event: &WakeEvent);

    /// A wake cycle for `target` failed.
    fn failure(&self, target: &HardwareAddress, error: &WakeError);

    /// Called when the listener starts.
    fn on_start(&self, interface: &str);

    /// Called when the listener stops.
    fn on_stop(&self);
}
