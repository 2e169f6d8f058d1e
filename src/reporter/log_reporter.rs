//! Log-based event reporter.

use tracing::{debug, error, info};

use crate::domain::{HardwareAddress, WakeEvent, WakeOutcome, WolCandidate};
use crate::error::WakeError;
use crate::reporter::EventReporter;

/// Reports wake activity through `tracing`, one line per event.
#[derive(Debug, Default, Clone)]
pub struct LogReporter {
    /// Whether to include frame details on receipt
    verbose: bool,
}

impl LogReporter {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_outcome(&self, event: &WakeEvent) -> String {
        match &event.outcome {
            WakeOutcome::Matched(m) => format!(
                "Matched VM {} ({}) with MAC address {} on this host: state {}, action {}",
                m.machine.name, m.machine.id, event.target, m.state, m.action
            ),
            WakeOutcome::NoMatch => format!(
                "No VM with MAC address {} found on this host",
                event.target
            ),
        }
    }

    /// Cycle duration line, only in verbose mode.
    fn format_timing(&self, event: &WakeEvent) -> Option<String> {
        self.verbose.then(|| {
            format!(
                "Wake cycle for {} took {:?}",
                event.target,
                event.elapsed()
            )
        })
    }
}

impl EventReporter for LogReporter {
    fn frame_received(&self, candidate: &WolCandidate) {
        if self.verbose {
            let format = candidate
                .format
                .map(|f| format!("{:?}", f))
                .unwrap_or_else(|| "non-canonical".to_string());
            info!(
                "Received WOL packet for {} via {} ({} size)",
                candidate.target, candidate.protocol, format
            );
        } else {
            info!("Received WOL packet for {}", candidate.target);
        }
    }

    fn report(&self, event: &WakeEvent) {
        info!("{}", self.format_outcome(event));
        match self.format_timing(event) {
            Some(line) => info!("{}", line),
            None => debug!("Wake cycle for {} done", event.target),
        }
    }

    fn failure(&self, target: &HardwareAddress, error: &WakeError) {
        error!("Failed to process WOL packet for {}: {}", target, error);
    }

    fn on_start(&self, interface: &str) {
        info!("Using device: {}", interface);
        info!("Listening for WOL packets");
    }

    fn on_stop(&self) {
        info!("Stopping WOL listener");
    }
}
