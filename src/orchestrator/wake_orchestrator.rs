//! Wake orchestration.

use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{ConnectionMode, FailurePolicy, OrchestratorSettings, RetryPolicy};
use crate::classifier::FrameClassifier;
use crate::decision::WakeDecisionTable;
use crate::domain::{
    DomainRef, Frame, HardwareAddress, ManagedMachine, PowerState, WakeAction, WakeEvent,
    WakeMatch, WakeOutcome,
};
use crate::error::{ControlPlaneError, WakeError, WakeStep};
use crate::hypervisor::{Connector, Hypervisor, ListFilter};
use crate::inventory::{DomainDescriptor, InventoryMatcher};
use crate::reporter::EventReporter;

/// Counters for a finished [`WakeOrchestrator::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames the classifier turned down.
    pub rejected: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Frames whose wake cycle failed.
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &WakeOutcome) {
        if outcome.is_match() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
    }
}

/// Drives one wake cycle per accepted frame.
///
/// Frames are handled strictly one after another; the cycle for a frame,
/// including any control plane side effects, finishes before the next
/// frame is looked at.
pub struct WakeOrchestrator<C: Connector, R: EventReporter> {
    connector: C,
    reporter: R,
    settings: OrchestratorSettings,
    matcher: InventoryMatcher,
    decisions: WakeDecisionTable,
    session: Option<C::Session>,
}

impl<C: Connector, R: EventReporter> WakeOrchestrator<C, R> {
    pub fn new(connector: C, reporter: R, settings: OrchestratorSettings) -> Self {
        Self {
            connector,
            reporter,
            settings,
            matcher: InventoryMatcher::new(),
            decisions: WakeDecisionTable::new(),
            session: None,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Whether a control plane session is currently held.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Consume frames until the source ends.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failed cycle ends the
    /// loop with that error; otherwise failures are reported and counted.
    pub fn run<I>(
        &mut self,
        frames: I,
        classifier: &FrameClassifier,
    ) -> Result<RunSummary, WakeError>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut summary = RunSummary::default();

        for frame in frames {
            let Some(candidate) = classifier.classify(&frame) else {
                summary.rejected += 1;
                continue;
            };
            self.reporter.frame_received(&candidate);
            let accepted = Instant::now();

            match self.process(candidate.target) {
                Ok(outcome) => {
                    summary.record(&outcome);
                    let event = WakeEvent::new(candidate.target, outcome).with_timestamp(accepted);
                    self.reporter.report(&event);
                }
                Err(e) => {
                    summary.failed += 1;
                    self.reporter.failure(&candidate.target, &e);
                    if self.settings.failure_policy == FailurePolicy::FailFast {
                        self.shutdown();
                        return Err(e);
                    }
                }
            }
        }

        self.shutdown();
        Ok(summary)
    }

    /// Run one wake cycle for `target`.
    ///
    /// A held session that fails is replaced and the cycle retried once on
    /// the fresh session. A session opened for this cycle is not retried,
    /// and neither is a failed start, wakeup or resume.
    pub fn process(&mut self, target: HardwareAddress) -> Result<WakeOutcome, WakeError> {
        let reused = self.session.is_some();

        let result = match self.cycle(target) {
            Err(e) if reused && !e.step.is_action() => {
                warn!("Held control plane session failed ({}), reconnecting", e);
                self.session = None;
                self.cycle(target)
            }
            other => other,
        };

        match result {
            Ok(outcome) => {
                if self.settings.connection == ConnectionMode::PerFrame {
                    self.disconnect()?;
                }
                Ok(outcome)
            }
            Err(e) => {
                self.session = None;
                Err(e)
            }
        }
    }

    /// Close any held session. Failures are logged, not returned.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.disconnect() {
            warn!("{}", e);
        }
    }

    fn cycle(&mut self, target: HardwareAddress) -> Result<WakeOutcome, WakeError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => connect_with_retry(&self.connector, &self.settings.retry)?,
        };
        let session = self.session.insert(session);

        wake_cycle(session, &self.matcher, &self.decisions, target)
    }

    fn disconnect(&mut self) -> Result<(), WakeError> {
        match self.session.take() {
            Some(mut session) => session
                .disconnect()
                .map_err(|e| WakeError::new(WakeStep::Disconnect, e)),
            None => Ok(()),
        }
    }
}

fn connect_with_retry<C: Connector>(
    connector: &C,
    retry: &RetryPolicy,
) -> Result<C::Session, WakeError> {
    let mut attempt = 0;
    loop {
        match connector.connect() {
            Ok(session) => return Ok(session),
            Err(e) if attempt < retry.retries => {
                attempt += 1;
                let delay = retry.delay(attempt);
                warn!(
                    "Failed to connect to control plane: {} (retry {}/{} in {:?})",
                    e, attempt, retry.retries, delay
                );
                thread::sleep(delay);
            }
            Err(e) => return Err(WakeError::new(WakeStep::Connect, e)),
        }
    }
}

/// Enumerate, match, decide and act, all on one session.
fn wake_cycle<H: Hypervisor>(
    hv: &mut H,
    matcher: &InventoryMatcher,
    decisions: &WakeDecisionTable,
    target: HardwareAddress,
) -> Result<WakeOutcome, WakeError> {
    let domains = hv
        .list_domains(ListFilter::All)
        .map_err(|e| WakeError::new(WakeStep::Enumerate, e))?;
    debug!("Checking {} domains for {}", domains.len(), target);

    let machines = domains
        .iter()
        .filter_map(|domain| load_machine(hv, domain).transpose());
    let Some(machine) = matcher.try_find_first(&target, machines)? else {
        return Ok(WakeOutcome::NoMatch);
    };
    let domain = DomainRef::new(machine.id.as_str()).with_name(&machine.name);

    let state = hv
        .power_state(&domain)
        .map_err(|e| WakeError::new(WakeStep::QueryState, e))?;
    let action = decisions.decide(&state);
    apply(hv, &domain, &machine, &state, action, target)?;

    Ok(WakeOutcome::Matched(WakeMatch {
        machine,
        state,
        action,
    }))
}

/// Describe one enumerated domain. `None` if it should be skipped.
fn load_machine<H: Hypervisor>(
    hv: &mut H,
    domain: &DomainRef,
) -> Result<Option<ManagedMachine>, WakeError> {
    let xml = match hv.domain_descriptor(domain) {
        Ok(xml) => xml,
        // Undefined between enumeration and lookup.
        Err(ControlPlaneError::DomainNotFound(id)) => {
            debug!("Domain {} disappeared during enumeration", id);
            return Ok(None);
        }
        Err(e) => return Err(WakeError::new(WakeStep::Describe, e)),
    };

    match DomainDescriptor::parse(&xml) {
        Ok(descriptor) => Ok(Some(descriptor.into_machine(domain))),
        Err(e) => {
            warn!("Skipping domain {}: {}", domain.label(), e);
            Ok(None)
        }
    }
}

fn apply<H: Hypervisor>(
    hv: &mut H,
    domain: &DomainRef,
    machine: &ManagedMachine,
    state: &PowerState,
    action: WakeAction,
    target: HardwareAddress,
) -> Result<(), WakeError> {
    match action {
        WakeAction::Start => {
            info!("Waking system: {} at MAC {}", machine.name, target);
            hv.start(domain)
                .map_err(|e| WakeError::new(WakeStep::Start, e))
        }
        WakeAction::PmWakeup => {
            info!("PM Wakeup system: {} at MAC {}", machine.name, target);
            hv.pm_wakeup(domain)
                .map_err(|e| WakeError::new(WakeStep::PmWakeup, e))
        }
        WakeAction::Resume => {
            info!("Resume system: {} at MAC {}", machine.name, target);
            hv.resume(domain)
                .map_err(|e| WakeError::new(WakeStep::Resume, e))
        }
        WakeAction::NoOp => {
            info!(
                "System {} is already running or in a state that cannot be woken from. State: {}",
                machine.name, state
            );
            Ok(())
        }
    }
}
