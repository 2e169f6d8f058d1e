//! In-memory control plane for tests.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use super::{Connector, Hypervisor, ListFilter};
use crate::domain::{DomainRef, PowerState};
use crate::error::ControlPlaneError;

/// A control plane call, as recorded by [`FakeControlPlane`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Describe(String),
    State(String),
    Start(String),
    PmWakeup(String),
    Resume(String),
    Disconnect,
}

/// Which call should fail next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    List,
    Describe,
    State,
    Action,
}

#[derive(Debug, Clone)]
pub struct FakeDomain {
    pub id: String,
    pub name: String,
    pub macs: Vec<String>,
    pub state: PowerState,
    /// Raw descriptor override.
    pub xml: Option<String>,
}

impl FakeDomain {
    pub fn new(id: &str, macs: &[&str], state: PowerState) -> Self {
        Self {
            id: id.to_string(),
            name: format!("vm{}", id),
            macs: macs.iter().map(|m| m.to_string()).collect(),
            state,
            xml: None,
        }
    }

    pub fn with_xml(mut self, xml: &str) -> Self {
        self.xml = Some(xml.to_string());
        self
    }

    /// libvirt lists shut off and crashed domains as inactive.
    fn is_inactive(&self) -> bool {
        matches!(self.state, PowerState::ShutOff | PowerState::Crashed)
    }

    fn descriptor(&self) -> String {
        if let Some(xml) = &self.xml {
            return xml.clone();
        }
        let interfaces: String = self
            .macs
            .iter()
            .map(|mac| {
                format!(
                    "<interface type='network'><mac address='{}'/><source network='default'/></interface>",
                    mac
                )
            })
            .collect();
        format!(
            "<domain type='kvm'><name>{}</name><uuid>{}</uuid><devices>{}</devices></domain>",
            self.name, self.id, interfaces
        )
    }
}

#[derive(Debug, Default)]
struct State {
    domains: Vec<FakeDomain>,
    calls: Vec<Call>,
    connects: usize,
    failing_connects: usize,
    fail_on: Option<FailOn>,
}

/// Shared, inspectable control plane. Clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct FakeControlPlane {
    state: Rc<RefCell<State>>,
}

impl FakeControlPlane {
    pub fn new(domains: Vec<FakeDomain>) -> Self {
        let plane = Self::default();
        plane.state.borrow_mut().domains = domains;
        plane
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Calls that changed a domain's power state.
    pub fn actions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Start(_) | Call::PmWakeup(_) | Call::Resume(_)))
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    pub fn disconnects(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Disconnect).count()
    }

    /// Make the next `count` connection attempts fail.
    pub fn fail_connects(&self, count: usize) {
        self.state.borrow_mut().failing_connects = count;
    }

    /// Make the next call of the given kind fail once.
    pub fn fail_next(&self, on: FailOn) {
        self.state.borrow_mut().fail_on = Some(on);
    }

    pub fn state_of(&self, id: &str) -> Option<PowerState> {
        self.state
            .borrow()
            .domains
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.state.clone())
    }
}

impl Connector for FakeControlPlane {
    type Session = FakeSession;

    fn connect(&self) -> Result<FakeSession, ControlPlaneError> {
        let mut state = self.state.borrow_mut();
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            return Err(ControlPlaneError::Unreachable {
                endpoint: "fake".to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        state.connects += 1;
        Ok(FakeSession {
            state: Rc::clone(&self.state),
        })
    }
}

pub struct FakeSession {
    state: Rc<RefCell<State>>,
}

impl FakeSession {
    fn check(&self, on: FailOn, call: Call) -> Result<(), ControlPlaneError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call.clone());
        if state.fail_on == Some(on) {
            state.fail_on = None;
            return Err(ControlPlaneError::CommandFailed {
                command: format!("{:?}", call),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn with_domain<T>(
        &self,
        domain: &DomainRef,
        f: impl FnOnce(&mut FakeDomain) -> T,
    ) -> Result<T, ControlPlaneError> {
        let mut state = self.state.borrow_mut();
        state
            .domains
            .iter_mut()
            .find(|d| d.id == domain.id.as_str())
            .map(f)
            .ok_or_else(|| ControlPlaneError::DomainNotFound(domain.id.to_string()))
    }

    fn transition(
        &mut self,
        domain: &DomainRef,
        call: Call,
        state: PowerState,
    ) -> Result<(), ControlPlaneError> {
        self.check(FailOn::Action, call)?;
        self.with_domain(domain, |d| d.state = state)
    }
}

impl Hypervisor for FakeSession {
    fn list_domains(&mut self, filter: ListFilter) -> Result<Vec<DomainRef>, ControlPlaneError> {
        self.check(FailOn::List, Call::List)?;
        let state = self.state.borrow();
        Ok(state
            .domains
            .iter()
            .filter(|d| match filter {
                ListFilter::All => true,
                ListFilter::Active => !d.is_inactive(),
                ListFilter::Inactive => d.is_inactive(),
            })
            .map(|d| DomainRef::new(d.id.clone()))
            .collect())
    }

    fn domain_descriptor(&mut self, domain: &DomainRef) -> Result<String, ControlPlaneError> {
        self.check(FailOn::Describe, Call::Describe(domain.id.to_string()))?;
        self.with_domain(domain, |d| d.descriptor())
    }

    fn power_state(&mut self, domain: &DomainRef) -> Result<PowerState, ControlPlaneError> {
        self.check(FailOn::State, Call::State(domain.id.to_string()))?;
        self.with_domain(domain, |d| d.state.clone())
    }

    fn start(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError> {
        self.transition(domain, Call::Start(domain.id.to_string()), PowerState::Running)
    }

    fn pm_wakeup(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError> {
        self.transition(domain, Call::PmWakeup(domain.id.to_string()), PowerState::Running)
    }

    fn resume(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError> {
        self.transition(domain, Call::Resume(domain.id.to_string()), PowerState::Running)
    }

    fn disconnect(&mut self) -> Result<(), ControlPlaneError> {
        self.state.borrow_mut().calls.push(Call::Disconnect);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(domains: Vec<DomainRef>) -> Vec<String> {
        domains.into_iter().map(|d| d.id.to_string()).collect()
    }

    #[test]
    fn list_filters_follow_libvirt_activity() {
        let plane = FakeControlPlane::new(vec![
            FakeDomain::new("1", &[], PowerState::Running),
            FakeDomain::new("2", &[], PowerState::ShutOff),
            FakeDomain::new("3", &[], PowerState::Crashed),
            FakeDomain::new("4", &[], PowerState::Paused),
            FakeDomain::new("5", &[], PowerState::PmSuspended),
        ]);
        let mut session = plane.connect().unwrap();

        assert_eq!(ids(session.list_domains(ListFilter::Active).unwrap()), ["1", "4", "5"]);
        assert_eq!(ids(session.list_domains(ListFilter::Inactive).unwrap()), ["2", "3"]);
        assert_eq!(session.list_domains(ListFilter::All).unwrap().len(), 5);
    }
}
