//! Control plane backed by the libvirt `virsh` command line client.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tracing::{debug, trace};

use super::{Connector, Endpoint, Hypervisor, ListFilter};
use crate::domain::{DomainRef, PowerState};
use crate::error::ControlPlaneError;

/// Default program used to talk to libvirt.
pub const DEFAULT_VIRSH: &str = "virsh";

/// Opens [`VirshSession`]s against a libvirt endpoint.
#[derive(Debug, Clone)]
pub struct VirshConnector {
    endpoint: Endpoint,
    program: PathBuf,
    connect_timeout: Duration,
}

impl VirshConnector {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            program: PathBuf::from(DEFAULT_VIRSH),
            connect_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Bound on the initial socket probe.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Connector for VirshConnector {
    type Session = VirshSession;

    fn connect(&self) -> Result<VirshSession, ControlPlaneError> {
        self.endpoint.probe(self.connect_timeout)?;

        let session = VirshSession {
            uri: self.endpoint.connection_uri(),
            program: self.program.clone(),
        };
        // Fails fast if libvirtd rejects the URI.
        let uri = session.run(&["uri"])?;
        debug!("Connected to {}", uri.trim());

        Ok(session)
    }
}

/// A libvirt connection driven through `virsh -c <uri>`.
#[derive(Debug, Clone)]
pub struct VirshSession {
    uri: String,
    program: PathBuf,
}

impl VirshSession {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn run(&self, args: &[&str]) -> Result<String, ControlPlaneError> {
        let command = format!("virsh {}", args.join(" "));
        trace!("Running {} against {}", command, self.uri);

        // State names and error text are matched in English.
        let output = Command::new(&self.program)
            .env("LC_ALL", "C")
            .arg("--quiet")
            .arg("--connect")
            .arg(&self.uri)
            .args(args)
            .output()
            .map_err(|source| ControlPlaneError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if is_missing_domain(&stderr) {
                let domain = args.last().copied().unwrap_or_default();
                ControlPlaneError::DomainNotFound(domain.to_string())
            } else {
                ControlPlaneError::CommandFailed { command, stderr }
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ControlPlaneError::UnexpectedOutput {
            command,
            detail: "output is not valid UTF-8".to_string(),
        })
    }
}

impl Hypervisor for VirshSession {
    fn list_domains(&mut self, filter: ListFilter) -> Result<Vec<DomainRef>, ControlPlaneError> {
        let mut args = vec!["list", "--uuid"];
        match filter {
            ListFilter::Active => {}
            ListFilter::Inactive => args.push("--inactive"),
            ListFilter::All => args.push("--all"),
        }
        Ok(parse_domain_list(&self.run(&args)?))
    }

    fn domain_descriptor(&mut self, domain: &DomainRef) -> Result<String, ControlPlaneError> {
        self.run(&["dumpxml", domain.id.as_str()])
    }

    fn power_state(&mut self, domain: &DomainRef) -> Result<PowerState, ControlPlaneError> {
        let output = self.run(&["domstate", domain.id.as_str()])?;
        let name = output.lines().map(str::trim).find(|line| !line.is_empty());
        match name {
            Some(name) => Ok(PowerState::from_name(name)),
            None => Err(ControlPlaneError::UnexpectedOutput {
                command: format!("virsh domstate {}", domain.id),
                detail: "empty state".to_string(),
            }),
        }
    }

    fn start(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError> {
        self.run(&["start", domain.id.as_str()]).map(drop)
    }

    fn pm_wakeup(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError> {
        self.run(&["dompmwakeup", domain.id.as_str()]).map(drop)
    }

    fn resume(&mut self, domain: &DomainRef) -> Result<(), ControlPlaneError> {
        self.run(&["resume", domain.id.as_str()]).map(drop)
    }
}

/// One UUID per line, blank lines ignored.
fn parse_domain_list(output: &str) -> Vec<DomainRef> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(DomainRef::new)
        .collect()
}

fn is_missing_domain(stderr: &str) -> bool {
    stderr.contains("failed to get domain") || stderr.contains("Domain not found")
}
