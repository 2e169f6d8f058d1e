//! Daemon configuration.
//!
//! Settings are layered: an optional `key = value` file, then
//! `VIRTWOLD_<KEY>` environment variables, then command line flags. The
//! result is one immutable [`Config`] handed to the components at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::ValidationMode;
use crate::error::ConfigError;
use crate::hypervisor::{Endpoint, SocketTransport, DEFAULT_SOCKET_PATH, DEFAULT_VIRSH};
use crate::orchestrator::{ConnectionMode, FailurePolicy, OrchestratorSettings, RetryPolicy};

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;
const ENV_PREFIX: &str = "VIRTWOLD_";

/// Keys understood in config files and as `VIRTWOLD_<KEY>` variables.
pub const KEYS: [&str; 10] = [
    "interface",
    "socket",
    "addr",
    "connect_timeout_ms",
    "on_error",
    "connection",
    "validation",
    "retries",
    "retry_backoff_ms",
    "virsh",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capture interface name.
    pub interface: String,
    pub endpoint: Endpoint,
    /// Bound on the initial control plane connection.
    pub connect_timeout: Duration,
    pub validation: ValidationMode,
    pub orchestrator: OrchestratorSettings,
    /// Program used to talk to libvirt.
    pub virsh: PathBuf,
}

/// Partially specified configuration, filled in layer by layer.
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    pub interface: Option<String>,
    pub transport: Option<SocketTransport>,
    pub address: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
    pub connection: Option<ConnectionMode>,
    pub validation: Option<ValidationMode>,
    pub retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub virsh: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one key from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "interface" => self.interface = Some(value.to_string()),
            "socket" => self.transport = Some(value.parse()?),
            "addr" => self.address = Some(value.to_string()),
            "connect_timeout_ms" => self.connect_timeout_ms = Some(parse_number(key, value)?),
            "on_error" => self.failure_policy = Some(value.parse()?),
            "connection" => self.connection = Some(value.parse()?),
            "validation" => self.validation = Some(value.parse()?),
            "retries" => self.retries = Some(parse_number(key, value)?),
            "retry_backoff_ms" => self.retry_backoff_ms = Some(parse_number(key, value)?),
            "virsh" => self.virsh = Some(PathBuf::from(value)),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Apply a `key = value` file. Blank lines and `#` comments are skipped.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Syntax {
                path: path.to_path_buf(),
                line: index + 1,
            })?;
            self.set(key.trim(), value)?;
        }
        Ok(())
    }

    /// Apply `VIRTWOLD_<KEY>` environment variables.
    pub fn load_env(&mut self) -> Result<(), ConfigError> {
        for key in KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase());
            if let Ok(value) = std::env::var(&var) {
                self.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Fill in defaults and validate.
    pub fn build(self) -> Result<Config, ConfigError> {
        let interface = self
            .interface
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::MissingInterface)?;

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            retries: self.retries.unwrap_or(retry_defaults.retries),
            backoff: self
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.backoff),
        };

        Ok(Config {
            interface,
            endpoint: Endpoint::new(
                self.transport.unwrap_or_default(),
                self.address
                    .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string()),
            ),
            connect_timeout: Duration::from_millis(
                self.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            ),
            validation: self.validation.unwrap_or_default(),
            orchestrator: OrchestratorSettings {
                connection: self.connection.unwrap_or_default(),
                failure_policy: self.failure_policy.unwrap_or_default(),
                retry,
            },
            virsh: self.virsh.unwrap_or_else(|| PathBuf::from(DEFAULT_VIRSH)),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "a non-negative integer",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase()));
        }
    }

    mod build_tests {
        use super::*;

        #[test]
        fn defaults() {
            let mut builder = ConfigBuilder::new();
            builder.interface = Some("eth0".to_string());
            let config = builder.build().unwrap();

            assert_eq!(config.interface, "eth0");
            assert_eq!(config.endpoint, Endpoint::default());
            assert_eq!(config.connect_timeout, Duration::from_secs(2));
            assert_eq!(config.validation, ValidationMode::Filter);
            assert_eq!(config.orchestrator, OrchestratorSettings::default());
            assert_eq!(config.virsh, PathBuf::from("virsh"));
        }

        #[test]
        fn missing_interface() {
            assert!(matches!(
                ConfigBuilder::new().build(),
                Err(ConfigError::MissingInterface)
            ));
        }

        #[test]
        fn blank_interface_counts_as_missing() {
            let mut builder = ConfigBuilder::new();
            builder.set("interface", "   ").unwrap();
            assert!(matches!(builder.build(), Err(ConfigError::MissingInterface)));
        }

        #[test]
        fn set_parses_every_key() {
            let mut builder = ConfigBuilder::new();
            builder.set("interface", "br0").unwrap();
            builder.set("socket", "tcp").unwrap();
            builder.set("addr", "10.0.0.5:16509").unwrap();
            builder.set("connect_timeout_ms", "500").unwrap();
            builder.set("on_error", "fail-fast").unwrap();
            builder.set("connection", "per-frame").unwrap();
            builder.set("validation", "strict").unwrap();
            builder.set("retries", "0").unwrap();
            builder.set("retry_backoff_ms", "10").unwrap();
            builder.set("virsh", "/usr/bin/virsh").unwrap();

            let config = builder.build().unwrap();
            assert_eq!(
                config.endpoint,
                Endpoint::new(SocketTransport::Tcp, "10.0.0.5:16509")
            );
            assert_eq!(config.connect_timeout, Duration::from_millis(500));
            assert_eq!(config.validation, ValidationMode::Strict);
            assert_eq!(config.orchestrator.failure_policy, FailurePolicy::FailFast);
            assert_eq!(config.orchestrator.connection, ConnectionMode::PerFrame);
            assert_eq!(config.orchestrator.retry.retries, 0);
            assert_eq!(config.orchestrator.retry.backoff, Duration::from_millis(10));
            assert_eq!(config.virsh, PathBuf::from("/usr/bin/virsh"));
        }

        #[test]
        fn rejects_bad_values() {
            let mut builder = ConfigBuilder::new();
            assert!(builder.set("socket", "udp").is_err());
            assert!(builder.set("retries", "-1").is_err());
            assert!(matches!(
                builder.set("colour", "blue"),
                Err(ConfigError::UnknownKey(_))
            ));
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn reads_key_value_file() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("virtwold.conf");
            fs::write(
                &path,
                "# virtwold\ninterface = eth1\n\nsocket=unix\naddr = /run/libvirt/libvirt-sock\n",
            )
            .unwrap();

            let mut builder = ConfigBuilder::new();
            builder.load_file(&path).unwrap();
            let config = builder.build().unwrap();

            assert_eq!(config.interface, "eth1");
            assert_eq!(config.endpoint.address, "/run/libvirt/libvirt-sock");
        }

        #[test]
        fn reports_syntax_error_line() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("virtwold.conf");
            fs::write(&path, "interface = eth0\nnonsense\n").unwrap();

            let err = ConfigBuilder::new().load_file(&path).unwrap_err();
            assert!(matches!(err, ConfigError::Syntax { line: 2, .. }));
        }

        #[test]
        fn missing_file() {
            let temp = TempDir::new().unwrap();
            let err = ConfigBuilder::new()
                .load_file(&temp.path().join("absent.conf"))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Io { .. }));
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        #[serial]
        fn env_overrides_file() {
            clear_env();
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("virtwold.conf");
            fs::write(&path, "interface = eth0\nsocket = unix\n").unwrap();
            std::env::set_var("VIRTWOLD_INTERFACE", "eth9");
            std::env::set_var("VIRTWOLD_SOCKET", "tcp");
            std::env::set_var("VIRTWOLD_ADDR", "127.0.0.1:16509");

            let mut builder = ConfigBuilder::new();
            builder.load_file(&path).unwrap();
            builder.load_env().unwrap();
            let config = builder.build().unwrap();
            clear_env();

            assert_eq!(config.interface, "eth9");
            assert_eq!(
                config.endpoint,
                Endpoint::new(SocketTransport::Tcp, "127.0.0.1:16509")
            );
        }

        #[test]
        #[serial]
        fn invalid_env_value_is_reported() {
            clear_env();
            std::env::set_var("VIRTWOLD_ON_ERROR", "explode");

            let result = ConfigBuilder::new().load_env();
            clear_env();

            assert!(matches!(
                result,
                Err(ConfigError::InvalidValue { ref key, .. }) if key == "on_error"
            ));
        }
    }
}
