//! Bring-up configuration.
//!
//! Everything the orchestrator needs arrives through this struct at
//! construction time; core logic reads no ambient process state.

use crate::error::CoreError;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Default wait between reachability polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default overall reachability budget.
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(120);

/// Default guest-agent HTTP port.
pub const DEFAULT_AGENT_PORT: u16 = 4200;

/// First host-only interface VirtualBox creates.
const DEFAULT_HOSTONLY_IF: &str = "vboxnet0";

/// Static guest address appliances pin on the host-only network.
const DEFAULT_GUEST_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 56, 10);

/// Configuration for one bring-up attempt.
#[derive(Debug, Clone)]
pub struct BringupConfig {
    /// Appliance image to import.
    pub appliance_path: PathBuf,
    /// Directory receiving imported disk artifacts.
    pub disk_dir: PathBuf,
    /// Guest address to probe and provision.
    pub guest_address: Ipv4Addr,
    /// Host-only interface to attach; created when absent.
    pub hostonly_interface: String,
    /// Guest-agent HTTP port.
    pub agent_port: u16,
    /// Wait between reachability polls.
    pub poll_interval: Duration,
    /// Overall reachability budget.
    pub poll_budget: Duration,
    /// Pin the logical machine name; a fresh unique name is generated per
    /// attempt when unset.
    pub instance_name: Option<String>,
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self {
            appliance_path: PathBuf::new(),
            disk_dir: PathBuf::from("/tmp/laysan"),
            guest_address: DEFAULT_GUEST_ADDRESS,
            hostonly_interface: DEFAULT_HOSTONLY_IF.to_string(),
            agent_port: DEFAULT_AGENT_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_budget: DEFAULT_POLL_BUDGET,
            instance_name: None,
        }
    }
}

impl BringupConfig {
    /// Create a new config builder.
    pub fn builder() -> BringupConfigBuilder {
        BringupConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.appliance_path.as_os_str().is_empty() {
            return Err(CoreError::Config("appliance_path is required".into()));
        }
        if self.disk_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("disk_dir is required".into()));
        }
        if self.hostonly_interface.is_empty() {
            return Err(CoreError::Config("hostonly_interface is required".into()));
        }
        if self.agent_port == 0 {
            return Err(CoreError::Config("agent_port must be > 0".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::Config("poll_interval must be > 0".into()));
        }
        if self.poll_budget.is_zero() {
            return Err(CoreError::Config("poll_budget must be > 0".into()));
        }
        Ok(())
    }

    /// Base URL of the guest agent.
    pub fn agent_url(&self) -> String {
        format!("http://{}:{}", self.guest_address, self.agent_port)
    }
}

/// Builder for [`BringupConfig`].
#[derive(Debug, Default)]
pub struct BringupConfigBuilder {
    config: BringupConfig,
}

impl BringupConfigBuilder {
    /// Set the appliance image path.
    pub fn appliance(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.appliance_path = path.into();
        self
    }

    /// Set the disk artifact directory.
    pub fn disk_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.disk_dir = path.into();
        self
    }

    /// Set the guest address to probe and provision.
    pub fn guest_address(mut self, address: Ipv4Addr) -> Self {
        self.config.guest_address = address;
        self
    }

    /// Set the host-only interface name.
    pub fn hostonly_interface(mut self, name: impl Into<String>) -> Self {
        self.config.hostonly_interface = name.into();
        self
    }

    /// Set the guest-agent HTTP port.
    pub fn agent_port(mut self, port: u16) -> Self {
        self.config.agent_port = port;
        self
    }

    /// Set the wait between reachability polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the overall reachability budget.
    pub fn poll_budget(mut self, budget: Duration) -> Self {
        self.config.poll_budget = budget;
        self
    }

    /// Pin the logical machine name.
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.config.instance_name = Some(name.into());
        self
    }

    /// Build the configuration, validating all required fields.
    pub fn build(self) -> Result<BringupConfig, CoreError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = BringupConfig::default();
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.poll_budget, DEFAULT_POLL_BUDGET);
        assert_eq!(config.agent_port, DEFAULT_AGENT_PORT);
        assert!(config.instance_name.is_none());
    }

    #[test]
    fn missing_appliance_is_rejected() {
        assert!(BringupConfig::builder().build().is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let result = BringupConfig::builder()
            .appliance("/images/snappy.ova")
            .poll_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_success() {
        let config = BringupConfig::builder()
            .appliance("/images/snappy.ova")
            .guest_address(Ipv4Addr::new(192, 168, 56, 20))
            .agent_port(4242)
            .poll_budget(Duration::from_secs(30))
            .instance_name("laysan-pinned")
            .build()
            .expect("should build");

        assert_eq!(config.appliance_path, PathBuf::from("/images/snappy.ova"));
        assert_eq!(config.agent_url(), "http://192.168.56.20:4242");
        assert_eq!(config.instance_name.as_deref(), Some("laysan-pinned"));
    }
}
