//! VirtualBox management-tool driver.
//!
//! Every operation is one tool invocation with discrete argument tokens.
//! Output parsing is kept in free functions so the formats are testable
//! without a hypervisor on the machine.

use crate::error::{Result, VmError};
use crate::exec::{CommandRunner, HostRunner};
use crate::hypervisor::Hypervisor;
use crate::locate;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for constructing a [`VboxDriver`].
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    /// Explicit path to the management tool. When unset the per-OS
    /// [`locate::default_locator`] strategy runs instead.
    pub tool_path: Option<PathBuf>,
}

/// A host-only interface as reported by the management tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOnlyIf {
    pub name: String,
    /// Host-side address, absent while the interface is unconfigured.
    pub address: Option<Ipv4Addr>,
}

/// Drives the `VBoxManage` command-line interface.
pub struct VboxDriver {
    tool: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl VboxDriver {
    /// Build a driver, locating the management tool if no explicit path is
    /// configured.
    ///
    /// # Errors
    /// Returns [`VmError::ToolNotFound`] when discovery fails.
    pub fn new(config: DriverConfig) -> Result<Self> {
        let tool = match config.tool_path {
            Some(path) => path,
            None => locate::default_locator().locate()?,
        };
        info!(tool = %tool.display(), "management tool resolved");
        Ok(Self {
            tool,
            runner: Arc::new(HostRunner),
        })
    }

    /// Build a driver around an injected runner (used by tests).
    pub fn with_runner(tool: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            tool: tool.into(),
            runner,
        }
    }

    /// Path of the management tool this driver invokes.
    pub fn tool(&self) -> &Path {
        &self.tool
    }

    async fn manage(&self, args: &[&str]) -> Result<String> {
        let bytes = self.runner.run(&self.tool, args).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Names of all registered machines.
    pub async fn list_machines(&self) -> Result<Vec<String>> {
        let raw = self.manage(&["list", "vms"]).await?;
        Ok(parse_vm_list(&raw))
    }

    /// Host-only interfaces currently defined on the host.
    pub async fn list_hostonly_interfaces(&self) -> Result<Vec<HostOnlyIf>> {
        let raw = self.manage(&["list", "hostonlyifs"]).await?;
        Ok(parse_hostonly_interfaces(&raw))
    }
}

#[async_trait]
impl Hypervisor for VboxDriver {
    async fn machine_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_machines().await?.iter().any(|m| m == name))
    }

    async fn import_appliance(&self, name: &str, image: &Path, disk_dir: &Path) -> Result<()> {
        let image = image.display().to_string();
        let disk_dir = disk_dir.display().to_string();
        debug!(machine = %name, image = %image, "importing appliance");
        self.manage(&[
            "import",
            &image,
            "--vsys",
            "0",
            "--vmname",
            name,
            "--basefolder",
            &disk_dir,
        ])
        .await?;
        info!(machine = %name, "appliance imported");
        Ok(())
    }

    async fn create_hostonly_interface(&self) -> Result<String> {
        let raw = self.manage(&["hostonlyif", "create"]).await?;
        let name = parse_created_interface(&raw).ok_or_else(|| {
            VmError::Parse(format!("hostonlyif create reported no interface: {}", raw.trim()))
        })?;
        info!(interface = %name, "host-only interface created");
        Ok(name)
    }

    async fn attach_hostonly(&self, name: &str, interface: &str) -> Result<()> {
        debug!(machine = %name, interface = %interface, "attaching host-only adapter");
        self.manage(&[
            "modifyvm",
            name,
            "--nic1",
            "hostonly",
            "--hostonlyadapter1",
            interface,
        ])
        .await?;
        Ok(())
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.manage(&["startvm", name, "--type", "headless"]).await?;
        info!(machine = %name, "machine started");
        Ok(())
    }

    async fn poweroff(&self, name: &str) -> Result<()> {
        self.manage(&["controlvm", name, "poweroff"]).await?;
        info!(machine = %name, "machine powered off");
        Ok(())
    }

    async fn unregister(&self, name: &str) -> Result<()> {
        self.manage(&["unregistervm", name, "--delete"]).await?;
        info!(machine = %name, "machine unregistered");
        Ok(())
    }
}

/// Parse `list vms` output: one `"name" {uuid}` line per machine.
fn parse_vm_list(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix('"')?;
            let (name, _) = rest.split_once('"')?;
            Some(name.to_string())
        })
        .collect()
}

/// Parse `list hostonlyifs` output: blank-line separated blocks of
/// `Key:   value` pairs.
fn parse_hostonly_interfaces(raw: &str) -> Vec<HostOnlyIf> {
    let mut out = Vec::new();
    let mut current: Option<HostOnlyIf> = None;
    for line in raw.lines() {
        if let Some(value) = field(line, "Name:") {
            if let Some(done) = current.take() {
                out.push(done);
            }
            current = Some(HostOnlyIf {
                name: value.to_string(),
                address: None,
            });
        } else if let Some(value) = field(line, "IPAddress:") {
            if let Some(iface) = current.as_mut() {
                iface.address = value.parse().ok();
            }
        }
    }
    if let Some(done) = current {
        out.push(done);
    }
    out
}

/// Parse `hostonlyif create` output:
/// `Interface 'vboxnet1' was successfully created`.
fn parse_created_interface(raw: &str) -> Option<String> {
    raw.split('\'').nth(1).map(str::to_string)
}

fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key).map(str::trim)
}
