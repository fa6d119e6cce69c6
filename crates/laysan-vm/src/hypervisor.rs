//! Hypervisor trait — the seam between the orchestrator and the driver.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Machine lifecycle operations the orchestrator needs.
///
/// This abstraction lets the bring-up logic run against the real
/// [`crate::VboxDriver`] in production and against recording mocks in tests,
/// without changing the orchestrator.
#[async_trait]
pub trait Hypervisor: Send + Sync {
    /// Whether a machine is already registered under `name`.
    async fn machine_exists(&self, name: &str) -> Result<bool>;

    /// Import an appliance image as a new machine called `name`, placing
    /// its disk artifacts under `disk_dir`.
    ///
    /// # Errors
    /// Returns an error carrying the tool's combined output when the import
    /// fails.
    async fn import_appliance(&self, name: &str, image: &Path, disk_dir: &Path) -> Result<()>;

    /// Create a fresh host-only interface and return its name.
    async fn create_hostonly_interface(&self) -> Result<String>;

    /// Attach the machine's first adapter to a host-only interface.
    async fn attach_hostonly(&self, name: &str, interface: &str) -> Result<()>;

    /// Start the machine headless.
    async fn start(&self, name: &str) -> Result<()>;

    /// Hard power-off.
    async fn poweroff(&self, name: &str) -> Result<()>;

    /// Deregister the machine and delete its artifacts.
    async fn unregister(&self, name: &str) -> Result<()>;
}
