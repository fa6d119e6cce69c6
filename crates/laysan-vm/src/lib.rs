//! # laysan-vm
//!
//! Hypervisor driver layer for laysan.
//! Drives a VirtualBox-style management tool through its command-line
//! interface and exposes the operations the orchestrator needs behind the
//! [`Hypervisor`] trait.
//!
//! ## Quick Start
//!
//! ```ignore
//! use laysan_vm::{DriverConfig, Hypervisor, VboxDriver};
//!
//! # async fn example() -> laysan_vm::Result<()> {
//! let driver = VboxDriver::new(DriverConfig::default())?;
//!
//! driver.import_appliance(
//!     "laysan-demo",
//!     "/images/snappy.ova".as_ref(),
//!     "/tmp/laysan".as_ref(),
//! ).await?;
//! driver.start("laysan-demo").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Tool discovery**: per-OS [`ToolLocator`] strategies, overridable with
//!   an explicit path
//! - **Command execution**: discrete argument tokens, combined output
//!   capture, failures preserved in [`ExecError`]
//! - **Machine lifecycle**: import, host-only networking, start, poweroff,
//!   unregister
//! - **Trait seam**: [`Hypervisor`] lets the orchestrator run against mocks

mod driver;
mod error;
mod exec;
mod hypervisor;
mod locate;

pub use driver::{DriverConfig, HostOnlyIf, VboxDriver};
pub use error::{Result, VmError};
pub use exec::{CommandRunner, ExecError, HostRunner};
pub use hypervisor::Hypervisor;
pub use locate::{default_locator, ToolLocator, UnixLocator, WindowsLocator};
