//! # laysan-core
//!
//! Bring-up orchestration for laysan.
//!
//! This crate takes an appliance image from a dormant file to a provisioned,
//! network-reachable VM: import, host-only network attach, bounded
//! reachability polling, and a one-shot credential rotation against the
//! guest agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 laysan-core (host)                     │
//! ├────────────────────────────────────────────────────────┤
//! │                                                        │
//! │  ┌──────────────┐   drives   ┌───────────────────────┐ │
//! │  │ Orchestrator │───────────▶│ dyn Hypervisor        │ │
//! │  │  bring_up()  │            │ (laysan-vm driver)    │ │
//! │  └──────┬───────┘            └───────────────────────┘ │
//! │         │ polls              ┌───────────────────────┐ │
//! │         ├───────────────────▶│ dyn Pinger (ICMP)     │ │
//! │         │ rotates            └───────────────────────┘ │
//! │         │                    ┌───────────────────────┐ │
//! │         └───────────────────▶│ dyn SecretRotator     │ │
//! │                              │ PUT /replace-secrets  │ │
//! │                              └───────────────────────┘ │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use laysan_core::{BringupConfig, IcmpPinger, Orchestrator, ProvisioningClient, Secret};
//! use laysan_vm::{DriverConfig, VboxDriver};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> laysan_core::Result<()> {
//! let config = BringupConfig::builder()
//!     .appliance("/images/snappy.ova")
//!     .build()?;
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(VboxDriver::new(DriverConfig::default())?),
//!     Arc::new(IcmpPinger::new()),
//!     Arc::new(ProvisioningClient::new()),
//!     config,
//! )?;
//!
//! let instance = orchestrator
//!     .bring_up(&Secret::new("new-pw"), &CancellationToken::new())
//!     .await?;
//! println!("{} is up", instance.name());
//! # Ok(())
//! # }
//! ```

mod bringup;
mod config;
mod error;
mod instance;
mod netinfo;
mod probe;
mod provision;

pub use bringup::{teardown, Orchestrator};
pub use config::{BringupConfig, BringupConfigBuilder};
pub use error::{CoreError, Result};
pub use instance::{FailureKind, Instance, VmPhase};
pub use netinfo::{list_interfaces, strip_prefix_len, InterfaceInfo, NetifError};
pub use probe::{IcmpPinger, Pinger, ProbeError, ProbeResult};
pub use provision::{ProvisionError, ProvisioningClient, Secret, SecretRotator};
