//! Error taxonomy for laysan-core.
//!
//! Every bring-up stage fails with its own variant so callers can branch on
//! kind; structured fields (tool output travels inside the source chain,
//! HTTP status as a field) replace free-text-only messages.

use crate::instance::FailureKind;
use crate::netinfo::NetifError;
use crate::provision::ProvisionError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for laysan-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur during bring-up and teardown.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Appliance import failed; the source carries the tool's output.
    #[error("appliance import failed: {0}")]
    Import(#[source] laysan_vm::VmError),

    /// Host-only network selection, attach, or machine start failed.
    #[error("host-only network attach failed: {0}")]
    NetworkAttach(#[source] laysan_vm::VmError),

    /// Host topology query failed while wiring the network.
    #[error("host interface enumeration failed: {0}")]
    Netif(#[from] NetifError),

    /// The guest never answered an echo request within the budget.
    #[error("guest did not answer echo probes within {budget:?}")]
    ReachabilityTimeout { budget: Duration },

    /// The caller's cancellation signal fired mid-attempt.
    #[error("bring-up cancelled")]
    Cancelled,

    /// The provisioning request could not be delivered at all.
    #[error("guest agent unreachable during provisioning: {0}")]
    ProvisioningUnreachable(#[source] ProvisionError),

    /// The guest agent answered but refused the secret replacement.
    #[error("guest agent rejected secret replacement (HTTP {status})")]
    ProvisioningRejected { status: u16 },

    /// Attempted phase regression or transition out of a terminal phase.
    #[error("invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Rejected configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Driver failure outside a bring-up stage (e.g. teardown).
    #[error("VM error: {0}")]
    Vm(#[from] laysan_vm::VmError),
}

impl CoreError {
    /// The failure stage recorded on the instance, when this error maps to
    /// one. Internal errors (invalid config/transition) do not.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            CoreError::Import(_) => Some(FailureKind::Import),
            CoreError::NetworkAttach(_) | CoreError::Netif(_) => Some(FailureKind::NetworkAttach),
            CoreError::ReachabilityTimeout { .. } => Some(FailureKind::ReachabilityTimeout),
            CoreError::Cancelled => Some(FailureKind::Cancelled),
            CoreError::ProvisioningUnreachable(_) => Some(FailureKind::ProvisioningUnreachable),
            CoreError::ProvisioningRejected { .. } => Some(FailureKind::ProvisioningRejected),
            CoreError::InvalidTransition { .. } | CoreError::Config(_) | CoreError::Vm(_) => None,
        }
    }
}
