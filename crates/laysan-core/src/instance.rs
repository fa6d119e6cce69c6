//! VM instance identity and bring-up phases.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Why a bring-up attempt ended in [`VmPhase::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Import,
    NetworkAttach,
    ReachabilityTimeout,
    Cancelled,
    ProvisioningUnreachable,
    ProvisioningRejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Import => "import",
            Self::NetworkAttach => "network-attach",
            Self::ReachabilityTimeout => "reachability-timeout",
            Self::Cancelled => "cancelled",
            Self::ProvisioningUnreachable => "provisioning-unreachable",
            Self::ProvisioningRejected => "provisioning-rejected",
        };
        write!(f, "{label}")
    }
}

/// Bring-up phase of a VM instance.
///
/// Phases only move forward through the graph
/// `Unregistered → Imported → NetworkAttached → Probing → Reachable →
/// Provisioned`; `Failed` is terminal and reachable from any non-terminal
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmPhase {
    Unregistered,
    Imported,
    NetworkAttached,
    Probing,
    Reachable,
    Provisioned,
    Failed(FailureKind),
}

impl VmPhase {
    fn rank(self) -> u8 {
        match self {
            Self::Unregistered => 0,
            Self::Imported => 1,
            Self::NetworkAttached => 2,
            Self::Probing => 3,
            Self::Reachable => 4,
            Self::Provisioned => 5,
            Self::Failed(_) => u8::MAX,
        }
    }

    /// Terminal phases admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Provisioned | Self::Failed(_))
    }
}

impl fmt::Display for VmPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => write!(f, "Unregistered"),
            Self::Imported => write!(f, "Imported"),
            Self::NetworkAttached => write!(f, "NetworkAttached"),
            Self::Probing => write!(f, "Probing"),
            Self::Reachable => write!(f, "Reachable"),
            Self::Provisioned => write!(f, "Provisioned"),
            Self::Failed(kind) => write!(f, "Failed({kind})"),
        }
    }
}

/// One bring-up attempt's machine: a unique name plus its current phase.
///
/// Owned exclusively by the orchestrator; the phase changes only through
/// [`Instance::advance`].
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    phase: VmPhase,
    created_at: DateTime<Utc>,
}

impl Instance {
    /// Start a new attempt in `Unregistered` under the given machine name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: VmPhase::Unregistered,
            created_at: Utc::now(),
        }
    }

    /// The machine name used for every tool invocation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current bring-up phase.
    pub fn phase(&self) -> VmPhase {
        self.phase
    }

    /// When this attempt started.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move to the next phase.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTransition`] when `next` is not the
    /// direct successor, when the current phase is terminal, or when a
    /// failure is recorded on an already-terminal instance.
    pub fn advance(&mut self, next: VmPhase) -> Result<(), CoreError> {
        let allowed = match next {
            VmPhase::Failed(_) => !self.phase.is_terminal(),
            _ => !self.phase.is_terminal() && next.rank() == self.phase.rank() + 1,
        };
        if !allowed {
            return Err(CoreError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(instance = %self.name, from = %self.phase, to = %next, "phase transition");
        self.phase = next;
        Ok(())
    }
}

/// Generate a machine name unique to one bring-up attempt.
pub(crate) fn generate_name() -> String {
    format!("laysan-{}", Uuid::new_v4())
}
