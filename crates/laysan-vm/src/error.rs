//! Error types for laysan-vm.

use crate::exec::ExecError;
use thiserror::Error;

/// Result type alias for laysan-vm operations.
pub type Result<T> = std::result::Result<T, VmError>;

/// Errors that can occur while driving the management tool.
#[derive(Debug, Error)]
pub enum VmError {
    /// Tool invocation failed (spawn failure or non-zero exit).
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The management tool could not be located on this host.
    #[error("management tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran but produced output we could not interpret.
    #[error("unexpected tool output: {0}")]
    Parse(String),
}
