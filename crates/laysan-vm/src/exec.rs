//! External management-tool invocation.
//!
//! One trait, one production implementation. Arguments are always passed as
//! discrete tokens, never concatenated into a shell string, so nothing here
//! is subject to shell quoting or injection.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, trace};

/// A failed external invocation.
///
/// Both variants keep the program and argument list; a non-zero exit
/// additionally keeps everything the tool printed, so callers can surface
/// tool-specific diagnostics (e.g. "disk already attached") without
/// re-running the command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The process could not be started at all.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited with a non-zero status.
    #[error("`{program} {}` failed ({status}): {}", .args.join(" "), String::from_utf8_lossy(.output).trim())]
    Failed {
        program: String,
        args: Vec<String>,
        status: ExitStatus,
        /// Combined stdout + stderr captured from the tool.
        output: Vec<u8>,
    },
}

impl ExecError {
    /// Captured combined output, empty when the process never started.
    pub fn output(&self) -> &[u8] {
        match self {
            ExecError::Spawn { .. } => &[],
            ExecError::Failed { output, .. } => output,
        }
    }
}

/// Runs one external command to completion and captures combined output.
///
/// No retry happens at this layer; retry policy belongs to the caller.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with the given argument tokens. Exit code zero yields
    /// the combined output bytes; anything else yields [`ExecError`].
    async fn run(&self, program: &Path, args: &[&str]) -> Result<Vec<u8>, ExecError>;
}

/// Production runner over [`tokio::process::Command`].
pub struct HostRunner;

#[async_trait]
impl CommandRunner for HostRunner {
    async fn run(&self, program: &Path, args: &[&str]) -> Result<Vec<u8>, ExecError> {
        let rendered = program.display().to_string();
        debug!(program = %rendered, ?args, "running management tool");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: rendered.clone(),
                args: owned(args),
                source,
            })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            trace!(program = %rendered, bytes = combined.len(), "tool exited cleanly");
            Ok(combined)
        } else {
            debug!(program = %rendered, status = %output.status, "tool exited with failure");
            Err(ExecError::Failed {
                program: rendered,
                args: owned(args),
                status: output.status,
                output: combined,
            })
        }
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
