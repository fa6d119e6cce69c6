//! Management-tool discovery.
//!
//! One capability — finding the `VBoxManage` executable — with one
//! resolution strategy per host family. The orchestration layers never read
//! the environment themselves; they receive a [`ToolLocator`] (or an
//! explicit path) through [`crate::DriverConfig`].

use crate::error::VmError;
use std::env;
use std::path::PathBuf;

/// Management tool binary name on Unix-likes.
const TOOL_UNIX: &str = "VBoxManage";

/// Management tool binary name on Windows.
const TOOL_WINDOWS: &str = "VBoxManage.exe";

/// Conventional Unix install directories, scanned after `PATH`.
const UNIX_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/usr/lib/virtualbox",
];

/// Resolves the absolute path of the management tool on this host.
pub trait ToolLocator: Send + Sync {
    fn locate(&self) -> Result<PathBuf, VmError>;
}

/// Pick the locator matching the current host OS.
pub fn default_locator() -> Box<dyn ToolLocator> {
    match env::consts::OS {
        "windows" => Box::new(WindowsLocator),
        _ => Box::new(UnixLocator),
    }
}

/// Scans `PATH`, then conventional install directories.
pub struct UnixLocator;

impl ToolLocator for UnixLocator {
    fn locate(&self) -> Result<PathBuf, VmError> {
        let path_dirs = env::var("PATH").unwrap_or_default();
        let candidates = env::split_paths(&path_dirs)
            .chain(UNIX_DIRS.iter().map(PathBuf::from));

        scan(candidates, TOOL_UNIX).ok_or_else(|| {
            VmError::ToolNotFound(format!(
                "{TOOL_UNIX} not on PATH or in {}",
                UNIX_DIRS.join(", ")
            ))
        })
    }
}

/// Honours the vendor install-path variables, then Program Files.
pub struct WindowsLocator;

impl ToolLocator for WindowsLocator {
    fn locate(&self) -> Result<PathBuf, VmError> {
        let candidates = ["VBOX_MSI_INSTALL_PATH", "VBOX_INSTALL_PATH"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(PathBuf::from)
            .chain(std::iter::once(PathBuf::from(
                r"C:\Program Files\Oracle\VirtualBox",
            )));

        scan(candidates, TOOL_WINDOWS).ok_or_else(|| {
            VmError::ToolNotFound(format!(
                "{TOOL_WINDOWS} not found via VBOX_MSI_INSTALL_PATH, \
                 VBOX_INSTALL_PATH or Program Files"
            ))
        })
    }
}

fn scan(dirs: impl Iterator<Item = PathBuf>, tool: &str) -> Option<PathBuf> {
    dirs.map(|dir| dir.join(tool)).find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_tool_in_listed_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = dir.path().join(TOOL_UNIX);
        std::fs::write(&tool, b"#!/bin/sh\n").expect("write stub tool");

        let found = scan(
            [PathBuf::from("/nonexistent"), dir.path().to_path_buf()].into_iter(),
            TOOL_UNIX,
        );
        assert_eq!(found, Some(tool));
    }

    #[test]
    fn scan_misses_when_absent() {
        assert_eq!(
            scan([PathBuf::from("/nonexistent")].into_iter(), TOOL_UNIX),
            None
        );
    }
}
