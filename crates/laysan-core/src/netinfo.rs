//! Host network interface snapshot.
//!
//! A pure query with no side effects; results are never cached, callers
//! re-query whenever they need current topology.

use std::io;
use std::net::IpAddr;
use thiserror::Error;

/// Errors from host topology queries.
#[derive(Debug, Error)]
pub enum NetifError {
    /// The underlying enumeration call failed; no partial results.
    #[error("interface enumeration failed: {0}")]
    Enumeration(#[from] io::Error),
}

/// One host interface with its primary bound address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub address: IpAddr,
}

/// Enumerate host interfaces, one entry per interface that has at least one
/// bound address (the first one reported wins). Addressless interfaces are
/// omitted, never represented with an empty address.
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>, NetifError> {
    let addrs = if_addrs::get_if_addrs()?;
    let mut out: Vec<InterfaceInfo> = Vec::new();
    for iface in addrs {
        if out.iter().any(|seen| seen.name == iface.name) {
            continue;
        }
        out.push(InterfaceInfo {
            address: iface.ip(),
            name: iface.name,
        });
    }
    tracing::trace!(count = out.len(), "host interfaces enumerated");
    Ok(out)
}

/// Trim a routing-prefix suffix from a textual address
/// (`"192.168.56.1/24"` → `"192.168.56.1"`). Addresses without a prefix
/// pass through unchanged.
pub fn strip_prefix_len(address: &str) -> &str {
    address.split_once('/').map_or(address, |(addr, _)| addr)
}
