//! Guest-agent provisioning client.
//!
//! One state-changing request against the guest agent: replace the image's
//! default credential. The client issues the request exactly once per call
//! and never retries; recovery strategy belongs to the caller, which is why
//! "could not reach the agent" and "agent refused" are distinct errors.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Guest-agent endpoint that accepts the replacement credential.
pub const REPLACE_SECRETS_PATH: &str = "/replace-secrets";

/// A credential held in memory only. `Debug` and `Display` never reveal it,
/// and nothing in this crate logs it.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Callers must not log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Errors from the provisioning handshake.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The request could not be transmitted or produced no response.
    #[error("guest agent unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The agent answered with something other than HTTP 200. The client
    /// never infers partial success.
    #[error("secret replacement rejected: HTTP {status}")]
    Rejected { status: u16 },
}

/// Performs the one-shot secret replacement against a guest agent.
#[async_trait]
pub trait SecretRotator: Send + Sync {
    async fn replace_secret(&self, base_url: &str, secret: &Secret) -> Result<(), ProvisionError>;
}

#[derive(Serialize)]
struct ReplaceSecretBody<'a> {
    password: &'a str,
}

/// HTTP client for the guest agent's provisioning API.
pub struct ProvisioningClient {
    http: reqwest::Client,
}

impl ProvisioningClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for ProvisioningClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretRotator for ProvisioningClient {
    async fn replace_secret(&self, base_url: &str, secret: &Secret) -> Result<(), ProvisionError> {
        let url = endpoint(base_url);
        debug!(url = %url, "replacing guest credential");

        let response = self
            .http
            .put(&url)
            .json(&ReplaceSecretBody {
                password: secret.expose(),
            })
            .send()
            .await
            .map_err(ProvisionError::Unreachable)?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            info!(url = %url, "guest credential replaced");
            Ok(())
        } else {
            debug!(url = %url, status = status.as_u16(), "guest agent refused secret replacement");
            Err(ProvisionError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

fn endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), REPLACE_SECRETS_PATH)
}
