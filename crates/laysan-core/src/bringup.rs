//! Bring-up orchestration.
//!
//! The orchestrator is the only component that sequences stages and the only
//! retry authority, and the only thing it retries is the reachability poll,
//! bounded by the configured budget. Every other stage fails fast and is
//! recorded on the instance as a [`FailureKind`].

use crate::config::BringupConfig;
use crate::error::{CoreError, Result};
use crate::instance::{generate_name, Instance, VmPhase};
use crate::netinfo;
use crate::probe::{Pinger, ProbeResult};
use crate::provision::{ProvisionError, Secret, SecretRotator};
use laysan_vm::Hypervisor;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Sequences import → network attach → reachability polling → credential
/// rotation for one machine at a time.
pub struct Orchestrator {
    hypervisor: Arc<dyn Hypervisor>,
    pinger: Arc<dyn Pinger>,
    rotator: Arc<dyn SecretRotator>,
    config: BringupConfig,
}

impl Orchestrator {
    /// Build an orchestrator from its collaborators and a validated config.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] when the configuration is rejected.
    pub fn new(
        hypervisor: Arc<dyn Hypervisor>,
        pinger: Arc<dyn Pinger>,
        rotator: Arc<dyn SecretRotator>,
        config: BringupConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hypervisor,
            pinger,
            rotator,
            config,
        })
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> &BringupConfig {
        &self.config
    }

    /// Run one full bring-up attempt.
    ///
    /// On success the returned instance is in [`VmPhase::Provisioned`]. On
    /// failure the stage and cause are in the returned error; the machine is
    /// left registered for diagnostics (see [`teardown`]).
    pub async fn bring_up(
        &self,
        secret: &Secret,
        cancel: &CancellationToken,
    ) -> Result<Instance> {
        let name = self
            .config
            .instance_name
            .clone()
            .unwrap_or_else(generate_name);
        let mut instance = Instance::new(name);
        let started = Instant::now();
        info!(
            instance = %instance.name(),
            image = %self.config.appliance_path.display(),
            "starting bring-up"
        );

        match self.drive(&mut instance, secret, cancel).await {
            Ok(()) => {
                info!(
                    instance = %instance.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "bring-up complete"
                );
                Ok(instance)
            }
            Err(err) => {
                if let Some(kind) = err.failure_kind() {
                    if let Err(inner) = instance.advance(VmPhase::Failed(kind)) {
                        warn!(error = %inner, "could not record failure phase");
                    }
                }
                error!(
                    instance = %instance.name(),
                    phase = %instance.phase(),
                    error = %err,
                    "bring-up failed"
                );
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        instance: &mut Instance,
        secret: &Secret,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let name = instance.name().to_string();
        let cfg = &self.config;

        // Stage 1: import, idempotent on an already-registered name.
        if self
            .hypervisor
            .machine_exists(&name)
            .await
            .map_err(CoreError::Import)?
        {
            info!(instance = %name, "machine already registered, import skipped");
        } else {
            self.hypervisor
                .import_appliance(&name, &cfg.appliance_path, &cfg.disk_dir)
                .await
                .map_err(CoreError::Import)?;
        }
        instance.advance(VmPhase::Imported)?;

        // Stage 2: wire the host-only network and start the machine.
        let interfaces = netinfo::list_interfaces()?;
        let hostonly = if interfaces
            .iter()
            .any(|iface| iface.name == cfg.hostonly_interface)
        {
            cfg.hostonly_interface.clone()
        } else {
            info!(
                interface = %cfg.hostonly_interface,
                "host-only interface missing, creating one"
            );
            self.hypervisor
                .create_hostonly_interface()
                .await
                .map_err(CoreError::NetworkAttach)?
        };
        self.hypervisor
            .attach_hostonly(&name, &hostonly)
            .await
            .map_err(CoreError::NetworkAttach)?;
        self.hypervisor
            .start(&name)
            .await
            .map_err(CoreError::NetworkAttach)?;
        instance.advance(VmPhase::NetworkAttached)?;

        // Stage 3: poll until the guest answers an echo request.
        instance.advance(VmPhase::Probing)?;
        self.wait_reachable(&name, cancel).await?;
        instance.advance(VmPhase::Reachable)?;

        // Stage 4: rotate the default credential, exactly once.
        match self.rotator.replace_secret(&cfg.agent_url(), secret).await {
            Ok(()) => {}
            Err(ProvisionError::Rejected { status }) => {
                return Err(CoreError::ProvisioningRejected { status });
            }
            Err(err) => return Err(CoreError::ProvisioningUnreachable(err)),
        }
        instance.advance(VmPhase::Provisioned)?;
        Ok(())
    }

    async fn wait_reachable(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        let cfg = &self.config;
        let deadline = Instant::now() + cfg.poll_budget;
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            attempts += 1;

            let result = tokio::select! {
                result = self.pinger.check(cfg.guest_address) => result,
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            };

            match result {
                ProbeResult::Reachable => {
                    info!(instance = %name, attempts, "guest is reachable");
                    return Ok(());
                }
                ProbeResult::Unreachable => {
                    debug!(instance = %name, attempt = attempts, "no echo reply yet");
                }
                ProbeResult::Error(err) => {
                    // Transient: the budget, not a probe error, ends the wait.
                    warn!(
                        instance = %name,
                        attempt = attempts,
                        error = %err,
                        "probe failed, continuing to poll"
                    );
                }
            }

            if Instant::now() >= deadline {
                return Err(CoreError::ReachabilityTimeout {
                    budget: cfg.poll_budget,
                });
            }

            tokio::select! {
                _ = tokio::time::sleep(cfg.poll_interval) => {}
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            }
        }
    }
}

/// Power off (best effort) and deregister a machine.
///
/// Used to discard a finished or failed bring-up attempt; a fresh attempt
/// then starts under a new unique name.
pub async fn teardown(hypervisor: &dyn Hypervisor, name: &str) -> Result<()> {
    if let Err(err) = hypervisor.poweroff(name).await {
        warn!(instance = %name, error = %err, "poweroff failed, unregistering anyway");
    }
    hypervisor.unregister(name).await?;
    info!(instance = %name, "machine deregistered");
    Ok(())
}
