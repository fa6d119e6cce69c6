//! laysan command-line entry point.
//!
//! Thin shell over laysan-core: parses flags, initializes tracing, wires a
//! ctrl-c handler into the cancellation token, and reports the outcome.

use anyhow::Result;
use clap::{Parser, Subcommand};
use laysan_core::{teardown, BringupConfig, IcmpPinger, Orchestrator, ProvisioningClient, Secret};
use laysan_vm::{DriverConfig, VboxDriver};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Bring appliance images up to provisioned, reachable VMs.
#[derive(Parser, Debug)]
#[command(name = "laysan", version, about)]
struct Cli {
    /// Explicit path to the VBoxManage binary.
    #[arg(long, global = true)]
    vboxmanage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import an appliance, attach it to a host-only network, wait for the
    /// guest and rotate its default credential.
    Up {
        /// Appliance image to import (.ova).
        #[arg(long)]
        image: PathBuf,

        /// Replacement credential for the guest agent.
        #[arg(long)]
        password: String,

        /// Guest address on the host-only network. A routing-prefix suffix
        /// ("/24") is accepted and ignored.
        #[arg(long, default_value = "192.168.56.10", value_parser = parse_guest_address)]
        guest_address: Ipv4Addr,

        /// Host-only interface to attach (created when absent).
        #[arg(long, default_value = "vboxnet0")]
        hostonly_interface: String,

        /// Guest-agent HTTP port.
        #[arg(long, default_value_t = 4200)]
        agent_port: u16,

        /// Overall reachability budget in seconds.
        #[arg(long, default_value_t = 120)]
        timeout: u64,

        /// Reuse a fixed machine name instead of generating one.
        #[arg(long)]
        name: Option<String>,

        /// Directory for imported disk artifacts.
        #[arg(long, default_value = "/tmp/laysan")]
        disk_dir: PathBuf,
    },

    /// Power off and deregister a previously imported machine.
    Down {
        /// Machine name to discard.
        #[arg(long)]
        name: String,
    },
}

fn parse_guest_address(raw: &str) -> Result<Ipv4Addr, String> {
    laysan_core::strip_prefix_len(raw)
        .parse()
        .map_err(|err| format!("invalid guest address {raw:?}: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let hypervisor = Arc::new(VboxDriver::new(DriverConfig {
        tool_path: cli.vboxmanage,
    })?);

    match cli.command {
        Command::Up {
            image,
            password,
            guest_address,
            hostonly_interface,
            agent_port,
            timeout,
            name,
            disk_dir,
        } => {
            let mut builder = BringupConfig::builder()
                .appliance(image)
                .disk_dir(disk_dir)
                .guest_address(guest_address)
                .hostonly_interface(hostonly_interface)
                .agent_port(agent_port)
                .poll_budget(Duration::from_secs(timeout));
            if let Some(name) = name {
                builder = builder.instance_name(name);
            }
            let config = builder.build()?;

            let orchestrator = Orchestrator::new(
                hypervisor,
                Arc::new(IcmpPinger::new()),
                Arc::new(ProvisioningClient::new()),
                config,
            )?;

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling bring-up");
                    trigger.cancel();
                }
            });

            let instance = orchestrator.bring_up(&Secret::new(password), &cancel).await?;
            println!("{} is provisioned and reachable", instance.name());
        }

        Command::Down { name } => {
            teardown(hypervisor.as_ref(), &name).await?;
            println!("{name} deregistered");
        }
    }

    Ok(())
}
