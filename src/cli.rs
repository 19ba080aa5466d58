//! Command-line surface of the `simenv` binary
//!
//! Flags override the TOML config; `run` drives the bundled temperature
//! scenario until the token is cancelled.

use crate::scenarios::temperature;
use anyhow::bail;
use clap::Parser;
use simenv_core::{FailurePolicy, SimenvConfig};
use simenv_memory::MemoryStore;
use simenv_runtime::{CancellationToken, PollingExecutor, TriggerRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// How long workers get to wind down after an interrupt before the process exits anyway.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "simenv", about = "Polling environment for agent simulations")]
pub struct Cli {
    /// Path to config file (TOML). Missing file = defaults.
    #[arg(long, default_value = "simenv.toml")]
    pub config: PathBuf,

    /// Memory service host
    #[arg(long)]
    pub host: Option<String>,

    /// Memory service port
    #[arg(long)]
    pub port: Option<u16>,

    /// Request timeout in milliseconds (0 = none)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Room to drive (repeatable). Replaces the configured room list.
    #[arg(long = "room")]
    pub rooms: Vec<String>,

    /// Polling interval of each trigger, in seconds
    #[arg(long)]
    pub interval_secs: Option<f64>,

    /// What a worker does after a failed poll: stop or skip
    #[arg(long)]
    pub on_failure: Option<FailurePolicy>,

    /// Attempts per poll before the failure policy applies
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut SimenvConfig) {
        if let Some(host) = &self.host {
            config.memory.host = host.clone();
        }
        if let Some(port) = self.port {
            config.memory.port = port;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.memory.timeout_ms = timeout_ms;
        }
        if !self.rooms.is_empty() {
            config.scenario.rooms = self.rooms.clone();
        }
        if let Some(secs) = self.interval_secs {
            config.scenario.interval_secs = secs;
        }
        if let Some(policy) = self.on_failure {
            config.executor.on_failure = policy;
        }
        if let Some(attempts) = self.max_attempts {
            config.executor.retry.max_attempts = attempts;
        }
    }

    /// Config file (or defaults) with the flags applied.
    pub fn effective_config(&self) -> SimenvConfig {
        let mut config = SimenvConfig::load(&self.config);
        self.apply(&mut config);
        config
    }
}

/// Drive one convector trigger per configured room until `cancel` fires.
///
/// Returns `Ok` when there is nothing to run or the run was interrupted, and
/// an error when every worker stopped on its own.
pub async fn run(
    config: &SimenvConfig,
    memory: Arc<dyn MemoryStore>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut registry = TriggerRegistry::new();
    temperature::register_rooms(&mut registry, &config.scenario.rooms, config.scenario.interval());
    if registry.is_empty() {
        warn!("No rooms configured, nothing to do");
        return Ok(());
    }

    let executor = PollingExecutor::new(registry, memory).with_config(config.executor.clone());
    let report = executor.run(cancel.clone()).await;

    for worker in report.failed() {
        warn!(
            "Trigger {}.{} stopped after {} polls: {:?}",
            worker.agent, worker.variable, worker.polls, worker.outcome
        );
    }

    if !cancel.is_cancelled() {
        bail!("every trigger stopped on its own");
    }
    Ok(())
}

/// Wait for Ctrl-C, print a blank line and cancel. A second Ctrl-C, or
/// workers still running after `SHUTDOWN_GRACE`, exits the process with 0.
pub async fn handle_interrupts(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    println!();
    cancel.cancel();

    tokio::select! {
        Ok(()) = tokio::signal::ctrl_c() => warn!("Second interrupt, exiting now"),
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
            warn!("Workers still busy after {:?}, exiting", SHUTDOWN_GRACE)
        }
    }
    std::process::exit(0);
}
